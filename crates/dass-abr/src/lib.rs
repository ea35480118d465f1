//! Semantic- and privacy-aware adaptive bitrate (ABR) selection.
//!
//! This crate decides which quality level to request for every segment of a
//! segmented stream. It combines a smoothed throughput estimate with a
//! forward-looking risk tier announced by the manifest for the *next*
//! segment, and can prefer privacy-redacted variants when that segment is
//! considered low-risk.
//!
//! ## Features
//!
//! - **Dual EWMA estimation**: fast and slow averages, the estimate is the lower of the two
//! - **Four policies**: [`Policy::Baseline`], [`Policy::RiskCeiling`],
//!   [`Policy::PrivacyPreferring`] and [`Policy::PrivacyRiskCeiling`], all driven by one
//!   controller and a declarative [`Strategy`]
//! - **Look-ahead hints**: `#EXT-X-NEXT-SEMANTICLEVEL` tags cap quality or pick the privacy group
//! - **Event driven**: attach a controller to an [`EventBus`] and poll it between fetches
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dass_abr::{AbrController, AbrOptions, Fragment, Level, LoadStats, Policy, SegmentTags};
//!
//! let opts = AbrOptions::default()
//!     .with_policy(Policy::PrivacyPreferring)
//!     .with_default_estimate_bps(1_000_000.0);
//! let mut controller = AbrController::new(opts);
//!
//! controller.on_manifest_parsed(Arc::from(vec![
//!     Level::new(500_000).with_name("360p"),
//!     Level::new(1_500_000).with_name("720p"),
//!     Level::new(500_001).with_name("360p_privacy"),
//!     Level::new(1_500_001).with_name("720p_privacy"),
//! ]));
//!
//! // The segment just downloaded announces a calm (tier 0) successor.
//! let frag = Fragment::main(0).with_tags(SegmentTags {
//!     next_semantic_level: Some(0.0),
//!     ..SegmentTags::default()
//! });
//! let stats = LoadStats::completed(0.0, 0.0, 1_000.0, 400_000);
//! controller.on_frag_buffered(&frag, &stats);
//!
//! // 3.2 Mbps measured: the best privacy-redacted level fits.
//! assert_eq!(controller.next_auto_level(), Some(3));
//! ```

#![forbid(unsafe_code)]

mod bus;
mod controller;
mod error;
mod estimator;
mod policy;
mod tags;
mod types;

pub use bus::{EventBus, PlaybackEvent, Subscription};
pub use controller::{AbrController, DecisionReason, LevelDecision};
pub use error::{AbrError, AbrResult};
pub use estimator::{Estimator, EwmaBandwidthEstimator};
pub use policy::{CandidateFilter, Ceiling, FirstLevelRule, Policy, Strategy};
pub use tags::{EventLabel, PrivacyLabel, RiskLabel, SegmentTags, TagKind};
pub use types::{
    AbrOptions, FirstLevel, Fragment, Level, LevelTable, LoadStats, RiskTier, StartLevel,
    TrackKind,
};
