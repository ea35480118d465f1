use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{AbrError, AbrResult, Policy, SegmentTags};

/// One encoded quality variant of the stream.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Level {
    /// Nominal encoded bitrate in bits per second.
    pub bitrate: u64,
    /// Peak bitrate in bits per second, preferred over `bitrate` when present.
    pub max_bitrate: Option<u64>,
    /// Variant name. Privacy-redacted variants carry the privacy marker in it.
    pub name: Option<String>,
}

impl Level {
    #[must_use]
    pub fn new(bitrate: u64) -> Self {
        Self {
            bitrate,
            max_bitrate: None,
            name: None,
        }
    }

    #[must_use]
    pub fn with_max_bitrate(mut self, max_bitrate: u64) -> Self {
        self.max_bitrate = Some(max_bitrate);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bitrate compared against the throughput estimate.
    ///
    /// A zero peak bitrate counts as missing.
    #[must_use]
    pub fn effective_bitrate(&self) -> u64 {
        self.max_bitrate
            .filter(|&peak| peak > 0)
            .unwrap_or(self.bitrate)
    }

    #[must_use]
    pub fn is_privacy(&self, marker: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.contains(marker))
    }
}

/// Ordered level table (low to high quality) shared with the host session.
pub type LevelTable = Arc<[Level]>;

/// Integer risk classification of an upcoming segment.
///
/// Tiers below [`RiskTier::PRIVACY_BELOW`] are low-risk and select the
/// privacy-redacted group in privacy-aware policies.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RiskTier(pub u32);

impl RiskTier {
    pub const PRIVACY_BELOW: u32 = 2;

    /// Normalize a raw numeric tag value.
    ///
    /// Non-finite and negative values carry no information; fractional values
    /// are truncated towards zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is finite and non-negative, `as` saturates at u32::MAX"
    )]
    pub fn from_tag_value(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(Self(value.trunc() as u32))
    }

    #[must_use]
    pub fn wants_privacy(self) -> bool {
        self.0 < Self::PRIVACY_BELOW
    }

    /// Tier used as a position into the level table or a candidate group.
    #[must_use]
    pub fn as_index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

/// Playlist the fragment belongs to.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TrackKind {
    /// Primary media track. The only one that feeds ABR.
    #[default]
    Main,
    Audio,
    Subtitle,
}

/// A completed segment as reported by the host downloader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    pub kind: TrackKind,
    /// Media sequence number.
    pub sn: u64,
    /// Level the fragment was fetched from.
    pub level: usize,
    /// Custom manifest tags attached to this segment.
    pub tags: SegmentTags,
}

impl Fragment {
    #[must_use]
    pub fn main(sn: u64) -> Self {
        Self {
            kind: TrackKind::Main,
            sn,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: TrackKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: SegmentTags) -> Self {
        self.tags = tags;
        self
    }
}

/// Timing and size of one fragment fetch.
///
/// Timestamps are milliseconds on the host's monotonic clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoadStats {
    /// The fetch was cancelled before completion.
    pub aborted: bool,
    /// Payload size in bytes.
    pub loaded: u64,
    pub loading_start_ms: f64,
    pub loading_first_ms: f64,
    pub parsing_end_ms: f64,
}

impl LoadStats {
    #[must_use]
    pub fn completed(start_ms: f64, first_byte_ms: f64, parsed_ms: f64, loaded: u64) -> Self {
        Self {
            aborted: false,
            loaded,
            loading_start_ms: start_ms,
            loading_first_ms: first_byte_ms,
            parsing_end_ms: parsed_ms,
        }
    }

    #[must_use]
    pub fn aborted(mut self) -> Self {
        self.aborted = true;
        self
    }

    /// Time to first byte, never negative.
    #[must_use]
    pub fn ttfb_ms(&self) -> f64 {
        (self.loading_first_ms - self.loading_start_ms).max(0.0)
    }

    /// Time from request start until the fragment was parsed.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.parsing_end_ms - self.loading_start_ms
    }
}

/// Level to use for the very first segment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FirstLevel {
    Index(usize),
    /// Use the start level configured on the host session.
    HostConfigured,
}

/// Value indicating no start level has been configured.
const UNSET: usize = usize::MAX;

/// Start level slot owned by the host session.
///
/// Privacy-aware policies write the first privacy-redacted level here when
/// the manifest is parsed. Clones share the same slot.
#[derive(Clone, Debug)]
pub struct StartLevel(Arc<AtomicUsize>);

impl Default for StartLevel {
    fn default() -> Self {
        Self(Arc::new(AtomicUsize::new(UNSET)))
    }
}

impl StartLevel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<usize> {
        match self.0.load(Ordering::Acquire) {
            UNSET => None,
            index => Some(index),
        }
    }

    pub fn set(&self, index: usize) {
        self.0.store(index, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(UNSET, Ordering::Release);
    }

    /// Number of live handles to this slot.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

/// Session configuration for the ABR controller.
#[derive(Clone)]
pub struct AbrOptions {
    /// Half-life of the fast throughput average, in seconds of download time.
    pub fast_half_life_secs: f64,
    /// Half-life of the slow throughput average, in seconds of download time.
    pub slow_half_life_secs: f64,
    /// Estimate used until the first sample arrives, in bits per second.
    pub default_estimate_bps: f64,
    /// TTFB estimate used until the first TTFB sample arrives, in milliseconds.
    pub default_ttfb_ms: f64,
    /// Level selection policy.
    pub policy: Policy,
    /// Substring that marks a level name as privacy-redacted.
    pub privacy_marker: String,
}

impl Default for AbrOptions {
    fn default() -> Self {
        Self {
            fast_half_life_secs: 3.0,
            slow_half_life_secs: 9.0,
            default_estimate_bps: 500_000.0,
            default_ttfb_ms: 100.0,
            policy: Policy::default(),
            privacy_marker: "_privacy".to_owned(),
        }
    }
}

impl std::fmt::Debug for AbrOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbrOptions")
            .field("fast_half_life_secs", &self.fast_half_life_secs)
            .field("slow_half_life_secs", &self.slow_half_life_secs)
            .field("default_estimate_bps", &self.default_estimate_bps)
            .field("default_ttfb_ms", &self.default_ttfb_ms)
            .field("policy", &self.policy)
            .field("privacy_marker", &self.privacy_marker)
            .finish()
    }
}

impl AbrOptions {
    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_half_lives(mut self, fast_secs: f64, slow_secs: f64) -> Self {
        self.fast_half_life_secs = fast_secs;
        self.slow_half_life_secs = slow_secs;
        self
    }

    #[must_use]
    pub fn with_default_estimate_bps(mut self, bps: f64) -> Self {
        self.default_estimate_bps = bps;
        self
    }

    #[must_use]
    pub fn with_default_ttfb_ms(mut self, ms: f64) -> Self {
        self.default_ttfb_ms = ms;
        self
    }

    #[must_use]
    pub fn with_privacy_marker(mut self, marker: impl Into<String>) -> Self {
        self.privacy_marker = marker.into();
        self
    }

    /// Check that the options describe a usable estimator.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> AbrResult<()> {
        for half_life in [self.fast_half_life_secs, self.slow_half_life_secs] {
            if !half_life.is_finite() || half_life <= 0.0 {
                return Err(AbrError::InvalidHalfLife(half_life));
            }
        }
        if !self.default_estimate_bps.is_finite() || self.default_estimate_bps <= 0.0 {
            return Err(AbrError::InvalidDefaultEstimate(self.default_estimate_bps));
        }
        if !self.default_ttfb_ms.is_finite() || self.default_ttfb_ms < 0.0 {
            return Err(AbrError::InvalidDefaultTtfb(self.default_ttfb_ms));
        }
        if self.privacy_marker.is_empty() {
            return Err(AbrError::EmptyPrivacyMarker);
        }
        Ok(())
    }
}
