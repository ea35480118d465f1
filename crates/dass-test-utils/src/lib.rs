#![forbid(unsafe_code)]
#![expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "test utility crate — numeric casts are acceptable for generated inputs"
)]

//! Shared test utilities for the dass workspace.

pub mod fixtures;
pub mod rng;

pub use fixtures::*;
pub use rng::*;
