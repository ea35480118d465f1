//! All integration tests for dass
#![expect(
    clippy::cast_precision_loss,
    clippy::unwrap_used,
    reason = "integration test crate, unwraps and casts of generated inputs are acceptable"
)]

mod abr;
mod replay;
