use thiserror::Error;

/// Configuration and tag parsing errors.
///
/// Level selection itself never fails; these only surface at the edges where
/// options are validated or manifest tags are read strictly.
#[derive(Debug, Error, PartialEq)]
pub enum AbrError {
    #[error("Half-life must be a positive number of seconds, got {0}")]
    InvalidHalfLife(f64),

    #[error("Default bandwidth estimate must be positive, got {0} bps")]
    InvalidDefaultEstimate(f64),

    #[error("Default TTFB must be non-negative, got {0} ms")]
    InvalidDefaultTtfb(f64),

    #[error("Privacy marker must not be empty")]
    EmptyPrivacyMarker,

    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("Malformed tag line: {0}")]
    MalformedTag(String),
}

pub type AbrResult<T> = Result<T, AbrError>;
