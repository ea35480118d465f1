use std::path::PathBuf;

use dass_abr::AbrError;
use thiserror::Error;

/// Input errors of the replay tool.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Trace line {line}: expected `<timestamp_ms> <bandwidth_kbps>`, got {content:?}")]
    TraceLine { line: usize, content: String },

    #[error("Trace line {line}: timestamp goes backwards")]
    TraceOrder { line: usize },

    #[error("Trace contains no samples")]
    EmptyTrace,

    #[error("Invalid level {0:?}: expected NAME=BITRATE")]
    InvalidLevel(String),

    #[error("Level ladder is empty")]
    EmptyLadder,

    #[error("Invalid media playlist: {0}")]
    Playlist(String),

    #[error("Playlist has {segments} segments but {tagged} segment URI lines")]
    SegmentMismatch { segments: usize, tagged: usize },

    #[error("Playlist contains no segments")]
    EmptyPlaylist,

    #[error("Invalid ABR options: {0}")]
    Options(#[from] AbrError),
}

pub type ReplayResult<T> = Result<T, ReplayError>;
