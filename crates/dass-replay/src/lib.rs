//! Offline replay of the ABR controller against recorded bandwidth traces.

#![forbid(unsafe_code)]

mod error;
pub mod ladder;
pub mod playlist;
mod sim;
mod trace;

pub use error::{ReplayError, ReplayResult};
pub use playlist::Segment;
pub use sim::{FetchRecord, ReplayConfig, ReplaySummary, Simulation};
pub use trace::BandwidthTrace;

/// Read a whole input file.
///
/// # Errors
///
/// [`ReplayError::Io`] naming the path.
pub fn read_input(path: &std::path::Path) -> ReplayResult<String> {
    std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_owned(),
        source,
    })
}
