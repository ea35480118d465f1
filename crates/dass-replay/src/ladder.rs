use dass_abr::Level;

use crate::{ReplayError, ReplayResult};

/// Parse `NAME=BITRATE` or `NAME=BITRATE/PEAK` into a level.
///
/// # Errors
///
/// [`ReplayError::InvalidLevel`] on a missing name or non-numeric bitrate.
pub fn parse_level(spec: &str) -> ReplayResult<Level> {
    let invalid = || ReplayError::InvalidLevel(spec.to_owned());

    let (name, rates) = spec.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let (bitrate, peak) = match rates.split_once('/') {
        Some((bitrate, peak)) => (bitrate, Some(peak)),
        None => (rates, None),
    };
    let bitrate = bitrate.trim().parse::<u64>().map_err(|_| invalid())?;
    let level = Level::new(bitrate).with_name(name);

    match peak {
        Some(peak) => {
            let peak = peak.trim().parse::<u64>().map_err(|_| invalid())?;
            Ok(level.with_max_bitrate(peak))
        }
        None => Ok(level),
    }
}

/// Ladder used when none is given: three clear renditions and their
/// privacy-redacted twins.
#[must_use]
pub fn default_ladder(marker: &str) -> Vec<Level> {
    let clear = [("360p", 500_000), ("720p", 1_500_000), ("1080p", 3_000_000)];
    let privacy = clear
        .iter()
        .map(|&(name, bitrate)| Level::new(bitrate + 1).with_name(format!("{name}{marker}")));
    clear
        .iter()
        .map(|&(name, bitrate)| Level::new(bitrate).with_name(name))
        .chain(privacy)
        .collect()
}
