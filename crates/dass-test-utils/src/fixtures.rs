//! Level tables and fragments shared by unit and integration tests.

use std::sync::Arc;

use dass_abr::{Fragment, Level, LevelTable, LoadStats, SegmentTags};
use rstest::fixture;

use crate::Xorshift64;

pub const PRIVACY_MARKER: &str = "_privacy";

/// Three clear levels: 500 kbps, 1.5 Mbps, 3 Mbps.
#[must_use]
pub fn clear_ladder() -> LevelTable {
    Arc::from(vec![
        Level::new(500_000).with_name("360p"),
        Level::new(1_500_000).with_name("720p"),
        Level::new(3_000_000).with_name("1080p"),
    ])
}

/// Clear ladder followed by its privacy-redacted twin.
///
/// Privacy twins advertise one extra bit per second, as the media server
/// does to keep the two groups distinct.
#[must_use]
pub fn mirrored_ladder() -> LevelTable {
    let clear = clear_ladder();
    let privacy = clear.iter().map(|level| Level {
        bitrate: level.bitrate + 1,
        max_bitrate: level.max_bitrate,
        name: level.name.as_ref().map(|n| format!("{n}{PRIVACY_MARKER}")),
    });
    clear.iter().cloned().chain(privacy).collect()
}

#[fixture]
pub fn clear_levels() -> LevelTable {
    clear_ladder()
}

#[fixture]
pub fn mirrored_levels() -> LevelTable {
    mirrored_ladder()
}

/// Random level table of `1..=max_len` levels, ascending bitrate, roughly
/// `privacy_share` of them privacy-marked.
pub fn random_levels(rng: &mut Xorshift64, max_len: usize, privacy_share: f64) -> LevelTable {
    let len = rng.range_usize(1, max_len + 1);
    let mut bitrate = 0;
    (0..len)
        .map(|i| {
            bitrate += rng.range_u64(100_000, 2_000_000);
            let name = if rng.chance(privacy_share) {
                format!("l{i}{PRIVACY_MARKER}")
            } else {
                format!("l{i}")
            };
            let level = Level::new(bitrate).with_name(name);
            if rng.chance(0.2) {
                level.with_max_bitrate(bitrate + rng.range_u64(0, 500_000))
            } else {
                level
            }
        })
        .collect()
}

/// Main-track fragment announcing `next` as the following segment's risk tier.
#[must_use]
pub fn frag_with_hint(sn: u64, next: Option<f64>) -> Fragment {
    Fragment::main(sn).with_tags(SegmentTags {
        next_semantic_level: next,
        ..SegmentTags::default()
    })
}

/// Completed fetch of `bytes` taking `duration_ms`, with no first-byte delay.
#[must_use]
pub fn stats(duration_ms: f64, bytes: u64) -> LoadStats {
    LoadStats::completed(0.0, 0.0, duration_ms, bytes)
}
