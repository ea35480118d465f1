//! Media playlists annotated with the custom segment tags.
//!
//! `hls_m3u8` parses and validates the playlist itself. It skips tags it
//! does not know, so the custom tags are collected in a separate line scan
//! and matched to segments by position.

use dass_abr::SegmentTags;
use hls_m3u8::MediaPlaylist as HlsMediaPlaylist;

use crate::{ReplayError, ReplayResult};

#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub uri: String,
    pub duration_secs: f64,
    pub tags: SegmentTags,
}

/// Custom tags per segment URI line, in playlist order.
///
/// Tags preceding a URI line belong to that segment. Malformed values are
/// treated as absent.
fn scan_tags(text: &str) -> Vec<SegmentTags> {
    let mut all = Vec::new();
    let mut tags = SegmentTags::default();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            tags.apply_line(line);
        } else {
            all.push(std::mem::take(&mut tags));
        }
    }
    all
}

/// Parse the segments of a media playlist.
///
/// # Errors
///
/// [`ReplayError::EmptyPlaylist`] without segment URIs,
/// [`ReplayError::Playlist`] when `hls_m3u8` rejects the playlist.
pub fn parse(text: &str) -> ReplayResult<Vec<Segment>> {
    let tags = scan_tags(text);
    if tags.is_empty() {
        return Err(ReplayError::EmptyPlaylist);
    }

    let playlist =
        HlsMediaPlaylist::try_from(text).map_err(|e| ReplayError::Playlist(e.to_string()))?;
    let segment_count = playlist.segments.values().count();
    if segment_count != tags.len() {
        return Err(ReplayError::SegmentMismatch {
            segments: segment_count,
            tagged: tags.len(),
        });
    }

    Ok(playlist
        .segments
        .values()
        .zip(tags)
        .map(|(seg, tags)| Segment {
            uri: seg.uri().to_string(),
            duration_secs: seg.duration.duration().as_secs_f64(),
            tags,
        })
        .collect())
}
