//! Custom per-segment manifest tags.
//!
//! The media server annotates every segment with its own risk tier, event
//! type and privacy flag, and with the risk tier of the segment that follows:
//!
//! ```text
//! #EXT-X-SEMANTICTYPE:1
//! #EXT-X-SEMANTICLEVEL:2
//! #EXT-X-PRIVACY:0
//! #EXT-X-NEXT-SEMANTICLEVEL:0
//! #EXTINF:2.000000,
//! 1080p_0007.ts
//! ```
//!
//! Only `#EXT-X-NEXT-SEMANTICLEVEL` drives level selection; the other three
//! are carried through for display.

use std::fmt;

use crate::{AbrError, AbrResult, RiskTier};

/// One of the custom numeric segment tags.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TagKind {
    SemanticLevel,
    SemanticType,
    Privacy,
    NextSemanticLevel,
}

impl TagKind {
    pub const ALL: [Self; 4] = [
        Self::SemanticLevel,
        Self::SemanticType,
        Self::Privacy,
        Self::NextSemanticLevel,
    ];

    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::SemanticLevel => "#EXT-X-SEMANTICLEVEL:",
            Self::SemanticType => "#EXT-X-SEMANTICTYPE:",
            Self::Privacy => "#EXT-X-PRIVACY:",
            Self::NextSemanticLevel => "#EXT-X-NEXT-SEMANTICLEVEL:",
        }
    }

    /// Parse a playlist line strictly.
    ///
    /// Returns `Ok(None)` for lines that are not one of these tags.
    ///
    /// # Errors
    ///
    /// [`AbrError::MalformedTag`] when the tag is recognized but its value is
    /// not a number.
    pub fn parse_line(line: &str) -> AbrResult<Option<(Self, f64)>> {
        let line = line.trim();
        let Some((kind, raw)) = Self::ALL
            .into_iter()
            .find_map(|kind| line.strip_prefix(kind.prefix()).map(|raw| (kind, raw)))
        else {
            return Ok(None);
        };
        raw.trim()
            .parse::<f64>()
            .map(|value| Some((kind, value)))
            .map_err(|_| AbrError::MalformedTag(line.to_owned()))
    }
}

/// Custom tags attached to one segment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SegmentTags {
    pub semantic_level: Option<f64>,
    pub semantic_type: Option<f64>,
    pub privacy: Option<f64>,
    /// Risk tier of the segment that follows this one.
    pub next_semantic_level: Option<f64>,
}

impl SegmentTags {
    /// Fold one playlist line into the tags, ignoring malformed values.
    ///
    /// Returns whether the line was one of the custom tags.
    pub fn apply_line(&mut self, line: &str) -> bool {
        match TagKind::parse_line(line) {
            Ok(Some((kind, value))) => {
                self.set(kind, value);
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::debug!(%err, "ignoring malformed segment tag");
                true
            }
        }
    }

    pub fn set(&mut self, kind: TagKind, value: f64) {
        let slot = match kind {
            TagKind::SemanticLevel => &mut self.semantic_level,
            TagKind::SemanticType => &mut self.semantic_type,
            TagKind::Privacy => &mut self.privacy,
            TagKind::NextSemanticLevel => &mut self.next_semantic_level,
        };
        *slot = Some(value);
    }

    /// Look-ahead hint for level selection.
    #[must_use]
    pub fn hint(&self) -> Option<RiskTier> {
        self.next_semantic_level.and_then(RiskTier::from_tag_value)
    }

    #[must_use]
    pub fn risk_label(&self) -> RiskLabel {
        RiskLabel::from_tag(self.semantic_level)
    }

    #[must_use]
    pub fn event_label(&self) -> EventLabel {
        EventLabel::from_tag(self.semantic_type)
    }

    #[must_use]
    pub fn privacy_label(&self) -> PrivacyLabel {
        PrivacyLabel::from_tag(self.privacy)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "only whole numbers reach the cast"
)]
fn whole(value: Option<f64>) -> Option<i64> {
    value
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}

/// Display label of a segment risk tier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RiskLabel {
    Calm,
    Danger,
    Accident,
    Unknown,
}

impl RiskLabel {
    #[must_use]
    pub fn from_tag(value: Option<f64>) -> Self {
        match whole(value) {
            Some(0) => Self::Calm,
            Some(1) => Self::Danger,
            Some(2) => Self::Accident,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Calm => "calm",
            Self::Danger => "danger",
            Self::Accident => "accident",
            Self::Unknown => "unknown",
        })
    }
}

/// Display label of a segment event type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventLabel {
    Normal,
    Assault,
    Fainting,
    Unknown,
}

impl EventLabel {
    #[must_use]
    pub fn from_tag(value: Option<f64>) -> Self {
        match whole(value) {
            Some(0) => Self::Normal,
            Some(1) => Self::Assault,
            Some(2) => Self::Fainting,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Assault => "assault",
            Self::Fainting => "fainting",
            Self::Unknown => "unknown",
        })
    }
}

/// Display label of a segment privacy flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PrivacyLabel {
    Unprotected,
    Protected,
    Unknown,
}

impl PrivacyLabel {
    #[must_use]
    pub fn from_tag(value: Option<f64>) -> Self {
        match whole(value) {
            Some(0) => Self::Unprotected,
            Some(1) => Self::Protected,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PrivacyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unprotected => "unprotected",
            Self::Protected => "protected",
            Self::Unknown => "unknown",
        })
    }
}
