use std::{fmt, str::FromStr};

use crate::{AbrError, FirstLevel, Level, RiskTier};

/// Level selection policy, chosen once per session.
///
/// Every policy is the same search over a candidate set; they differ only in
/// the [`Strategy`] they describe.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Policy {
    /// Whole table, the risk tier caps the level index.
    #[default]
    Baseline,
    /// Clear levels only, the risk tier caps the level index.
    RiskCeiling,
    /// Low-risk segments use the privacy group, others the clear group.
    PrivacyPreferring,
    /// Like `PrivacyPreferring`, plus the risk tier caps the position inside the group.
    PrivacyRiskCeiling,
}

impl Policy {
    pub const ALL: [Self; 4] = [
        Self::Baseline,
        Self::RiskCeiling,
        Self::PrivacyPreferring,
        Self::PrivacyRiskCeiling,
    ];

    #[must_use]
    pub const fn strategy(self) -> Strategy {
        match self {
            Self::Baseline => Strategy {
                candidates: CandidateFilter::All,
                ceiling: Ceiling::LevelIndex,
                first_level: FirstLevelRule::Lowest,
                seeds_start_level: false,
            },
            Self::RiskCeiling => Strategy {
                candidates: CandidateFilter::ClearOnly,
                ceiling: Ceiling::LevelIndex,
                first_level: FirstLevelRule::LowestClear,
                seeds_start_level: false,
            },
            Self::PrivacyPreferring => Strategy {
                candidates: CandidateFilter::PrivacyGroup,
                ceiling: Ceiling::None,
                first_level: FirstLevelRule::HostConfigured,
                seeds_start_level: true,
            },
            Self::PrivacyRiskCeiling => Strategy {
                candidates: CandidateFilter::PrivacyGroup,
                ceiling: Ceiling::GroupPosition,
                first_level: FirstLevelRule::HostConfigured,
                seeds_start_level: true,
            },
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::RiskCeiling => "risk-ceiling",
            Self::PrivacyPreferring => "privacy",
            Self::PrivacyRiskCeiling => "privacy-risk-ceiling",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = AbrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AbrError::UnknownPolicy(s.to_owned()))
    }
}

/// Which levels a policy is willing to choose from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CandidateFilter {
    All,
    /// Levels without the privacy marker.
    ClearOnly,
    /// Privacy levels for low-risk hints, clear levels otherwise.
    PrivacyGroup,
}

/// How the risk tier limits the search.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ceiling {
    None,
    /// Candidates whose table index exceeds the tier are excluded.
    LevelIndex,
    /// The search starts at position `min(tier, len - 1)` of the candidate list.
    GroupPosition,
}

/// What to report as the first level before any estimate exists.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FirstLevelRule {
    Lowest,
    LowestClear,
    HostConfigured,
}

/// Declarative description of a policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Strategy {
    pub candidates: CandidateFilter,
    pub ceiling: Ceiling,
    pub first_level: FirstLevelRule,
    /// Write the first privacy level to the host's start level on manifest parse.
    pub seeds_start_level: bool,
}

impl Strategy {
    /// Candidate table indices in ascending order.
    ///
    /// Falls back to the whole table when the filter leaves nothing.
    #[must_use]
    pub fn candidates(&self, levels: &[Level], hint: Option<RiskTier>, marker: &str) -> Vec<usize> {
        let want_privacy = match self.candidates {
            CandidateFilter::All => return (0..levels.len()).collect(),
            CandidateFilter::ClearOnly => false,
            CandidateFilter::PrivacyGroup => hint.is_some_and(RiskTier::wants_privacy),
        };

        let filtered: Vec<usize> = levels
            .iter()
            .enumerate()
            .filter(|(_, level)| level.is_privacy(marker) == want_privacy)
            .map(|(index, _)| index)
            .collect();

        if filtered.is_empty() {
            (0..levels.len()).collect()
        } else {
            filtered
        }
    }

    /// Candidates that the risk ceiling leaves eligible, ascending.
    #[must_use]
    pub fn eligible<'a>(&self, candidates: &'a [usize], hint: Option<RiskTier>) -> &'a [usize] {
        let Some(tier) = hint else {
            return candidates;
        };
        match self.ceiling {
            Ceiling::None => candidates,
            Ceiling::LevelIndex => {
                let end = candidates.partition_point(|&index| index <= tier.as_index());
                &candidates[..end]
            }
            Ceiling::GroupPosition => {
                let end = tier.as_index().saturating_add(1).min(candidates.len());
                &candidates[..end]
            }
        }
    }

    #[must_use]
    pub fn first_level(&self, levels: &[Level], marker: &str) -> FirstLevel {
        if levels.is_empty() {
            return FirstLevel::HostConfigured;
        }
        match self.first_level {
            FirstLevelRule::Lowest => FirstLevel::Index(0),
            FirstLevelRule::LowestClear => FirstLevel::Index(
                levels
                    .iter()
                    .position(|level| !level.is_privacy(marker))
                    .unwrap_or(0),
            ),
            FirstLevelRule::HostConfigured => FirstLevel::HostConfigured,
        }
    }

    /// Start level to write into the host session after manifest parse.
    #[must_use]
    pub fn start_level(&self, levels: &[Level], marker: &str) -> Option<usize> {
        if !self.seeds_start_level {
            return None;
        }
        levels.iter().position(|level| level.is_privacy(marker))
    }
}
