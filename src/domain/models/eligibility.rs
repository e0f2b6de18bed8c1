//! Eligibility verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How accuracy tiers interact with the one-level-at-a-time progression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyGating {
    /// Advancing to level `L` only needs some entry at level `L - 1`.
    #[default]
    Any,
    /// Advancing to level `L` needs the entry at level `L - 1` to hold the
    /// requested accuracy tier as well.
    MatchingTier,
}

impl AccuracyGating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::MatchingTier => "matching_tier",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "any" => Some(Self::Any),
            "matching_tier" => Some(Self::MatchingTier),
            _ => None,
        }
    }
}

/// Why a trial refused to train a pseudo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The report is empty and the trial is not the entry level.
    Untested { level: u32 },
    /// The report already holds this accuracy at the trial's own level.
    AlreadyRecorded { key: String, accuracy: String },
    /// The pseudo is not exactly one level below the trial.
    LevelMismatch { current: u32, requested: u32 },
    /// The previous level lacks the requested accuracy tier.
    MissingPriorTier { key: String, accuracy: String },
    /// A trial-specific gate refused the pseudo.
    DomainGate { detail: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untested { level } => {
                write!(f, "untested pseudo cannot start at level {level}")
            }
            Self::AlreadyRecorded { key, accuracy } => {
                write!(f, "{key} already has an entry for accuracy {accuracy}")
            }
            Self::LevelMismatch { current, requested } => {
                write!(f, "pseudo is at level {current}, cannot train level {requested}")
            }
            Self::MissingPriorTier { key, accuracy } => {
                write!(f, "{key} has no entry for accuracy {accuracy}")
            }
            Self::DomainGate { detail } => f.write_str(detail),
        }
    }
}

/// Result of checking whether a trial may train a pseudo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Eligibility {
    Accepted,
    Rejected(RejectionReason),
}

impl Eligibility {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Apply an additional gate on top of an accepted verdict.
    #[must_use]
    pub fn and_then_gate(self, gate: Option<String>) -> Self {
        match (self, gate) {
            (Self::Accepted, Some(detail)) => Self::Rejected(RejectionReason::DomainGate { detail }),
            (verdict, _) => verdict,
        }
    }
}
