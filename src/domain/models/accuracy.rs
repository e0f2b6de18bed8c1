//! Accuracy tiers under which trial results are recorded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named precision tier for a trial result.
///
/// Several tiers may coexist under the same trial key. The hints trial
/// always records all three at once; the delta-factor trial records one tier
/// per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Low,
    Normal,
    High,
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::Normal
    }
}

impl Accuracy {
    /// All tiers, ordered from the loosest to the tightest.
    pub const ALL: [Accuracy; 3] = [Accuracy::Low, Accuracy::Normal, Accuracy::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
