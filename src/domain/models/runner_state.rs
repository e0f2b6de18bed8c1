//! Trial runner state machine.
//!
//! ```text
//! Constructed -> Accepted -> Challenged -> Reported -> Committed
//!                                  \            \
//!                                   +------------+--> Rejected
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    /// Holds manager and budget, no subject yet.
    Constructed,
    /// Eligibility passed; the pseudo is the runner's subject.
    Accepted,
    /// The external workflow completed.
    Challenged,
    /// A report fragment was synthesised from the results.
    Reported,
    /// The fragment was merged and persisted.
    Committed,
    /// The run was aborted (workflow could not run, or overwrite conflict).
    Rejected,
}

impl RunnerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::Accepted => "accepted",
            Self::Challenged => "challenged",
            Self::Reported => "reported",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Constructed, Self::Accepted)
                | (Self::Accepted, Self::Challenged)
                | (Self::Challenged, Self::Reported)
                | (Self::Reported, Self::Committed)
                | (Self::Accepted, Self::Rejected)
                | (Self::Challenged, Self::Rejected)
                | (Self::Reported, Self::Rejected)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected)
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
