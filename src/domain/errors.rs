//! Domain errors for the pseudo dojo.

use std::path::PathBuf;

use thiserror::Error;

use super::models::report::MergeConflict;

/// Domain-level errors that can occur while training a pseudopotential.
///
/// Eligibility rejections are deliberately absent: a pseudo that cannot be
/// trained at some level is a normal outcome, not an error. Likewise,
/// exceptions raised inside a workflow are captured as data in
/// [`RunResult`](super::models::RunResult) and never surface here.
#[derive(Debug, Error)]
pub enum DojoError {
    /// The trial registry is inconsistent (duplicate or missing level).
    #[error("Registry error: {0}")]
    Registry(String),

    /// Committing a report fragment would overwrite an existing entry.
    #[error(transparent)]
    OverwriteConflict(#[from] MergeConflict),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid pseudopotential {path}: {reason}")]
    InvalidPseudo { path: PathBuf, reason: String },

    #[error("No reference entry for {symbol} (code {code})")]
    MissingReference { symbol: String, code: String },

    /// Training options or scan bounds that cannot define a calculation.
    #[error("Invalid training options: {0}")]
    InvalidOptions(String),

    #[error("Missing result field '{field}' in {trial} results")]
    MissingResultField { trial: String, field: String },

    /// The workflow could not be built or executed at all.
    #[error("Workflow failed: {0}")]
    Workflow(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DojoResult<T> = Result<T, DojoError>;

impl From<serde_json::Error> for DojoError {
    fn from(err: serde_json::Error) -> Self {
        DojoError::SerializationError(err.to_string())
    }
}

impl DojoError {
    /// Returns `true` for errors that abort the current progression run and
    /// must never be retried automatically.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DojoError::Registry(_)
                | DojoError::OverwriteConflict(_)
                | DojoError::InvalidStateTransition { .. }
        )
    }
}
