//! Ephemeral results of a single challenge execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::trial::TrialKind;
use crate::domain::errors::{DojoError, DojoResult};

/// Structured output of a workflow run.
///
/// Exceptions raised inside the distributed execution are carried as data in
/// `exceptions`; they never propagate as errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub exceptions: Vec<String>,
}

impl RunResult {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self {
            payload,
            exceptions: Vec::new(),
        }
    }

    /// Build from a JSON value; non-object values are stored under `"value"`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Self::new(map)
            }
        }
    }

    #[must_use]
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exceptions.push(exception.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn has_exceptions(&self) -> bool {
        !self.exceptions.is_empty()
    }

    /// Read a numeric field, failing with [`DojoError::MissingResultField`].
    pub fn number(&self, trial: TrialKind, field: &str) -> DojoResult<f64> {
        self.payload
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| DojoError::MissingResultField {
                trial: trial.key().to_string(),
                field: field.to_string(),
            })
    }

    /// Stringified exception list, as stored in the report.
    pub fn exceptions_marker(&self) -> String {
        format!("{:?}", self.exceptions)
    }
}

/// Workflow failures captured while a trial ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFailures(pub Vec<String>);

/// Outcome of a trial that ran: it either passed, or completed with captured
/// in-workflow failures. Trials that could not run at all are reported as
/// [`DojoError`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "exceptions", rename_all = "snake_case")]
pub enum TrialOutcome {
    Passed,
    Failed(CapturedFailures),
}

impl TrialOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// The result of one trial with timing metadata.
///
/// Elapsed time is reported for observability only and is never written to
/// the pseudopotential report.
#[derive(Debug, Clone)]
pub struct TrainingMeasurement {
    pub trial: TrialKind,
    pub pseudo: String,
    pub outcome: TrialOutcome,
    pub elapsed: Duration,
}

impl TrainingMeasurement {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}
