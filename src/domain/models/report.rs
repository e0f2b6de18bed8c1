//! Persisted dojo report and the fragment merge protocol.
//!
//! A [`DojoReport`] maps a trial key (`"hints"`, `"delta_factor"`) to the
//! results recorded under each accuracy label. Trials produce a
//! [`ReportFragment`] that is folded into the report with
//! [`merge_fragment`], a pure function returning a new report. The old
//! report is never mutated, so a rejected merge leaves nothing half-written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Field under which captured workflow exceptions are stored in a result
/// entry.
pub const EXCEPTIONS_FIELD: &str = "_exceptions";

/// Accuracy label -> result fields for a single trial key.
pub type TrialEntries = BTreeMap<String, Value>;

/// The per-pseudopotential record of every committed trial result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DojoReport {
    trials: BTreeMap<String, TrialEntries>,
}

impl DojoReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Trial keys present in the report, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.trials.keys().map(String::as_str)
    }

    pub fn trial(&self, key: &str) -> Option<&TrialEntries> {
        self.trials.get(key)
    }

    pub fn has_trial(&self, key: &str) -> bool {
        self.trials.contains_key(key)
    }

    /// Whether `key` already holds an entry for the given accuracy label.
    pub fn has_accuracy(&self, key: &str, accuracy: &str) -> bool {
        self.trials
            .get(key)
            .is_some_and(|entries| entries.contains_key(accuracy))
    }

    pub fn entry(&self, key: &str, accuracy: &str) -> Option<&Value> {
        self.trials.get(key).and_then(|entries| entries.get(accuracy))
    }

    /// Builder used by adapters and tests to seed a report.
    #[must_use]
    pub fn with_entry(
        mut self,
        key: impl Into<String>,
        accuracy: impl Into<String>,
        fields: Value,
    ) -> Self {
        self.trials
            .entry(key.into())
            .or_default()
            .insert(accuracy.into(), fields);
        self
    }
}

/// Results of one trial run, keyed by accuracy label, ready to be merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFragment {
    pub key: String,
    pub entries: TrialEntries,
}

impl ReportFragment {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entries: TrialEntries::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, accuracy: impl Into<String>, fields: Value) -> Self {
        self.entries.insert(accuracy.into(), fields);
        self
    }

    /// Accuracy labels this fragment would commit.
    pub fn accuracies(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Stringified exceptions recorded under any accuracy label.
    pub fn exceptions(&self) -> Vec<String> {
        self.entries
            .values()
            .filter_map(|fields| fields.get(EXCEPTIONS_FIELD))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    pub fn has_exceptions(&self) -> bool {
        self.entries
            .values()
            .any(|fields| fields.get(EXCEPTIONS_FIELD).is_some())
    }
}

/// Attempt to commit accuracy entries that already exist without the
/// overwrite flag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key} already has entries for accuracy {accuracies:?}; refusing to overwrite")]
pub struct MergeConflict {
    pub key: String,
    pub accuracies: Vec<String>,
}

/// Fold `fragment` into `old`, returning the merged report.
///
/// A new trial key is created. For an existing key, accuracy labels that are
/// already present cause a [`MergeConflict`] unless `overwrite` is set;
/// otherwise entries are added alongside the existing ones. Keys and labels
/// not named by the fragment are carried over untouched.
pub fn merge_fragment(
    old: &DojoReport,
    fragment: &ReportFragment,
    overwrite: bool,
) -> Result<DojoReport, MergeConflict> {
    if let Some(existing) = old.trial(&fragment.key) {
        let clashes: Vec<String> = fragment
            .accuracies()
            .filter(|acc| existing.contains_key(*acc))
            .map(str::to_string)
            .collect();

        if !clashes.is_empty() && !overwrite {
            return Err(MergeConflict {
                key: fragment.key.clone(),
                accuracies: clashes,
            });
        }
    }

    let mut merged = old.clone();
    let slot = merged.trials.entry(fragment.key.clone()).or_default();
    for (accuracy, fields) in &fragment.entries {
        slot.insert(accuracy.clone(), fields.clone());
    }

    Ok(merged)
}
