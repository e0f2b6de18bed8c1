//! Trial kinds and the static level registry.
//!
//! Every trial a pseudopotential can be put through is declared here, bound
//! to a fixed level. The registry validates that levels start at zero, are
//! contiguous and are never shared between two kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DojoError, DojoResult};

/// One stage of the validation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialKind {
    /// Level 0: convergence of the total energy versus the cutoff energy.
    Hints,
    /// Level 1: equation-of-state delta factor against reference data.
    DeltaFactor,
}

/// Absolute energy tolerances in meV for the low, normal and high hints.
static HINTS_ATOLS_MEV: [f64; 3] = [10.0, 1.0, 0.1];

impl TrialKind {
    /// Every registered trial kind.
    pub const ALL: [TrialKind; 2] = [TrialKind::Hints, TrialKind::DeltaFactor];

    pub const fn level(self) -> u32 {
        match self {
            Self::Hints => 0,
            Self::DeltaFactor => 1,
        }
    }

    /// Key under which this trial's results are stored in the report.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Hints => "hints",
            Self::DeltaFactor => "delta_factor",
        }
    }

    /// Master name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hints => "HintsMaster",
            Self::DeltaFactor => "DeltaFactorMaster",
        }
    }

    pub fn accuracy_tolerances(self) -> &'static [f64] {
        match self {
            Self::Hints => &HINTS_ATOLS_MEV,
            Self::DeltaFactor => &[],
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for TrialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Validated, level-ordered set of trial kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRegistry {
    kinds: Vec<TrialKind>,
}

impl TrialRegistry {
    /// Registry of every built-in trial kind.
    pub fn builtin() -> DojoResult<Self> {
        Self::from_kinds(&TrialKind::ALL)
    }

    /// Build a registry from an arbitrary set of kinds.
    ///
    /// Fails when two kinds share a level or when the levels do not form the
    /// contiguous range `0..n`.
    pub fn from_kinds(kinds: &[TrialKind]) -> DojoResult<Self> {
        let mut sorted = kinds.to_vec();
        sorted.sort_by_key(|kind| kind.level());

        for (expected, kind) in (0u32..).zip(&sorted) {
            let found = sorted.iter().filter(|k| k.level() == kind.level()).count();
            if found != 1 {
                return Err(DojoError::Registry(format!(
                    "Found {found} masters with dojo level {}",
                    kind.level()
                )));
            }
            if kind.level() != expected {
                return Err(DojoError::Registry(format!(
                    "Dojo levels must be contiguous from 0: expected level {expected}, found {}",
                    kind.level()
                )));
            }
        }

        Ok(Self { kinds: sorted })
    }

    /// All kinds in ascending level order.
    pub fn kinds(&self) -> &[TrialKind] {
        &self.kinds
    }

    /// Kinds up to and including `max_level`, or all of them when unset.
    pub fn active(&self, max_level: Option<u32>) -> &[TrialKind] {
        match max_level {
            Some(max) => {
                let end = self.kinds.iter().take_while(|k| k.level() <= max).count();
                &self.kinds[..end]
            }
            None => &self.kinds,
        }
    }

    /// The single kind registered at `level`.
    pub fn kind_for_level(&self, level: u32) -> DojoResult<TrialKind> {
        let matches: Vec<TrialKind> = self
            .kinds
            .iter()
            .copied()
            .filter(|k| k.level() == level)
            .collect();

        match matches.as_slice() {
            [kind] => Ok(*kind),
            other => Err(DojoError::Registry(format!(
                "Found {} masters with dojo level {level}",
                other.len()
            ))),
        }
    }

    /// Level of the trial stored under `key`, if it is registered.
    pub fn level_of_key(&self, key: &str) -> Option<u32> {
        self.kinds
            .iter()
            .find(|k| k.key() == key)
            .map(|k| k.level())
    }

    /// Human-readable table of levels.
    pub fn describe(&self) -> String {
        let mut lines = vec!["Dojo level --> Challenge".to_string()];
        for kind in &self.kinds {
            lines.push(format!("level {} --> {}", kind.level(), kind.key()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_sorted() {
        let registry = TrialRegistry::builtin().unwrap();
        assert_eq!(registry.kinds(), &[TrialKind::Hints, TrialKind::DeltaFactor]);
    }

    #[test]
    fn test_from_kinds_sorts_by_level() {
        let registry =
            TrialRegistry::from_kinds(&[TrialKind::DeltaFactor, TrialKind::Hints]).unwrap();
        assert_eq!(registry.kinds()[0], TrialKind::Hints);
    }

    #[test]
    fn test_duplicate_level_is_rejected() {
        let result = TrialRegistry::from_kinds(&[TrialKind::Hints, TrialKind::Hints]);
        assert!(matches!(result, Err(DojoError::Registry(msg)) if msg.contains("Found 2")));
    }

    #[test]
    fn test_level_gap_is_rejected() {
        let result = TrialRegistry::from_kinds(&[TrialKind::DeltaFactor]);
        assert!(matches!(result, Err(DojoError::Registry(msg)) if msg.contains("contiguous")));
    }

    #[test]
    fn test_active_truncates_inclusive() {
        let registry = TrialRegistry::builtin().unwrap();
        assert_eq!(registry.active(Some(0)), &[TrialKind::Hints]);
        assert_eq!(registry.active(Some(1)).len(), 2);
        assert_eq!(registry.active(Some(7)).len(), 2);
        assert_eq!(registry.active(None).len(), 2);
    }

    #[test]
    fn test_kind_for_unknown_level_is_configuration_error() {
        let registry = TrialRegistry::builtin().unwrap();
        assert_eq!(registry.kind_for_level(1).unwrap(), TrialKind::DeltaFactor);
        let err = registry.kind_for_level(5).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_key_lookups() {
        let registry = TrialRegistry::builtin().unwrap();
        assert_eq!(registry.level_of_key("delta_factor"), Some(1));
        assert_eq!(registry.level_of_key("phonons"), None);
        assert_eq!(TrialKind::from_key("hints"), Some(TrialKind::Hints));
    }

    #[test]
    fn test_describe_lists_levels() {
        let text = TrialRegistry::builtin().unwrap().describe();
        assert!(text.contains("level 0 --> hints"));
        assert!(text.contains("level 1 --> delta_factor"));
    }

    #[test]
    fn test_hints_tolerances() {
        assert_eq!(TrialKind::Hints.accuracy_tolerances(), &[10.0, 1.0, 0.1]);
        assert!(TrialKind::DeltaFactor.accuracy_tolerances().is_empty());
    }
}
