//! Per-run training options.

use serde::{Deserialize, Serialize};

use super::accuracy::Accuracy;
use crate::domain::errors::{DojoError, DojoResult};

const fn default_estep() -> f64 {
    10.0
}

const fn default_kppa() -> u32 {
    6750
}

/// Options shared by every trial of a progression run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrainingOptions {
    /// Accuracy tier for trials that record a single tier per run.
    #[serde(default)]
    pub accuracy: Accuracy,

    /// Cutoff step (Ha) of the iterative hints scan.
    #[serde(default = "default_estep")]
    pub estep: f64,

    /// k-points per reciprocal atom for the delta-factor workflow.
    #[serde(default = "default_kppa")]
    pub kppa: u32,

    /// Allow a commit to replace existing accuracy entries.
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::default(),
            estep: default_estep(),
            kppa: default_kppa(),
            overwrite: false,
        }
    }
}

impl TrainingOptions {
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    #[must_use]
    pub fn with_estep(mut self, estep: f64) -> Self {
        self.estep = estep;
        self
    }

    #[must_use]
    pub fn with_kppa(mut self, kppa: u32) -> Self {
        self.kppa = kppa;
        self
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Reject options no workflow can be built from.
    pub fn validate(&self) -> DojoResult<()> {
        if !self.estep.is_finite() || self.estep <= 0.0 {
            return Err(DojoError::InvalidOptions(format!(
                "estep must be a finite, positive number of Hartree, got {}",
                self.estep
            )));
        }
        if self.kppa == 0 {
            return Err(DojoError::InvalidOptions("kppa must be at least 1".to_string()));
        }
        Ok(())
    }
}
