//! Level 0 master: convergence of the total energy versus the plane-wave
//! cutoff.
//!
//! The challenge runs in two stages. A coarse iterative scan brackets the
//! cutoffs that satisfy the low and high tolerances; a dense scan with a
//! 1 Ha step over that bracket then yields the low/normal/high hints.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::traits::{ChallengeContext, Master};
use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::{
    Accuracy, ReportFragment, RunResult, TrainingOptions, TrialKind, EXCEPTIONS_FIELD,
};
use crate::domain::ports::{EcutSpec, Pseudo, WorkParams, WorkflowFactory};

/// SCF energy tolerance (Ha) of the convergence runs.
pub const TOLDFE: f64 = 1.0e-8;

/// Sibling directory receiving the iterative scan once it completes.
pub const ITERATIVE_DIR: &str = "ITERATIVE";

const ECUT_FLOOR: f64 = 5.0;

pub struct HintsMaster {
    factory: Arc<dyn WorkflowFactory>,
}

impl HintsMaster {
    pub fn new(factory: Arc<dyn WorkflowFactory>) -> Self {
        Self { factory }
    }

    fn params(ecuts: EcutSpec) -> WorkParams {
        WorkParams::Convergence {
            ecuts,
            toldfe: TOLDFE,
            atols_mev: TrialKind::Hints.accuracy_tolerances().to_vec(),
        }
    }

    fn ecut_hint(results: &RunResult, accuracy: Accuracy) -> Option<f64> {
        results
            .get(accuracy.as_str())
            .and_then(|entry| entry.get("ecut"))
            .and_then(Value::as_f64)
    }

    /// Dense scan bounds derived from the iterative hints.
    ///
    /// Starts one step below the low hint (never below 5 Ha, and from 1 Ha
    /// when that lands at or below 10 Ha so the low hint is not
    /// overestimated) and stops one step above the high hint.
    pub fn dense_range(low_ecut: f64, high_ecut: f64, estep: f64) -> (f64, f64) {
        let mut estart = (low_ecut - estep).max(ECUT_FLOOR);
        if estart <= 10.0 {
            estart = 1.0;
        }
        (estart, high_ecut + estep)
    }
}

#[async_trait]
impl Master for HintsMaster {
    fn kind(&self) -> TrialKind {
        TrialKind::Hints
    }

    fn workdir(&self, root: &Path, _options: &TrainingOptions) -> PathBuf {
        root.join(format!("LEVEL_{}", self.kind().level()))
    }

    async fn challenge(
        &self,
        ctx: &ChallengeContext<'_>,
        pseudo: &dyn Pseudo,
        options: &TrainingOptions,
    ) -> DojoResult<RunResult> {
        let workdir = self.workdir(ctx.root, options);
        let estep = options.estep;

        if tokio::fs::try_exists(&workdir).await? {
            tokio::fs::remove_dir_all(&workdir).await?;
        }

        let slice = EcutSpec::Slice {
            start: ECUT_FLOOR,
            stop: None,
            step: estep,
        };
        let mut work = self
            .factory
            .work_for_pseudo(&workdir, ctx.manager, pseudo, Self::params(slice))
            .await?;

        tracing::info!(
            master = self.name(),
            pseudo = pseudo.name(),
            estep,
            max_ncpus = ctx.max_ncpus,
            "Converging in iterative mode"
        );

        work.start().await?;
        work.wait().await?;
        let iterative = work.results().await?;
        work.relocate(ITERATIVE_DIR).await?;

        let (low, high) = match (
            Self::ecut_hint(&iterative, Accuracy::Low),
            Self::ecut_hint(&iterative, Accuracy::High),
        ) {
            (Some(low), Some(high)) => (low, high),
            _ if iterative.has_exceptions() => {
                tracing::warn!(
                    master = self.name(),
                    pseudo = pseudo.name(),
                    exceptions = %iterative.exceptions_marker(),
                    "Iterative scan failed; skipping dense scan"
                );
                return Ok(iterative);
            }
            _ => {
                return Err(DojoError::MissingResultField {
                    trial: self.kind().key().to_string(),
                    field: "low.ecut/high.ecut".to_string(),
                })
            }
        };

        let (estart, estop) = Self::dense_range(low, high, estep);
        let work = self
            .factory
            .work_for_pseudo(
                &workdir,
                ctx.manager,
                pseudo,
                Self::params(EcutSpec::range(estart, estop, 1.0)?),
            )
            .await?;

        tracing::info!(
            master = self.name(),
            pseudo = pseudo.name(),
            max_ncpus = ctx.max_ncpus,
            "Finding optimal values for ecut in the range [{estart:.1}, {estop:.1}, 1] Hartree"
        );

        let retcodes = ctx.runner.run(work.as_ref(), ctx.max_ncpus).await?;
        tracing::debug!(master = self.name(), ?retcodes, "Dense scan complete");

        work.results().await
    }

    fn synthesize_report(
        &self,
        _pseudo: &dyn Pseudo,
        results: &RunResult,
        _options: &TrainingOptions,
    ) -> DojoResult<ReportFragment> {
        let mut fragment = ReportFragment::new(self.kind().key());

        for accuracy in Accuracy::ALL {
            let label = accuracy.as_str();
            let mut fields = match results.get(label) {
                Some(Value::Object(map)) => map.clone(),
                _ if results.has_exceptions() => Map::new(),
                _ => {
                    return Err(DojoError::MissingResultField {
                        trial: self.kind().key().to_string(),
                        field: label.to_string(),
                    })
                }
            };

            if results.has_exceptions() {
                fields.insert(
                    EXCEPTIONS_FIELD.to_string(),
                    Value::String(results.exceptions_marker()),
                );
            }

            fragment = fragment.with_entry(label, Value::Object(fields));
        }

        Ok(fragment)
    }
}
