//! Workflow execution ports.
//!
//! The calculations behind each trial are built by a [`WorkflowFactory`] and
//! executed either by the work itself ([`Work::start`] / [`Work::wait`]) or
//! under a CPU budget by a [`ResourceRunner`]. The dojo only awaits them.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::pseudo::Pseudo;
use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::{Accuracy, RunResult};

/// Opaque handle passed through to workflow factories.
pub trait ExecutionManager: Send + Sync + fmt::Debug {
    /// Short description for diagnostics.
    fn describe(&self) -> String;
}

/// Upper bound on the number of cutoffs in an explicit scan.
pub const MAX_SCAN_POINTS: u32 = 10_000;

/// Cutoff energies (Ha) to scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EcutSpec {
    /// Iterative scan from `start` with `step`, open-ended unless `stop` is set.
    Slice {
        start: f64,
        stop: Option<f64>,
        step: f64,
    },
    /// Explicit list of cutoffs.
    Values { ecuts: Vec<f64> },
}

impl EcutSpec {
    /// `start, start + step, ...` strictly below `stop`.
    ///
    /// Fails when a bound is not finite, the step is not positive, or the
    /// scan would exceed [`MAX_SCAN_POINTS`].
    pub fn range(start: f64, stop: f64, step: f64) -> DojoResult<Self> {
        if !(start.is_finite() && stop.is_finite() && step.is_finite()) || step <= 0.0 {
            return Err(DojoError::InvalidOptions(format!(
                "ecut range [{start}, {stop}) with step {step} is not a finite, increasing scan"
            )));
        }

        let count = ((stop - start) / step).ceil().max(0.0);
        if count > f64::from(MAX_SCAN_POINTS) {
            return Err(DojoError::InvalidOptions(format!(
                "ecut range [{start}, {stop}) with step {step} has more than {MAX_SCAN_POINTS} points"
            )));
        }

        let ecuts = (0..MAX_SCAN_POINTS)
            .map(|k| start + f64::from(k) * step)
            .take_while(|ecut| *ecut < stop)
            .collect();
        Ok(Self::Values { ecuts })
    }
}

/// Trial-specific parameters forwarded to the factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "workflow", rename_all = "snake_case")]
pub enum WorkParams {
    /// Total energy convergence versus cutoff.
    Convergence {
        ecuts: EcutSpec,
        toldfe: f64,
        atols_mev: Vec<f64>,
    },
    /// Equation-of-state fit for the delta factor.
    DeltaFactor {
        accuracy: Accuracy,
        kppa: u32,
        ecut: Option<f64>,
    },
}

/// A built workflow made of independent jobs.
#[async_trait]
pub trait Work: Send + Sync {
    /// Directory in which the work runs.
    fn workdir(&self) -> &Path;

    /// Number of jobs a [`ResourceRunner`] can schedule.
    fn job_count(&self) -> usize;

    /// Execute a single job and return its exit code.
    async fn run_job(&self, index: usize) -> DojoResult<i32>;

    /// Launch every job in the background.
    async fn start(&mut self) -> DojoResult<()>;

    /// Block until a previous [`start`](Self::start) completes.
    async fn wait(&mut self) -> DojoResult<Vec<i32>>;

    /// Collect results; in-workflow failures are captured in the result.
    async fn results(&self) -> DojoResult<RunResult>;

    /// Move the work directory to a sibling named `name`.
    async fn relocate(&mut self, name: &str) -> DojoResult<()>;
}

/// Builds the work for one pseudo.
#[async_trait]
pub trait WorkflowFactory: Send + Sync {
    async fn work_for_pseudo(
        &self,
        workdir: &Path,
        manager: &Arc<dyn ExecutionManager>,
        pseudo: &dyn Pseudo,
        params: WorkParams,
    ) -> DojoResult<Box<dyn Work>>;
}

/// Executes the jobs of a work under a CPU budget.
#[async_trait]
pub trait ResourceRunner: Send + Sync {
    /// Run every job, at most `max_ncpus` at a time, and return the exit
    /// codes in job order.
    async fn run(&self, work: &dyn Work, max_ncpus: usize) -> DojoResult<Vec<i32>>;
}
