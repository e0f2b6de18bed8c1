//! Capability interface implemented by every dojo master.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::DojoResult;
use crate::domain::models::{ReportFragment, RunResult, TrainingOptions, TrialKind};
use crate::domain::ports::{ExecutionManager, Pseudo, ResourceRunner};

/// Shared execution resources handed to a master for one challenge.
pub struct ChallengeContext<'a> {
    /// `DOJO_<pseudo>` directory of the current run.
    pub root: &'a Path,
    pub manager: &'a Arc<dyn ExecutionManager>,
    pub runner: &'a dyn ResourceRunner,
    pub max_ncpus: usize,
    pub verbose: u8,
}

/// One trial kind: how to run its calculation and how to turn the raw
/// results into a report fragment.
#[async_trait]
pub trait Master: Send + Sync {
    fn kind(&self) -> TrialKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Work directory of this trial below `root`.
    fn workdir(&self, root: &Path, options: &TrainingOptions) -> PathBuf;

    /// Trial-specific eligibility gate applied after the progression rule.
    ///
    /// Returns the rejection detail when the pseudo must not be trained.
    fn domain_gate(&self, _pseudo: &dyn Pseudo) -> Option<String> {
        None
    }

    /// Build and execute the workflow, blocking until it completes.
    async fn challenge(
        &self,
        ctx: &ChallengeContext<'_>,
        pseudo: &dyn Pseudo,
        options: &TrainingOptions,
    ) -> DojoResult<RunResult>;

    /// Extract the canonical report fields from `results`.
    fn synthesize_report(
        &self,
        pseudo: &dyn Pseudo,
        results: &RunResult,
        options: &TrainingOptions,
    ) -> DojoResult<ReportFragment>;
}
