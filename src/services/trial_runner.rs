//! Lifecycle of a single trial against a single pseudopotential.
//!
//! A [`TrialRunner`] wraps one [`Master`] and walks it through
//! `Constructed -> Accepted -> Challenged -> Reported -> Committed`. Any
//! error after acceptance leaves the runner `Rejected`.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use super::eligibility;
use super::masters::{ChallengeContext, Master};
use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::{
    merge_fragment, Accuracy, AccuracyGating, CapturedFailures, Eligibility, ReportFragment,
    RunResult, RunnerState, TrainingMeasurement, TrainingOptions, TrialKind, TrialOutcome,
    TrialRegistry,
};
use crate::domain::ports::{ExecutionManager, Pseudo, ResourceRunner};

/// Audit copy of the raw results, written in the trial work directory.
pub const RAW_RESULTS_FILE: &str = "report.json";

pub struct TrialRunner {
    master: Arc<dyn Master>,
    manager: Arc<dyn ExecutionManager>,
    runner: Arc<dyn ResourceRunner>,
    max_ncpus: usize,
    verbose: u8,
    state: RunnerState,
    subject: Option<Arc<dyn Pseudo>>,
}

impl TrialRunner {
    pub fn new(
        master: Arc<dyn Master>,
        manager: Arc<dyn ExecutionManager>,
        runner: Arc<dyn ResourceRunner>,
    ) -> Self {
        Self {
            master,
            manager,
            runner,
            max_ncpus: 1,
            verbose: 0,
            state: RunnerState::Constructed,
            subject: None,
        }
    }

    #[must_use]
    pub fn with_max_ncpus(mut self, max_ncpus: usize) -> Self {
        self.max_ncpus = max_ncpus.max(1);
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn kind(&self) -> TrialKind {
        self.master.kind()
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn subject(&self) -> Option<&Arc<dyn Pseudo>> {
        self.subject.as_ref()
    }

    fn transition(&mut self, next: RunnerState) -> DojoResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(DojoError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Decide whether `pseudo` may be trained at `accuracy` and, if so, make
    /// it the runner's subject.
    ///
    /// Rejection is a normal outcome: the runner stays `Constructed` and the
    /// reason is only logged.
    pub async fn accept_pseudo(
        &mut self,
        pseudo: &Arc<dyn Pseudo>,
        registry: &TrialRegistry,
        accuracy: Accuracy,
        gating: AccuracyGating,
    ) -> DojoResult<Eligibility> {
        let report = pseudo.read_dojo_report().await?;
        let verdict = eligibility::assess(&report, registry, self.kind(), accuracy, gating)
            .and_then_gate(self.master.domain_gate(pseudo.as_ref()));

        self.record_verdict(pseudo, &verdict)?;
        Ok(verdict)
    }

    /// Accept `pseudo` ignoring the progression rule.
    ///
    /// Only the master's own gate applies. Used to retrain a level that is
    /// already recorded.
    pub fn force_accept(&mut self, pseudo: &Arc<dyn Pseudo>) -> DojoResult<Eligibility> {
        let verdict = Eligibility::Accepted.and_then_gate(self.master.domain_gate(pseudo.as_ref()));
        self.record_verdict(pseudo, &verdict)?;
        Ok(verdict)
    }

    fn record_verdict(&mut self, pseudo: &Arc<dyn Pseudo>, verdict: &Eligibility) -> DojoResult<()> {
        match verdict {
            Eligibility::Accepted => {
                self.transition(RunnerState::Accepted)?;
                self.subject = Some(Arc::clone(pseudo));
                tracing::info!(
                    master = self.master.name(),
                    pseudo = pseudo.name(),
                    "Pseudo accepted"
                );
            }
            Eligibility::Rejected(reason) => {
                tracing::info!(
                    master = self.master.name(),
                    pseudo = pseudo.name(),
                    reason = %reason,
                    "Pseudo rejected"
                );
            }
        }
        Ok(())
    }

    /// Challenge the accepted pseudo, synthesise the report fragment and
    /// commit it.
    ///
    /// `root` is the `DOJO_<pseudo>` directory of the run. Captured workflow
    /// exceptions yield a [`TrialOutcome::Failed`] measurement; the fragment
    /// is still committed with its exceptions marker.
    pub async fn start_training(
        &mut self,
        root: &Path,
        options: &TrainingOptions,
    ) -> DojoResult<TrainingMeasurement> {
        options.validate()?;
        self.transition(RunnerState::Challenged)?;

        let result = self.train(root, options).await;
        if result.is_err() && self.state.can_transition_to(RunnerState::Rejected) {
            self.state = RunnerState::Rejected;
        }
        result
    }

    async fn train(&mut self, root: &Path, options: &TrainingOptions) -> DojoResult<TrainingMeasurement> {
        let pseudo = self
            .subject
            .clone()
            .ok_or_else(|| DojoError::InvalidStateTransition {
                from: RunnerState::Constructed.to_string(),
                to: RunnerState::Challenged.to_string(),
            })?;

        let start = Instant::now();
        let ctx = ChallengeContext {
            root,
            manager: &self.manager,
            runner: self.runner.as_ref(),
            max_ncpus: self.max_ncpus,
            verbose: self.verbose,
        };

        let results = self.master.challenge(&ctx, pseudo.as_ref(), options).await?;

        self.transition(RunnerState::Reported)?;
        let fragment = self
            .master
            .synthesize_report(pseudo.as_ref(), &results, options)?;

        let workdir = self.master.workdir(root, options);
        self.dump_results(&workdir, pseudo.as_ref(), options, &results)
            .await?;

        self.commit(pseudo.as_ref(), &fragment, options.overwrite)
            .await?;
        self.transition(RunnerState::Committed)?;

        let elapsed = start.elapsed();
        tracing::info!(
            master = self.master.name(),
            pseudo = pseudo.name(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Trial completed in {:.2} s",
            elapsed.as_secs_f64()
        );

        let outcome = if fragment.has_exceptions() {
            let mut exceptions = fragment.exceptions();
            exceptions.sort();
            exceptions.dedup();
            tracing::warn!(
                master = self.master.name(),
                pseudo = pseudo.name(),
                exceptions = ?exceptions,
                "Trial completed with captured exceptions"
            );
            TrialOutcome::Failed(CapturedFailures(exceptions))
        } else {
            TrialOutcome::Passed
        };

        Ok(TrainingMeasurement {
            trial: self.kind(),
            pseudo: pseudo.name().to_string(),
            outcome,
            elapsed,
        })
    }

    async fn dump_results(
        &self,
        workdir: &Path,
        pseudo: &dyn Pseudo,
        options: &TrainingOptions,
        results: &RunResult,
    ) -> DojoResult<()> {
        tokio::fs::create_dir_all(workdir).await?;
        let envelope = json!({
            "trial": self.kind().key(),
            "pseudo": pseudo.name(),
            "accuracy": options.accuracy,
            "created_at": Utc::now().to_rfc3339(),
            "results": results,
        });
        let path = workdir.join(RAW_RESULTS_FILE);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&envelope)?).await?;
        tracing::debug!(path = %path.display(), "Raw results written");
        Ok(())
    }

    /// Merge `fragment` into the persisted report and write it back.
    ///
    /// The report is read again here rather than at acceptance so that a
    /// concurrent change is detected as a conflict.
    async fn commit(
        &self,
        pseudo: &dyn Pseudo,
        fragment: &ReportFragment,
        overwrite: bool,
    ) -> DojoResult<()> {
        let current = pseudo.read_dojo_report().await?;
        let merged = merge_fragment(&current, fragment, overwrite).map_err(|conflict| {
            tracing::error!(
                master = self.master.name(),
                pseudo = pseudo.name(),
                key = %conflict.key,
                accuracies = ?conflict.accuracies,
                "Refusing to overwrite dojo report entries"
            );
            conflict
        })?;
        pseudo.write_dojo_report(&merged).await?;

        tracing::info!(
            master = self.master.name(),
            pseudo = pseudo.name(),
            key = %fragment.key,
            accuracies = ?fragment.accuracies().collect::<Vec<_>>(),
            "Dojo report updated"
        );
        Ok(())
    }
}
