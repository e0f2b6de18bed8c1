//! Progression engine.
//!
//! [`Dojo`] runs a pseudopotential through every active trial in ascending
//! level order. Each level re-reads the report, so a level committed earlier
//! in the same call unlocks the next one. The first trial that completes with
//! captured exceptions halts the progression.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::eligibility;
use super::masters::Master;
use super::trial_runner::TrialRunner;
use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::{
    Accuracy, AccuracyGating, DojoReport, Eligibility, RejectionReason, TrainingMeasurement,
    TrainingOptions, TrialKind, TrialRegistry,
};
use crate::domain::ports::{ExecutionManager, Pseudo, PseudoLoader, PseudoSource, ResourceRunner};

/// What happened to one pseudo during a progression run.
#[derive(Debug, Clone)]
pub struct ProgressionSummary {
    pub run_id: Uuid,
    pub pseudo: String,
    /// Trials that ran, in order.
    pub measurements: Vec<TrainingMeasurement>,
    /// Trials skipped by the eligibility rule.
    pub skipped: Vec<(TrialKind, RejectionReason)>,
    /// Trial whose captured exceptions stopped the run.
    pub halted_at: Option<TrialKind>,
}

impl ProgressionSummary {
    fn new(pseudo: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pseudo: pseudo.into(),
            measurements: Vec::new(),
            skipped: Vec::new(),
            halted_at: None,
        }
    }

    /// `true` unless a trial completed with captured exceptions.
    pub fn is_ok(&self) -> bool {
        self.halted_at.is_none()
    }
}

/// Eligibility of one active level for a pseudo, as of its current report.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelAssessment {
    pub kind: TrialKind,
    pub eligibility: Eligibility,
}

pub struct Dojo {
    registry: TrialRegistry,
    masters: Vec<Arc<dyn Master>>,
    manager: Arc<dyn ExecutionManager>,
    runner: Arc<dyn ResourceRunner>,
    loader: Arc<dyn PseudoLoader>,
    max_ncpus: usize,
    max_level: Option<u32>,
    verbose: u8,
    gating: AccuracyGating,
    work_root: PathBuf,
}

impl Dojo {
    /// Build a dojo over `masters`.
    ///
    /// Fails with [`DojoError::Registry`] when two masters share a level or
    /// the levels are not contiguous from 0.
    pub fn new(
        manager: Arc<dyn ExecutionManager>,
        runner: Arc<dyn ResourceRunner>,
        loader: Arc<dyn PseudoLoader>,
        mut masters: Vec<Arc<dyn Master>>,
    ) -> DojoResult<Self> {
        let kinds: Vec<TrialKind> = masters.iter().map(|m| m.kind()).collect();
        let registry = TrialRegistry::from_kinds(&kinds)?;
        masters.sort_by_key(|m| m.kind().level());

        tracing::debug!(levels = registry.kinds().len(), "Dojo registry validated");

        Ok(Self {
            registry,
            masters,
            manager,
            runner,
            loader,
            max_ncpus: 1,
            max_level: None,
            verbose: 0,
            gating: AccuracyGating::default(),
            work_root: PathBuf::from("."),
        })
    }

    #[must_use]
    pub fn with_max_ncpus(mut self, max_ncpus: usize) -> Self {
        self.max_ncpus = max_ncpus.max(1);
        self
    }

    #[must_use]
    pub fn with_max_level(mut self, max_level: Option<u32>) -> Self {
        self.max_level = max_level;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_accuracy_gating(mut self, gating: AccuracyGating) -> Self {
        self.gating = gating;
        self
    }

    #[must_use]
    pub fn with_work_root(mut self, work_root: impl Into<PathBuf>) -> Self {
        self.work_root = work_root.into();
        self
    }

    pub fn registry(&self) -> &TrialRegistry {
        &self.registry
    }

    /// Kinds run by [`challenge_pseudo`](Self::challenge_pseudo), bounded by
    /// `max_level`.
    pub fn active_kinds(&self) -> &[TrialKind] {
        self.registry.active(self.max_level)
    }

    pub fn describe_levels(&self) -> String {
        self.registry.describe()
    }

    /// Directory holding every trial work directory of `pseudo`.
    pub fn workdir_for(&self, pseudo: &dyn Pseudo) -> PathBuf {
        self.work_root.join(format!("DOJO_{}", pseudo.name()))
    }

    pub async fn resolve(&self, source: impl Into<PseudoSource>) -> DojoResult<Arc<dyn Pseudo>> {
        match source.into() {
            PseudoSource::Loaded(pseudo) => Ok(pseudo),
            PseudoSource::Path(path) => self.loader.load(&path).await,
        }
    }

    fn runner_for(&self, level: u32) -> DojoResult<TrialRunner> {
        let kind = self.registry.kind_for_level(level)?;
        let master = self
            .masters
            .iter()
            .find(|m| m.kind() == kind)
            .ok_or_else(|| DojoError::Registry(format!("No master registered for level {level}")))?;

        Ok(TrialRunner::new(
            Arc::clone(master),
            Arc::clone(&self.manager),
            Arc::clone(&self.runner),
        )
        .with_max_ncpus(self.max_ncpus)
        .with_verbose(self.verbose))
    }

    /// Run `source` through every active level it is eligible for.
    ///
    /// Returns `false` when a trial completed with captured exceptions, and
    /// `true` otherwise, including when no level was eligible.
    pub async fn challenge_pseudo(
        &self,
        source: impl Into<PseudoSource>,
        options: &TrainingOptions,
    ) -> DojoResult<bool> {
        Ok(self
            .challenge_pseudo_detailed(source, options)
            .await?
            .is_ok())
    }

    /// Same as [`challenge_pseudo`](Self::challenge_pseudo) but returns the
    /// per-trial measurements and skip reasons.
    pub async fn challenge_pseudo_detailed(
        &self,
        source: impl Into<PseudoSource>,
        options: &TrainingOptions,
    ) -> DojoResult<ProgressionSummary> {
        options.validate()?;
        let pseudo = self.resolve(source).await?;
        let root = self.workdir_for(pseudo.as_ref());
        let active = self.active_kinds();

        let started = Instant::now();
        let mut summary = ProgressionSummary::new(pseudo.name());

        tracing::info!(
            run_id = %summary.run_id,
            pseudo = pseudo.name(),
            levels = active.len(),
            accuracy = %options.accuracy,
            max_ncpus = self.max_ncpus,
            "Starting dojo progression"
        );

        for kind in active {
            let mut runner = self.runner_for(kind.level())?;
            let verdict = runner
                .accept_pseudo(&pseudo, &self.registry, options.accuracy, self.gating)
                .await?;

            if let Eligibility::Rejected(reason) = verdict {
                summary.skipped.push((*kind, reason));
                continue;
            }

            let measurement = runner.start_training(&root, options).await?;
            let ok = measurement.is_ok();
            summary.measurements.push(measurement);

            if !ok {
                tracing::warn!(
                    pseudo = pseudo.name(),
                    trial = %kind,
                    "Trial reported exceptions; stopping progression"
                );
                summary.halted_at = Some(*kind);
                break;
            }
        }

        tracing::info!(
            run_id = %summary.run_id,
            pseudo = pseudo.name(),
            trained = summary.measurements.len(),
            skipped = summary.skipped.len(),
            ok = summary.is_ok(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Dojo progression finished"
        );

        Ok(summary)
    }

    /// Train a single level again, bypassing the progression rule.
    ///
    /// Trial-specific gates still apply; `Ok(None)` is returned when one of
    /// them rejects the pseudo. Without `options.overwrite`, retraining a
    /// recorded accuracy fails with [`DojoError::OverwriteConflict`].
    pub async fn retrain(
        &self,
        source: impl Into<PseudoSource>,
        level: u32,
        options: &TrainingOptions,
    ) -> DojoResult<Option<TrainingMeasurement>> {
        options.validate()?;
        let pseudo = self.resolve(source).await?;
        let mut runner = self.runner_for(level)?;

        if let Eligibility::Rejected(reason) = runner.force_accept(&pseudo)? {
            tracing::info!(
                pseudo = pseudo.name(),
                level,
                reason = %reason,
                "Retrain rejected"
            );
            return Ok(None);
        }

        let root = self.workdir_for(pseudo.as_ref());
        runner.start_training(&root, options).await.map(Some)
    }

    /// Verdict of every active level against the current report, without
    /// training anything.
    pub async fn assess(
        &self,
        source: impl Into<PseudoSource>,
        accuracy: Accuracy,
    ) -> DojoResult<(DojoReport, Vec<LevelAssessment>)> {
        let pseudo = self.resolve(source).await?;
        let report = pseudo.read_dojo_report().await?;

        let mut verdicts = Vec::with_capacity(self.active_kinds().len());
        for kind in self.active_kinds() {
            let master = self
                .masters
                .iter()
                .find(|m| m.kind() == *kind)
                .ok_or_else(|| DojoError::Registry(format!("No master registered for {kind}")))?;
            let eligibility = eligibility::assess(&report, &self.registry, *kind, accuracy, self.gating)
                .and_then_gate(master.domain_gate(pseudo.as_ref()));
            verdicts.push(LevelAssessment {
                kind: *kind,
                eligibility,
            });
        }

        Ok((report, verdicts))
    }

    /// Current progression level of `report` under this dojo's registry.
    pub fn current_level(&self, report: &DojoReport) -> Option<u32> {
        eligibility::current_level(report, &self.registry)
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }
}
