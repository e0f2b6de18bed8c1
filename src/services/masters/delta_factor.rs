//! Level 1 master: equation-of-state fit scored against reference data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::traits::{ChallengeContext, Master};
use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::{
    EosParameters, ReportFragment, RunResult, TrainingOptions, TrialKind, EXCEPTIONS_FIELD,
};
use crate::domain::ports::{DeltaEstimator, Pseudo, ReferenceDatabase, WorkParams, WorkflowFactory};

/// Raw results dumped next to the work for offline inspection.
pub const RESULTS_FILE: &str = "dojo_results.json";

pub struct DeltaFactorMaster {
    factory: Arc<dyn WorkflowFactory>,
    database: Arc<dyn ReferenceDatabase>,
    estimator: Arc<dyn DeltaEstimator>,
    reference_code: String,
}

impl DeltaFactorMaster {
    pub fn new(
        factory: Arc<dyn WorkflowFactory>,
        database: Arc<dyn ReferenceDatabase>,
        estimator: Arc<dyn DeltaEstimator>,
        reference_code: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            database,
            estimator,
            reference_code: reference_code.into(),
        }
    }

    fn measured_eos(&self, results: &RunResult) -> DojoResult<EosParameters> {
        let kind = self.kind();
        Ok(EosParameters {
            v0: results.number(kind, "v0")?,
            b0_gpa: results.number(kind, "b0_GPa")?,
            b1: results.number(kind, "b1")?,
        })
    }
}

#[async_trait]
impl Master for DeltaFactorMaster {
    fn kind(&self) -> TrialKind {
        TrialKind::DeltaFactor
    }

    fn workdir(&self, root: &Path, options: &TrainingOptions) -> PathBuf {
        root.join(format!(
            "LEVEL_{}_ACC_{}",
            self.kind().level(),
            options.accuracy
        ))
    }

    fn domain_gate(&self, pseudo: &dyn Pseudo) -> Option<String> {
        if self.database.has_symbol(pseudo.symbol()) {
            None
        } else {
            Some(format!("no reference data for element {}", pseudo.symbol()))
        }
    }

    async fn challenge(
        &self,
        ctx: &ChallengeContext<'_>,
        pseudo: &dyn Pseudo,
        options: &TrainingOptions,
    ) -> DojoResult<RunResult> {
        let workdir = self.workdir(ctx.root, options);

        if ctx.verbose > 0 {
            tracing::info!(
                master = self.name(),
                pseudo = pseudo.name(),
                accuracy = %options.accuracy,
                kppa = options.kppa,
                max_ncpus = ctx.max_ncpus,
                manager = %ctx.manager.describe(),
                "Running delta_factor calculation"
            );
        }

        let work = self
            .factory
            .work_for_pseudo(
                &workdir,
                ctx.manager,
                pseudo,
                WorkParams::DeltaFactor {
                    accuracy: options.accuracy,
                    kppa: options.kppa,
                    ecut: None,
                },
            )
            .await?;

        let retcodes = ctx.runner.run(work.as_ref(), ctx.max_ncpus).await?;
        tracing::debug!(master = self.name(), ?retcodes, "Delta factor work complete");

        let results = work.results().await?;

        tokio::fs::create_dir_all(work.workdir()).await?;
        let dump = work.workdir().join(RESULTS_FILE);
        tokio::fs::write(&dump, serde_json::to_vec_pretty(&results)?).await?;

        Ok(results)
    }

    fn synthesize_report(
        &self,
        pseudo: &dyn Pseudo,
        results: &RunResult,
        options: &TrainingOptions,
    ) -> DojoResult<ReportFragment> {
        let reference = self
            .database
            .get_entry(pseudo.symbol(), &self.reference_code)
            .ok_or_else(|| DojoError::MissingReference {
                symbol: pseudo.symbol().to_string(),
                code: self.reference_code.clone(),
            })?;

        let mut fields = Map::new();
        match self.measured_eos(results) {
            Ok(measured) => {
                let dfact = self.estimator.delta(&reference.eos(), &measured);
                tracing::info!(
                    pseudo = pseudo.name(),
                    accuracy = %options.accuracy,
                    "Deltafactor = {dfact:.3} meV"
                );
                fields.insert("v0".to_string(), Value::from(measured.v0));
                fields.insert("b0_GPa".to_string(), Value::from(measured.b0_gpa));
                fields.insert("b1".to_string(), Value::from(measured.b1));
                fields.insert("dfact".to_string(), Value::from(dfact));
            }
            Err(err) if results.has_exceptions() => {
                tracing::warn!(pseudo = pseudo.name(), error = %err, "No EOS fit available");
            }
            Err(err) => return Err(err),
        }

        if results.has_exceptions() {
            fields.insert(
                EXCEPTIONS_FIELD.to_string(),
                Value::String(results.exceptions_marker()),
            );
        }

        Ok(ReportFragment::new(self.kind().key())
            .with_entry(options.accuracy.as_str(), Value::Object(fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPseudo;
    use crate::adapters::refdata::{BirchMurnaghanDelta, JsonReferenceDatabase};
    use crate::adapters::workflow::{LocalManager, LocalResourceRunner, ScriptedWorkflowFactory};
    use crate::domain::models::{Accuracy, ReferenceEntry};
    use crate::domain::ports::ExecutionManager;
    use serde_json::json;

    fn database() -> Arc<JsonReferenceDatabase> {
        Arc::new(JsonReferenceDatabase::from_entries([(
            "Si",
            "WIEN2k",
            ReferenceEntry {
                v0: 20.446,
                b0: 0.5542,
                b0_gpa: 88.790,
                b1: 4.296,
            },
        )]))
    }

    fn master(factory: Arc<ScriptedWorkflowFactory>) -> DeltaFactorMaster {
        DeltaFactorMaster::new(factory, database(), Arc::new(BirchMurnaghanDelta), "WIEN2k")
    }

    fn eos_result() -> RunResult {
        RunResult::from_value(json!({"v0": 20.55, "b0_GPa": 88.846, "b1": 4.329}))
    }

    #[test]
    fn test_workdir_includes_accuracy() {
        let master = master(Arc::new(ScriptedWorkflowFactory::new(vec![])));
        let options = TrainingOptions::default().with_accuracy(Accuracy::High);
        assert_eq!(
            master.workdir(Path::new("DOJO_Si"), &options),
            PathBuf::from("DOJO_Si/LEVEL_1_ACC_high")
        );
    }

    #[test]
    fn test_domain_gate_requires_reference_symbol() {
        let master = master(Arc::new(ScriptedWorkflowFactory::new(vec![])));
        assert!(master.domain_gate(&InMemoryPseudo::new("Si.psp8", "Si")).is_none());
        let detail = master
            .domain_gate(&InMemoryPseudo::new("Og.psp8", "Og"))
            .unwrap();
        assert!(detail.contains("Og"));
    }

    #[test]
    fn test_synthesize_computes_dfact() {
        let master = master(Arc::new(ScriptedWorkflowFactory::new(vec![])));
        let pseudo = InMemoryPseudo::new("Si.psp8", "Si");

        let fragment = master
            .synthesize_report(&pseudo, &eos_result(), &TrainingOptions::default())
            .unwrap();

        assert_eq!(fragment.key, "delta_factor");
        let entry = &fragment.entries["normal"];
        let dfact = entry["dfact"].as_f64().unwrap();
        assert!((dfact - 2.0265).abs() < 1e-3, "dfact = {dfact}");
        assert_eq!(entry["b0_GPa"], json!(88.846));
        assert!(entry.get(EXCEPTIONS_FIELD).is_none());
    }

    #[test]
    fn test_synthesize_keeps_exceptions_without_fit() {
        let master = master(Arc::new(ScriptedWorkflowFactory::new(vec![])));
        let pseudo = InMemoryPseudo::new("Si.psp8", "Si");
        let results = RunResult::default().with_exception("eos fit failed");

        let fragment = master
            .synthesize_report(&pseudo, &results, &TrainingOptions::default())
            .unwrap();

        let entry = &fragment.entries["normal"];
        assert!(entry.get("dfact").is_none());
        assert_eq!(entry[EXCEPTIONS_FIELD], json!("[\"eos fit failed\"]"));
    }

    #[test]
    fn test_synthesize_missing_reference_is_error() {
        let master = master(Arc::new(ScriptedWorkflowFactory::new(vec![])));
        let pseudo = InMemoryPseudo::new("Ge.psp8", "Ge");

        let err = master
            .synthesize_report(&pseudo, &eos_result(), &TrainingOptions::default())
            .unwrap_err();
        assert!(matches!(err, DojoError::MissingReference { symbol, .. } if symbol == "Ge"));
    }

    #[tokio::test]
    async fn test_challenge_dumps_raw_results() {
        let root = tempfile::tempdir().unwrap();
        let factory = Arc::new(ScriptedWorkflowFactory::new(vec![eos_result()]));
        let master = master(factory.clone());
        let pseudo = InMemoryPseudo::new("Si.psp8", "Si");
        let manager: Arc<dyn ExecutionManager> = Arc::new(LocalManager::default());
        let runner = LocalResourceRunner::new();
        let ctx = ChallengeContext {
            root: root.path(),
            manager: &manager,
            runner: &runner,
            max_ncpus: 1,
            verbose: 1,
        };

        let results = master
            .challenge(&ctx, &pseudo, &TrainingOptions::default())
            .await
            .unwrap();

        assert_eq!(results, eos_result());
        assert_eq!(
            factory.calls(),
            vec![WorkParams::DeltaFactor {
                accuracy: Accuracy::Normal,
                kppa: 6750,
                ecut: None,
            }]
        );
        let dump = root.path().join("LEVEL_1_ACC_normal").join(RESULTS_FILE);
        let written: RunResult =
            serde_json::from_slice(&std::fs::read(dump).unwrap()).unwrap();
        assert_eq!(written, eos_result());
    }
}
