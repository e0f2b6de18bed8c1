//! Common test utilities for integration tests
//!
//! Builds dojos over scripted workflows and in-memory pseudopotentials so
//! progression scenarios run without external programs.

#![allow(dead_code)]

use std::sync::Arc;

use pseudo_dojo::adapters::memory::{InMemoryPseudo, InMemoryPseudoLoader};
use pseudo_dojo::adapters::refdata::{BirchMurnaghanDelta, JsonReferenceDatabase};
use pseudo_dojo::adapters::workflow::{LocalManager, LocalResourceRunner, ScriptedWorkflowFactory};
use pseudo_dojo::domain::models::ReferenceEntry;
use pseudo_dojo::services::builtin_masters;
use pseudo_dojo::{Dojo, Pseudo, RunResult};
use serde_json::json;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Reference database holding silicon only
pub fn silicon_reference() -> JsonReferenceDatabase {
    JsonReferenceDatabase::from_entries([(
        "Si",
        "WIEN2k",
        ReferenceEntry {
            v0: 20.446,
            b0: 0.5542,
            b0_gpa: 88.790,
            b1: 4.296,
        },
    )])
}

/// Result of a hints scan with the given cutoffs per tier
pub fn hints_result(low: f64, normal: f64, high: f64) -> RunResult {
    RunResult::from_value(json!({
        "low": {"ecut": low, "etotal": -10.1},
        "normal": {"ecut": normal, "etotal": -10.2},
        "high": {"ecut": high, "etotal": -10.3},
    }))
}

/// Result of an equation-of-state fit close to the silicon reference
pub fn eos_result() -> RunResult {
    RunResult::from_value(json!({"v0": 20.55, "b0_GPa": 88.846, "b1": 4.329}))
}

/// A complete, successful hints run: iterative scan followed by the dense scan
pub fn hints_run() -> Vec<RunResult> {
    vec![hints_result(15.0, 22.0, 30.0), hints_result(16.0, 23.0, 31.0)]
}

/// Test fixture bundling a dojo with the scripted factories behind it
pub struct Fixture {
    pub dojo: Dojo,
    pub hints: Arc<ScriptedWorkflowFactory>,
    pub delta: Arc<ScriptedWorkflowFactory>,
    pub work_root: TempDir,
}

impl Fixture {
    pub fn new(hints: Vec<RunResult>, delta: Vec<RunResult>) -> Self {
        Self::with_loader(hints, delta, InMemoryPseudoLoader::default())
    }

    pub fn with_loader(
        hints: Vec<RunResult>,
        delta: Vec<RunResult>,
        loader: InMemoryPseudoLoader,
    ) -> Self {
        let hints = Arc::new(ScriptedWorkflowFactory::new(hints));
        let delta = Arc::new(ScriptedWorkflowFactory::new(delta));
        let work_root = temp_dir();

        let masters = builtin_masters(
            hints.clone(),
            delta.clone(),
            Arc::new(silicon_reference()),
            Arc::new(BirchMurnaghanDelta),
            "WIEN2k",
        );

        let dojo = Dojo::new(
            Arc::new(LocalManager::default()),
            Arc::new(LocalResourceRunner::new()),
            Arc::new(loader),
            masters,
        )
        .expect("Failed to build dojo")
        .with_max_ncpus(2)
        .with_work_root(work_root.path());

        Self {
            dojo,
            hints,
            delta,
            work_root,
        }
    }
}

/// In-memory pseudo plus the trait object handed to the dojo
pub fn pseudo(name: &str, symbol: &str) -> (Arc<InMemoryPseudo>, Arc<dyn Pseudo>) {
    let pseudo = Arc::new(InMemoryPseudo::new(name, symbol));
    let source: Arc<dyn Pseudo> = pseudo.clone();
    (pseudo, source)
}

/// Same as [`pseudo`] but starting from an existing report
pub fn seeded_pseudo(
    name: &str,
    symbol: &str,
    report: pseudo_dojo::DojoReport,
) -> (Arc<InMemoryPseudo>, Arc<dyn Pseudo>) {
    let pseudo = Arc::new(InMemoryPseudo::new(name, symbol).with_report(report));
    let source: Arc<dyn Pseudo> = pseudo.clone();
    (pseudo, source)
}
