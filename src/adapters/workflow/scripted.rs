//! Scripted workflows returning canned results.
//!
//! Used by tests and dry runs: every built work yields the next queued
//! [`RunResult`] and records the parameters it was built with.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::relocate_dir;
use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::RunResult;
use crate::domain::ports::{ExecutionManager, Pseudo, Work, WorkParams, WorkflowFactory};

pub struct ScriptedWorkflowFactory {
    results: Mutex<VecDeque<RunResult>>,
    calls: Mutex<Vec<WorkParams>>,
    jobs_per_work: usize,
    job_runs: Arc<AtomicUsize>,
}

impl ScriptedWorkflowFactory {
    pub fn new(results: Vec<RunResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
            jobs_per_work: 1,
            job_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn with_jobs_per_work(mut self, jobs: usize) -> Self {
        self.jobs_per_work = jobs;
        self
    }

    /// Parameters of every work built so far.
    pub fn calls(&self) -> Vec<WorkParams> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Results not consumed yet.
    pub fn remaining(&self) -> usize {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Jobs executed across all works.
    pub fn job_runs(&self) -> usize {
        self.job_runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowFactory for ScriptedWorkflowFactory {
    async fn work_for_pseudo(
        &self,
        workdir: &Path,
        _manager: &Arc<dyn ExecutionManager>,
        _pseudo: &dyn Pseudo,
        params: WorkParams,
    ) -> DojoResult<Box<dyn Work>> {
        let result = self
            .results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| DojoError::Workflow("no scripted result left".to_string()))?;

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(params);

        Ok(Box::new(ScriptedWork {
            workdir: workdir.to_path_buf(),
            result,
            jobs: self.jobs_per_work,
            job_runs: Arc::clone(&self.job_runs),
            started: false,
        }))
    }
}

pub struct ScriptedWork {
    workdir: PathBuf,
    result: RunResult,
    jobs: usize,
    job_runs: Arc<AtomicUsize>,
    started: bool,
}

#[async_trait]
impl Work for ScriptedWork {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn job_count(&self) -> usize {
        self.jobs
    }

    async fn run_job(&self, index: usize) -> DojoResult<i32> {
        if index >= self.jobs {
            return Err(DojoError::Workflow(format!("no job with index {index}")));
        }
        tokio::fs::create_dir_all(&self.workdir).await?;
        self.job_runs.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn start(&mut self) -> DojoResult<()> {
        tokio::fs::create_dir_all(&self.workdir).await?;
        for _ in 0..self.jobs {
            self.job_runs.fetch_add(1, Ordering::SeqCst);
        }
        self.started = true;
        Ok(())
    }

    async fn wait(&mut self) -> DojoResult<Vec<i32>> {
        if !self.started {
            return Err(DojoError::Workflow("work was not started".to_string()));
        }
        Ok(vec![0; self.jobs])
    }

    async fn results(&self) -> DojoResult<RunResult> {
        Ok(self.result.clone())
    }

    async fn relocate(&mut self, name: &str) -> DojoResult<()> {
        self.workdir = relocate_dir(&self.workdir, name).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPseudo;
    use crate::adapters::workflow::LocalManager;
    use crate::domain::models::Accuracy;

    fn params() -> WorkParams {
        WorkParams::DeltaFactor {
            accuracy: Accuracy::Normal,
            kppa: 6750,
            ecut: None,
        }
    }

    #[tokio::test]
    async fn test_results_are_served_in_order() {
        let factory = ScriptedWorkflowFactory::new(vec![
            RunResult::default().with_exception("first"),
            RunResult::default(),
        ]);
        let manager: Arc<dyn ExecutionManager> = Arc::new(LocalManager::default());
        let pseudo = InMemoryPseudo::new("Si.psp8", "Si");
        let dir = tempfile::tempdir().unwrap();

        let first = factory
            .work_for_pseudo(dir.path(), &manager, &pseudo, params())
            .await
            .unwrap();
        assert!(first.results().await.unwrap().has_exceptions());
        assert_eq!(factory.remaining(), 1);
        assert_eq!(factory.calls(), vec![params()]);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_a_workflow_error() {
        let factory = ScriptedWorkflowFactory::new(vec![]);
        let manager: Arc<dyn ExecutionManager> = Arc::new(LocalManager::default());
        let pseudo = InMemoryPseudo::new("Si.psp8", "Si");

        let result = factory
            .work_for_pseudo(Path::new("unused"), &manager, &pseudo, params())
            .await;
        assert!(matches!(result, Err(DojoError::Workflow(_))));
    }

    #[tokio::test]
    async fn test_wait_before_start_fails() {
        let factory = ScriptedWorkflowFactory::new(vec![RunResult::default()]);
        let manager: Arc<dyn ExecutionManager> = Arc::new(LocalManager::default());
        let pseudo = InMemoryPseudo::new("Si.psp8", "Si");
        let dir = tempfile::tempdir().unwrap();

        let mut work = factory
            .work_for_pseudo(dir.path(), &manager, &pseudo, params())
            .await
            .unwrap();
        assert!(work.wait().await.is_err());
    }
}
