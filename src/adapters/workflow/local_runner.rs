//! In-process execution: a trivial manager and a semaphore-bounded runner.

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::ports::{ExecutionManager, ResourceRunner, Work};

/// Manager for jobs run on the local host.
#[derive(Debug, Clone)]
pub struct LocalManager {
    pub host: String,
}

impl Default for LocalManager {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
        }
    }
}

impl ExecutionManager for LocalManager {
    fn describe(&self) -> String {
        format!("local({})", self.host)
    }
}

/// Runs the jobs of a work concurrently, at most `max_ncpus` at a time.
#[derive(Debug, Clone, Default)]
pub struct LocalResourceRunner;

impl LocalResourceRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResourceRunner for LocalResourceRunner {
    async fn run(&self, work: &dyn Work, max_ncpus: usize) -> DojoResult<Vec<i32>> {
        let permits = Semaphore::new(max_ncpus.max(1));
        let permits = &permits;

        tracing::debug!(
            workdir = %work.workdir().display(),
            jobs = work.job_count(),
            max_ncpus,
            "Running work"
        );

        let jobs = (0..work.job_count()).map(|index| async move {
            let _permit = permits
                .acquire()
                .await
                .map_err(|e| DojoError::Workflow(e.to_string()))?;
            work.run_job(index).await
        });

        join_all(jobs).await.into_iter().collect()
    }
}
