//! Workflows executed by an external program.
//!
//! Each work runs the configured program once in its work directory. The
//! trial parameters are written to `params.json`; the program writes its
//! results as a JSON object to the configured results file. A top-level
//! `_exceptions` array in that object is treated as captured failures.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::relocate_dir;
use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::{CommandConfig, RunResult, EXCEPTIONS_FIELD};
use crate::domain::ports::{ExecutionManager, Pseudo, Work, WorkParams, WorkflowFactory};

pub const PARAMS_FILE: &str = "params.json";
const STDOUT_LOG: &str = "stdout.log";
const STDERR_LOG: &str = "stderr.log";

pub struct CommandWorkflowFactory {
    config: CommandConfig,
}

impl CommandWorkflowFactory {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl WorkflowFactory for CommandWorkflowFactory {
    async fn work_for_pseudo(
        &self,
        workdir: &Path,
        manager: &Arc<dyn ExecutionManager>,
        pseudo: &dyn Pseudo,
        params: WorkParams,
    ) -> DojoResult<Box<dyn Work>> {
        if !self.config.is_configured() {
            return Err(DojoError::Workflow(
                "no workflow program configured".to_string(),
            ));
        }

        let pseudo_path = match pseudo.path() {
            Some(path) => Some(
                tokio::fs::canonicalize(path)
                    .await
                    .unwrap_or_else(|_| path.to_path_buf()),
            ),
            None => None,
        };

        let spec = CommandSpec {
            program: self.config.program.clone(),
            args: self.config.args.clone(),
            results_file: self.config.results_file.clone(),
            pseudo_name: pseudo.name().to_string(),
            symbol: pseudo.symbol().to_string(),
            pseudo_path,
            manager: manager.describe(),
            params,
        };

        Ok(Box::new(CommandWork {
            spec: Arc::new(spec),
            workdir: workdir.to_path_buf(),
            exit_code: Arc::new(Mutex::new(None)),
            handle: None,
        }))
    }
}

struct CommandSpec {
    program: String,
    args: Vec<String>,
    results_file: String,
    pseudo_name: String,
    symbol: String,
    pseudo_path: Option<PathBuf>,
    manager: String,
    params: WorkParams,
}

impl CommandSpec {
    async fn execute(&self, workdir: &Path, exit_code: &Mutex<Option<i32>>) -> DojoResult<i32> {
        tokio::fs::create_dir_all(workdir).await?;
        tokio::fs::write(
            workdir.join(PARAMS_FILE),
            serde_json::to_vec_pretty(&self.params)?,
        )
        .await?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(PARAMS_FILE)
            .current_dir(workdir)
            .env("DOJO_PSEUDO", &self.pseudo_name)
            .env("DOJO_SYMBOL", &self.symbol)
            .env("DOJO_PARAMS", PARAMS_FILE)
            .env("DOJO_RESULTS", &self.results_file)
            .env("DOJO_MANAGER", &self.manager)
            .stdin(Stdio::null());
        if let Some(path) = &self.pseudo_path {
            cmd.env("DOJO_PSEUDO_PATH", path);
        }

        tracing::debug!(
            program = %self.program,
            workdir = %workdir.display(),
            "Launching workflow program"
        );

        let output = cmd.output().await.map_err(|e| {
            DojoError::Workflow(format!("failed to launch {}: {e}", self.program))
        })?;

        tokio::fs::write(workdir.join(STDOUT_LOG), &output.stdout).await?;
        tokio::fs::write(workdir.join(STDERR_LOG), &output.stderr).await?;

        // Killed by a signal.
        let code = output.status.code().unwrap_or(-1);
        *exit_code.lock().await = Some(code);

        if code != 0 {
            tracing::warn!(program = %self.program, code, "Workflow program exited with failure");
        }
        Ok(code)
    }
}

pub struct CommandWork {
    spec: Arc<CommandSpec>,
    workdir: PathBuf,
    exit_code: Arc<Mutex<Option<i32>>>,
    handle: Option<JoinHandle<DojoResult<i32>>>,
}

#[async_trait]
impl Work for CommandWork {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn job_count(&self) -> usize {
        1
    }

    async fn run_job(&self, index: usize) -> DojoResult<i32> {
        if index != 0 {
            return Err(DojoError::Workflow(format!("no job with index {index}")));
        }
        self.spec.execute(&self.workdir, &self.exit_code).await
    }

    async fn start(&mut self) -> DojoResult<()> {
        let spec = Arc::clone(&self.spec);
        let workdir = self.workdir.clone();
        let exit_code = Arc::clone(&self.exit_code);
        self.handle = Some(tokio::spawn(async move {
            spec.execute(&workdir, &exit_code).await
        }));
        Ok(())
    }

    async fn wait(&mut self) -> DojoResult<Vec<i32>> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| DojoError::Workflow("work was not started".to_string()))?;
        let code = handle
            .await
            .map_err(|e| DojoError::Workflow(format!("workflow task failed: {e}")))??;
        Ok(vec![code])
    }

    async fn results(&self) -> DojoResult<RunResult> {
        let path = self.workdir.join(&self.spec.results_file);
        let mut result = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => RunResult::from_value(value),
                Err(e) => RunResult::default()
                    .with_exception(format!("unreadable results in {}: {e}", path.display())),
            },
            Err(e) => RunResult::default()
                .with_exception(format!("missing results file {}: {e}", path.display())),
        };

        if let Some(Value::Array(items)) = result.payload.remove(EXCEPTIONS_FIELD) {
            for item in items {
                result.exceptions.push(match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                });
            }
        }

        if let Some(code) = *self.exit_code.lock().await {
            if code != 0 {
                result
                    .exceptions
                    .push(format!("{} exited with status {code}", self.spec.program));
            }
        }

        Ok(result)
    }

    async fn relocate(&mut self, name: &str) -> DojoResult<()> {
        self.workdir = relocate_dir(&self.workdir, name).await?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPseudo;
    use crate::adapters::workflow::LocalManager;
    use crate::domain::models::Accuracy;

    fn shell(script: &str) -> CommandConfig {
        CommandConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "dojo".to_string()],
            results_file: "results.json".to_string(),
        }
    }

    fn params() -> WorkParams {
        WorkParams::DeltaFactor {
            accuracy: Accuracy::High,
            kppa: 6750,
            ecut: None,
        }
    }

    async fn build(config: CommandConfig, workdir: &Path) -> Box<dyn Work> {
        let manager: Arc<dyn ExecutionManager> = Arc::new(LocalManager::default());
        CommandWorkflowFactory::new(config)
            .work_for_pseudo(workdir, &manager, &InMemoryPseudo::new("Si.psp8", "Si"), params())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_factory_fails() {
        let manager: Arc<dyn ExecutionManager> = Arc::new(LocalManager::default());
        let result = CommandWorkflowFactory::new(CommandConfig::default())
            .work_for_pseudo(
                Path::new("unused"),
                &manager,
                &InMemoryPseudo::new("Si.psp8", "Si"),
                params(),
            )
            .await;
        assert!(matches!(result, Err(DojoError::Workflow(_))));
    }

    #[tokio::test]
    async fn test_program_results_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().join("LEVEL_1_ACC_high");
        let work = build(
            shell(r#"echo "{\"v0\": 20.5, \"symbol\": \"$DOJO_SYMBOL\"}" > "$DOJO_RESULTS""#),
            &workdir,
        )
        .await;

        let codes = work.run_job(0).await.unwrap();
        let result = work.results().await.unwrap();

        assert_eq!(codes, 0);
        assert!(!result.has_exceptions());
        assert_eq!(result.get("symbol"), Some(&Value::from("Si")));
        assert!(workdir.join(PARAMS_FILE).exists());
    }

    #[tokio::test]
    async fn test_failing_program_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let mut work = build(shell("exit 3"), &dir.path().join("w")).await;

        work.start().await.unwrap();
        let codes = work.wait().await.unwrap();
        let result = work.results().await.unwrap();

        assert_eq!(codes, vec![3]);
        assert_eq!(result.exceptions.len(), 2);
        assert!(result.exceptions[1].contains("status 3"));
    }

    #[tokio::test]
    async fn test_reported_exceptions_are_lifted() {
        let dir = tempfile::tempdir().unwrap();
        let work = build(
            shell(r#"echo '{"low": {"ecut": 12}, "_exceptions": ["scf diverged"]}' > results.json"#),
            &dir.path().join("w"),
        )
        .await;

        work.run_job(0).await.unwrap();
        let result = work.results().await.unwrap();

        assert_eq!(result.exceptions, vec!["scf diverged".to_string()]);
        assert!(result.get(EXCEPTIONS_FIELD).is_none());
    }
}
