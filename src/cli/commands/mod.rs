//! CLI command implementations.

pub mod challenge;
pub mod check;
pub mod inspect;
pub mod levels;
pub mod retrain;

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::filesystem::FilePseudoLoader;
use crate::adapters::refdata::{BirchMurnaghanDelta, JsonReferenceDatabase};
use crate::adapters::workflow::{CommandWorkflowFactory, LocalManager, LocalResourceRunner};
use crate::domain::models::{Accuracy, Config, ReferenceConfig};
use crate::services::{builtin_masters, Dojo};

/// Wire the default adapters into a [`Dojo`] configured from `config`.
pub async fn build_dojo(config: &Config) -> Result<Dojo> {
    let database = load_reference_database(&config.reference).await?;

    let masters = builtin_masters(
        Arc::new(CommandWorkflowFactory::new(config.workflows.hints.clone())),
        Arc::new(CommandWorkflowFactory::new(
            config.workflows.delta_factor.clone(),
        )),
        Arc::new(database),
        Arc::new(BirchMurnaghanDelta),
        config.reference.code.clone(),
    );

    let dojo = Dojo::new(
        Arc::new(LocalManager::default()),
        Arc::new(LocalResourceRunner::new()),
        Arc::new(FilePseudoLoader),
        masters,
    )
    .context("Invalid dojo level registry")?
    .with_max_ncpus(config.max_ncpus)
    .with_max_level(config.max_level)
    .with_verbose(config.verbose)
    .with_accuracy_gating(config.progression.accuracy_gating)
    .with_work_root(&config.work_root);

    Ok(dojo)
}

async fn load_reference_database(reference: &ReferenceConfig) -> Result<JsonReferenceDatabase> {
    let path = Path::new(&reference.database_path);
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tracing::warn!(
            path = %path.display(),
            "Reference database not found; delta factor trials will be rejected"
        );
        return Ok(JsonReferenceDatabase::default());
    }

    let database = JsonReferenceDatabase::load(path)
        .await
        .with_context(|| format!("Failed to load reference database {}", path.display()))?;
    tracing::debug!(path = %path.display(), elements = database.len(), "Reference database loaded");
    Ok(database)
}

pub fn parse_accuracy(value: &str) -> Result<Accuracy> {
    Accuracy::from_str(value)
        .ok_or_else(|| anyhow!("Invalid accuracy: {value}. Must be one of: low, normal, high"))
}
