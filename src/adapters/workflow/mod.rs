//! Workflow factories and resource runners.

pub mod command;
pub mod local_runner;
pub mod scripted;

pub use command::{CommandWork, CommandWorkflowFactory};
pub use local_runner::{LocalManager, LocalResourceRunner};
pub use scripted::{ScriptedWork, ScriptedWorkflowFactory};

use std::path::{Path, PathBuf};

use crate::domain::errors::DojoResult;

/// Move `workdir` to a sibling directory called `name`, replacing any
/// previous one, and return the new location.
pub(crate) async fn relocate_dir(workdir: &Path, name: &str) -> DojoResult<PathBuf> {
    let dest = workdir
        .parent()
        .map_or_else(|| PathBuf::from(name), |parent| parent.join(name));

    if tokio::fs::try_exists(&dest).await? {
        tokio::fs::remove_dir_all(&dest).await?;
    }
    if tokio::fs::try_exists(workdir).await? {
        tokio::fs::rename(workdir, &dest).await?;
    }

    tracing::debug!(from = %workdir.display(), to = %dest.display(), "Work relocated");
    Ok(dest)
}
