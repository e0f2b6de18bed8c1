//! Pseudopotential port.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::DojoResult;
use crate::domain::models::DojoReport;

/// A pseudopotential together with its persisted dojo report.
///
/// File-format parsing is out of scope; implementations only need to expose
/// identity and read/write the report.
#[async_trait]
pub trait Pseudo: Send + Sync {
    /// Name used in diagnostics and work directory names.
    fn name(&self) -> &str;

    /// Chemical symbol of the element.
    fn symbol(&self) -> &str;

    /// Location of the pseudopotential file, when it lives on disk.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Read the report as currently persisted.
    async fn read_dojo_report(&self) -> DojoResult<DojoReport>;

    /// Replace the persisted report.
    async fn write_dojo_report(&self, report: &DojoReport) -> DojoResult<()>;
}

impl fmt::Debug for dyn Pseudo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pseudo")
            .field("name", &self.name())
            .field("symbol", &self.symbol())
            .finish()
    }
}

/// Builds pseudopotential objects from file paths.
#[async_trait]
pub trait PseudoLoader: Send + Sync {
    async fn load(&self, path: &Path) -> DojoResult<Arc<dyn Pseudo>>;
}

/// Either a path still to be loaded or an already loaded pseudo.
#[derive(Clone)]
pub enum PseudoSource {
    Path(PathBuf),
    Loaded(Arc<dyn Pseudo>),
}

impl From<PathBuf> for PseudoSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for PseudoSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Arc<dyn Pseudo>> for PseudoSource {
    fn from(pseudo: Arc<dyn Pseudo>) -> Self {
        Self::Loaded(pseudo)
    }
}
