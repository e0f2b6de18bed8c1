//! Pseudopotential files on disk with a JSON report sidecar.
//!
//! The report of `Si.psp8` lives in `Si.psp8.djrepo` next to it. A missing
//! sidecar is an untested pseudo.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::DojoReport;
use crate::domain::ports::{Pseudo, PseudoLoader};

pub const REPORT_EXTENSION: &str = "djrepo";

#[derive(Debug, Clone)]
pub struct FilePseudo {
    path: PathBuf,
    name: String,
    symbol: String,
    report_path: PathBuf,
}

impl FilePseudo {
    /// Describe the pseudo at `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> DojoResult<Self> {
        let path = path.into();
        let invalid = |reason: &str| DojoError::InvalidPseudo {
            path: path.clone(),
            reason: reason.to_string(),
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid("file name is not valid UTF-8"))?
            .to_string();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| invalid("file name is not valid UTF-8"))?;
        let symbol = symbol_from_stem(stem)
            .ok_or_else(|| invalid("file name does not start with an element symbol"))?;

        let mut report_path = OsString::from(path.as_os_str());
        report_path.push(".");
        report_path.push(REPORT_EXTENSION);

        Ok(Self {
            name,
            symbol,
            report_path: PathBuf::from(report_path),
            path,
        })
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}

/// Element symbol encoded at the start of a file stem: an uppercase letter,
/// optionally followed by a lowercase one (`Si-sp` -> `Si`, `O_high` -> `O`).
pub fn symbol_from_stem(stem: &str) -> Option<String> {
    let mut chars = stem.chars();
    let first = chars.next().filter(char::is_ascii_alphabetic)?;
    let mut symbol = first.to_ascii_uppercase().to_string();
    if let Some(second) = chars.next().filter(char::is_ascii_lowercase) {
        symbol.push(second);
    }
    Some(symbol)
}

#[async_trait]
impl Pseudo for FilePseudo {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    async fn read_dojo_report(&self) -> DojoResult<DojoReport> {
        match tokio::fs::read(&self.report_path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(DojoReport::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_dojo_report(&self, report: &DojoReport) -> DojoResult<()> {
        let mut tmp = OsString::from(self.report_path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, serde_json::to_vec_pretty(report)?).await?;
        tokio::fs::rename(&tmp, &self.report_path).await?;

        tracing::debug!(path = %self.report_path.display(), "Dojo report written");
        Ok(())
    }
}

/// Loads [`FilePseudo`]s, requiring the pseudopotential file to exist.
#[derive(Debug, Clone, Default)]
pub struct FilePseudoLoader;

#[async_trait]
impl PseudoLoader for FilePseudoLoader {
    async fn load(&self, path: &Path) -> DojoResult<Arc<dyn Pseudo>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(Arc::new(FilePseudo::new(path)?)),
            Ok(_) => Err(DojoError::InvalidPseudo {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            }),
            Err(err) => Err(DojoError::InvalidPseudo {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }),
        }
    }
}
