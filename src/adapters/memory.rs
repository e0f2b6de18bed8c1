//! In-memory pseudopotentials for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DojoError, DojoResult};
use crate::domain::models::DojoReport;
use crate::domain::ports::{Pseudo, PseudoLoader};

/// Pseudo whose report lives in memory.
pub struct InMemoryPseudo {
    name: String,
    symbol: String,
    report: Arc<RwLock<DojoReport>>,
    writes: AtomicUsize,
}

impl InMemoryPseudo {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            report: Arc::new(RwLock::new(DojoReport::new())),
            writes: AtomicUsize::new(0),
        }
    }

    /// Seed the report without counting it as a write.
    #[must_use]
    pub fn with_report(self, report: DojoReport) -> Self {
        Self {
            report: Arc::new(RwLock::new(report)),
            ..self
        }
    }

    /// Snapshot of the current report.
    pub async fn report(&self) -> DojoReport {
        self.report.read().await.clone()
    }

    /// Number of times the report was written.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pseudo for InMemoryPseudo {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn read_dojo_report(&self) -> DojoResult<DojoReport> {
        Ok(self.report.read().await.clone())
    }

    async fn write_dojo_report(&self, report: &DojoReport) -> DojoResult<()> {
        let mut current = self.report.write().await;
        *current = report.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Loader resolving paths against a fixed set of registered pseudos.
#[derive(Default)]
pub struct InMemoryPseudoLoader {
    pseudos: HashMap<PathBuf, Arc<dyn Pseudo>>,
}

impl InMemoryPseudoLoader {
    #[must_use]
    pub fn with_pseudo(mut self, path: impl Into<PathBuf>, pseudo: Arc<dyn Pseudo>) -> Self {
        self.pseudos.insert(path.into(), pseudo);
        self
    }
}

#[async_trait]
impl PseudoLoader for InMemoryPseudoLoader {
    async fn load(&self, path: &Path) -> DojoResult<Arc<dyn Pseudo>> {
        self.pseudos
            .get(path)
            .cloned()
            .ok_or_else(|| DojoError::InvalidPseudo {
                path: path.to_path_buf(),
                reason: "not registered".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_replaces_report_and_counts() {
        let pseudo = InMemoryPseudo::new("O.psp8", "O");
        let report = DojoReport::new().with_entry("hints", "normal", json!({"ecut": 40.0}));

        pseudo.write_dojo_report(&report).await.unwrap();

        assert_eq!(pseudo.read_dojo_report().await.unwrap(), report);
        assert_eq!(pseudo.write_count(), 1);
    }

    #[tokio::test]
    async fn test_loader_returns_registered_pseudo() {
        let pseudo: Arc<dyn Pseudo> = Arc::new(InMemoryPseudo::new("O.psp8", "O"));
        let loader = InMemoryPseudoLoader::default().with_pseudo("O.psp8", pseudo);

        let loaded = loader.load(Path::new("O.psp8")).await.unwrap();
        assert_eq!(loaded.symbol(), "O");
    }
}
