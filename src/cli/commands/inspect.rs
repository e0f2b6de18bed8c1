//! `inspect` command: dump the dojo report of a pseudopotential.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use super::build_dojo;
use crate::cli::display::{list_table, render_list, status_cell};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, DojoReport, EXCEPTIONS_FIELD};

#[derive(Debug, Serialize)]
pub struct EntryOutput {
    pub key: String,
    pub accuracy: String,
    pub ok: bool,
    pub fields: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub pseudo: String,
    pub symbol: String,
    pub current_level: Option<u32>,
    pub entries: Vec<EntryOutput>,
}

impl InspectOutput {
    pub fn new(
        pseudo: &str,
        symbol: &str,
        current_level: Option<u32>,
        report: &DojoReport,
    ) -> Self {
        let mut entries = Vec::new();
        for key in report.keys() {
            if let Some(trial) = report.trial(key) {
                for (accuracy, fields) in trial {
                    entries.push(EntryOutput {
                        key: key.to_string(),
                        accuracy: accuracy.clone(),
                        ok: fields.get(EXCEPTIONS_FIELD).is_none(),
                        fields: fields.clone(),
                    });
                }
            }
        }

        Self {
            pseudo: pseudo.to_string(),
            symbol: symbol.to_string(),
            current_level,
            entries,
        }
    }
}

impl CommandOutput for InspectOutput {
    fn to_human(&self) -> String {
        let level = self
            .current_level
            .map_or_else(|| "untested".to_string(), |l| l.to_string());
        let header = format!("Pseudo: {} ({})\nDojo level: {level}\n", self.pseudo, self.symbol);

        let mut table = list_table(&["key", "accuracy", "status", "fields"]);
        for entry in &self.entries {
            table.add_row(vec![
                entry.key.clone(),
                entry.accuracy.clone(),
                status_cell(entry.ok, if entry.ok { "ok" } else { "exceptions" }),
                truncate(&entry.fields.to_string(), 60),
            ]);
        }

        format!("{header}{}", render_list("entry", table, self.entries.len()))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(pseudo: PathBuf, config: &Config, json_mode: bool) -> Result<()> {
    let dojo = build_dojo(config).await?;
    let pseudo = dojo
        .resolve(pseudo.clone())
        .await
        .with_context(|| format!("Failed to load {}", pseudo.display()))?;
    let report = pseudo.read_dojo_report().await?;

    output(
        &InspectOutput::new(
            pseudo.name(),
            pseudo.symbol(),
            dojo.current_level(&report),
            &report,
        ),
        json_mode,
    );
    Ok(())
}
