//! `levels` command.

use anyhow::Result;
use serde::Serialize;

use crate::cli::display::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, TrialRegistry};

#[derive(Debug, Serialize)]
pub struct LevelOutput {
    pub level: u32,
    pub key: String,
    pub master: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct LevelsOutput {
    pub levels: Vec<LevelOutput>,
}

impl LevelsOutput {
    pub fn new(registry: &TrialRegistry, max_level: Option<u32>) -> Self {
        let active = registry.active(max_level);
        Self {
            levels: registry
                .kinds()
                .iter()
                .map(|kind| LevelOutput {
                    level: kind.level(),
                    key: kind.key().to_string(),
                    master: kind.name().to_string(),
                    active: active.contains(kind),
                })
                .collect(),
        }
    }
}

impl CommandOutput for LevelsOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["level", "key", "master", "active"]);
        for level in &self.levels {
            table.add_row(vec![
                level.level.to_string(),
                level.key.clone(),
                level.master.clone(),
                if level.active { "yes" } else { "no" }.to_string(),
            ]);
        }
        render_list("level", table, self.levels.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let registry = TrialRegistry::builtin()?;
    output(&LevelsOutput::new(&registry, config.max_level), json_mode);
    Ok(())
}
