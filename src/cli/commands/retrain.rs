//! `retrain` command.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use super::{build_dojo, parse_accuracy};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, TrainingMeasurement, TrainingOptions, TrialOutcome};

#[derive(Debug, Serialize)]
pub struct RetrainOutput {
    pub pseudo: String,
    pub level: u32,
    pub status: String,
    pub exceptions: Vec<String>,
}

impl RetrainOutput {
    pub fn new(pseudo: &str, level: u32, measurement: Option<&TrainingMeasurement>) -> Self {
        let (status, exceptions) = match measurement.map(|m| &m.outcome) {
            None => ("rejected", vec![]),
            Some(TrialOutcome::Passed) => ("passed", vec![]),
            Some(TrialOutcome::Failed(failures)) => ("failed", failures.0.clone()),
        };
        Self {
            pseudo: pseudo.to_string(),
            level,
            status: status.to_string(),
            exceptions,
        }
    }
}

impl CommandOutput for RetrainOutput {
    fn to_human(&self) -> String {
        let mut line = format!("{} level {}: {}", self.pseudo, self.level, self.status);
        for exception in &self.exceptions {
            line.push_str(&format!("\n  - {exception}"));
        }
        line
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    pseudo: PathBuf,
    level: u32,
    accuracy: &str,
    overwrite: bool,
    config: &Config,
    json_mode: bool,
) -> Result<()> {
    let options = TrainingOptions::default()
        .with_accuracy(parse_accuracy(accuracy)?)
        .with_overwrite(overwrite);

    let dojo = build_dojo(config).await?;
    let loaded = dojo
        .resolve(pseudo.clone())
        .await
        .with_context(|| format!("Failed to load {}", pseudo.display()))?;

    let measurement = dojo
        .retrain(loaded.clone(), level, &options)
        .await
        .with_context(|| format!("Failed to retrain level {level}"))?;

    output(
        &RetrainOutput::new(loaded.name(), level, measurement.as_ref()),
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_when_gate_refuses() {
        let out = RetrainOutput::new("Si.psp8", 1, None);
        assert_eq!(out.status, "rejected");
        assert_eq!(out.to_human(), "Si.psp8 level 1: rejected");
    }
}
