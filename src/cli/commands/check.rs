//! `check` command: eligibility of every active level.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use super::{build_dojo, parse_accuracy};
use crate::cli::display::{list_table, status_cell};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Eligibility};
use crate::services::LevelAssessment;

#[derive(Debug, Serialize)]
pub struct VerdictOutput {
    pub level: u32,
    pub key: String,
    pub eligible: bool,
    pub reason: Option<String>,
}

impl From<&LevelAssessment> for VerdictOutput {
    fn from(assessment: &LevelAssessment) -> Self {
        let reason = match &assessment.eligibility {
            Eligibility::Accepted => None,
            Eligibility::Rejected(reason) => Some(reason.to_string()),
        };
        Self {
            level: assessment.kind.level(),
            key: assessment.kind.key().to_string(),
            eligible: assessment.eligibility.is_accepted(),
            reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub pseudo: String,
    pub accuracy: String,
    pub current_level: Option<u32>,
    pub levels: Vec<VerdictOutput>,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["level", "key", "eligible", "reason"]);
        for verdict in &self.levels {
            table.add_row(vec![
                verdict.level.to_string(),
                verdict.key.clone(),
                status_cell(verdict.eligible, if verdict.eligible { "yes" } else { "no" }),
                verdict.reason.clone().unwrap_or_default(),
            ]);
        }
        format!(
            "{} at accuracy {}:\n{table}",
            self.pseudo, self.accuracy
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    pseudo: PathBuf,
    accuracy: &str,
    config: &Config,
    json_mode: bool,
) -> Result<()> {
    let accuracy = parse_accuracy(accuracy)?;
    let dojo = build_dojo(config).await?;
    let loaded = dojo
        .resolve(pseudo.clone())
        .await
        .with_context(|| format!("Failed to load {}", pseudo.display()))?;

    let (report, verdicts) = dojo.assess(loaded.clone(), accuracy).await?;

    output(
        &CheckOutput {
            pseudo: loaded.name().to_string(),
            accuracy: accuracy.to_string(),
            current_level: dojo.current_level(&report),
            levels: verdicts.iter().map(VerdictOutput::from).collect(),
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{RejectionReason, TrialKind};

    #[test]
    fn test_verdict_output_carries_reason() {
        let assessment = LevelAssessment {
            kind: TrialKind::DeltaFactor,
            eligibility: Eligibility::Rejected(RejectionReason::Untested { level: 1 }),
        };

        let out = VerdictOutput::from(&assessment);

        assert_eq!(out.level, 1);
        assert!(!out.eligible);
        assert!(out.reason.is_some());
    }
}
