//! `challenge` command: run pseudopotentials through the dojo.

use anyhow::{bail, Result};
use serde::Serialize;

use super::{build_dojo, parse_accuracy};
use crate::cli::display::{list_table, render_list, status_cell};
use crate::cli::output::{output, CommandOutput};
use crate::cli::types::ChallengeArgs;
use crate::domain::models::{Config, TrainingOptions, TrialOutcome};
use crate::services::ProgressionSummary;

#[derive(Debug, Serialize)]
pub struct TrialOutput {
    pub trial: String,
    pub ok: bool,
    pub elapsed_ms: u64,
    pub exceptions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PseudoOutput {
    pub run_id: String,
    pub pseudo: String,
    pub ok: bool,
    pub trained: Vec<TrialOutput>,
    pub skipped: Vec<SkipOutput>,
}

#[derive(Debug, Serialize)]
pub struct SkipOutput {
    pub trial: String,
    pub reason: String,
}

impl From<&ProgressionSummary> for PseudoOutput {
    fn from(summary: &ProgressionSummary) -> Self {
        Self {
            run_id: summary.run_id.to_string(),
            pseudo: summary.pseudo.clone(),
            ok: summary.is_ok(),
            trained: summary
                .measurements
                .iter()
                .map(|m| TrialOutput {
                    trial: m.trial.key().to_string(),
                    ok: m.is_ok(),
                    elapsed_ms: u64::try_from(m.elapsed.as_millis()).unwrap_or(u64::MAX),
                    exceptions: match &m.outcome {
                        TrialOutcome::Passed => vec![],
                        TrialOutcome::Failed(failures) => failures.0.clone(),
                    },
                })
                .collect(),
            skipped: summary
                .skipped
                .iter()
                .map(|(kind, reason)| SkipOutput {
                    trial: kind.key().to_string(),
                    reason: reason.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChallengeOutput {
    pub results: Vec<PseudoOutput>,
}

impl ChallengeOutput {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }
}

impl CommandOutput for ChallengeOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["pseudo", "trial", "status", "detail"]);
        let mut rows = 0;
        for result in &self.results {
            for trial in &result.trained {
                let status = if trial.ok { "passed" } else { "failed" };
                let detail = if trial.ok {
                    format!("{} ms", trial.elapsed_ms)
                } else {
                    trial.exceptions.join("; ")
                };
                table.add_row(vec![
                    result.pseudo.clone(),
                    trial.trial.clone(),
                    status_cell(trial.ok, status),
                    detail,
                ]);
                rows += 1;
            }
            for skip in &result.skipped {
                table.add_row(vec![
                    result.pseudo.clone(),
                    skip.trial.clone(),
                    "skipped".to_string(),
                    skip.reason.clone(),
                ]);
                rows += 1;
            }
        }
        render_list("trial", table, rows)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ChallengeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let accuracy = parse_accuracy(&args.accuracy)?;

    let mut config = config.clone();
    if args.max_level.is_some() {
        config.max_level = args.max_level;
    }
    if let Some(max_ncpus) = args.max_ncpus {
        config.max_ncpus = max_ncpus;
    }

    let mut options = TrainingOptions::default().with_accuracy(accuracy);
    if let Some(estep) = args.estep {
        options = options.with_estep(estep);
    }
    if let Some(kppa) = args.kppa {
        options = options.with_kppa(kppa);
    }

    let dojo = build_dojo(&config).await?;
    tracing::debug!(levels = %dojo.describe_levels(), "Dojo levels");

    let mut results = Vec::with_capacity(args.pseudos.len());
    for path in args.pseudos {
        let summary = dojo.challenge_pseudo_detailed(path, &options).await?;
        results.push(PseudoOutput::from(&summary));
    }

    let out = ChallengeOutput { results };
    output(&out, json_mode);

    if !out.all_ok() {
        bail!("One or more trials completed with exceptions");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        CapturedFailures, RejectionReason, TrainingMeasurement, TrialKind,
    };
    use std::time::Duration;
    use uuid::Uuid;

    fn summary() -> ProgressionSummary {
        ProgressionSummary {
            run_id: Uuid::new_v4(),
            pseudo: "Si.psp8".to_string(),
            measurements: vec![TrainingMeasurement {
                trial: TrialKind::Hints,
                pseudo: "Si.psp8".to_string(),
                outcome: TrialOutcome::Failed(CapturedFailures(vec!["scf diverged".into()])),
                elapsed: Duration::from_millis(12),
            }],
            skipped: vec![(
                TrialKind::DeltaFactor,
                RejectionReason::Untested { level: 1 },
            )],
            halted_at: Some(TrialKind::Hints),
        }
    }

    #[test]
    fn test_summary_conversion() {
        let out = PseudoOutput::from(&summary());

        assert!(!out.ok);
        assert_eq!(out.trained[0].exceptions, vec!["scf diverged".to_string()]);
        assert_eq!(out.skipped[0].trial, "delta_factor");
    }

    #[test]
    fn test_human_output_lists_skips() {
        let out = ChallengeOutput {
            results: vec![PseudoOutput::from(&summary())],
        };

        assert!(!out.all_ok());
        let human = out.to_human();
        assert!(human.contains("skipped"));
        assert!(human.contains("scf diverged"));
    }
}
