//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pseudo-dojo")]
#[command(about = "Pseudo Dojo - staged validation of pseudopotentials", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (default: .dojo/config.yaml and .dojo/local.yaml)
    #[arg(short, long, global = true, env = "PSEUDO_DOJO_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the registered dojo levels
    Levels,

    /// Show the dojo report of a pseudopotential
    Inspect {
        /// Pseudopotential file
        pseudo: PathBuf,
    },

    /// Show which levels a pseudopotential is eligible for
    Check {
        /// Pseudopotential file
        pseudo: PathBuf,

        /// Accuracy tier (low, normal, high)
        #[arg(short, long, default_value = "normal")]
        accuracy: String,
    },

    /// Run pseudopotentials through every level they are eligible for
    Challenge(ChallengeArgs),

    /// Train a single level again, ignoring the progression rule
    Retrain {
        /// Pseudopotential file
        pseudo: PathBuf,

        /// Dojo level to retrain
        #[arg(short, long)]
        level: u32,

        /// Accuracy tier (low, normal, high)
        #[arg(short, long, default_value = "normal")]
        accuracy: String,

        /// Replace entries already recorded for this accuracy
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(Args, Debug)]
pub struct ChallengeArgs {
    /// Pseudopotential files
    #[arg(required = true)]
    pub pseudos: Vec<PathBuf>,

    /// Accuracy tier (low, normal, high)
    #[arg(short, long, default_value = "normal")]
    pub accuracy: String,

    /// Highest level to run
    #[arg(long)]
    pub max_level: Option<u32>,

    /// CPU budget per trial
    #[arg(short = 'n', long)]
    pub max_ncpus: Option<usize>,

    /// Cutoff step (Ha) of the iterative hints scan
    #[arg(long, value_parser = parse_estep)]
    pub estep: Option<f64>,

    /// k-points per reciprocal atom for the delta factor
    #[arg(long)]
    pub kppa: Option<u32>,
}

fn parse_estep(value: &str) -> Result<f64, String> {
    let estep: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if estep.is_finite() && estep > 0.0 {
        Ok(estep)
    } else {
        Err(format!("must be a finite, positive number of Hartree, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_challenge() {
        let cli = Cli::try_parse_from([
            "pseudo-dojo",
            "--json",
            "challenge",
            "Si.psp8",
            "O.psp8",
            "--accuracy",
            "high",
            "--max-level",
            "0",
            "-n",
            "4",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Challenge(args) => {
                assert_eq!(args.pseudos.len(), 2);
                assert_eq!(args.accuracy, "high");
                assert_eq!(args.max_level, Some(0));
                assert_eq!(args.max_ncpus, Some(4));
                assert_eq!(args.estep, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_estep_must_be_finite_and_positive() {
        for bad in ["NaN", "inf", "0", "-2"] {
            let parsed = Cli::try_parse_from(["pseudo-dojo", "challenge", "Si.psp8", "--estep", bad]);
            assert!(parsed.is_err(), "--estep {bad} should be rejected");
        }

        let cli = Cli::try_parse_from(["pseudo-dojo", "challenge", "Si.psp8", "--estep", "5"]).unwrap();
        match cli.command {
            Commands::Challenge(args) => assert_eq!(args.estep, Some(5.0)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_challenge_requires_a_pseudo() {
        assert!(Cli::try_parse_from(["pseudo-dojo", "challenge"]).is_err());
    }

    #[test]
    fn test_parse_retrain() {
        let cli = Cli::try_parse_from([
            "pseudo-dojo",
            "retrain",
            "Si.psp8",
            "--level",
            "1",
            "--overwrite",
        ])
        .unwrap();

        match cli.command {
            Commands::Retrain {
                level,
                overwrite,
                accuracy,
                ..
            } => {
                assert_eq!(level, 1);
                assert!(overwrite);
                assert_eq!(accuracy, "normal");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
