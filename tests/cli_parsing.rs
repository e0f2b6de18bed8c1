//! CLI argument parsing tests.

use clap::Parser;
use pseudo_dojo::cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn test_retrain_defaults() {
    let cli = Cli::try_parse_from(["pseudo-dojo", "retrain", "Si.psp8", "--level", "1"]).unwrap();

    match cli.command {
        Commands::Retrain {
            pseudo,
            level,
            accuracy,
            overwrite,
        } => {
            assert_eq!(pseudo, PathBuf::from("Si.psp8"));
            assert_eq!(level, 1);
            assert_eq!(accuracy, "normal");
            assert!(!overwrite);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_retrain_requires_level() {
    assert!(Cli::try_parse_from(["pseudo-dojo", "retrain", "Si.psp8"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "pseudo-dojo",
        "check",
        "O.psp8",
        "--json",
        "--config",
        "dojo.yaml",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.config, Some(PathBuf::from("dojo.yaml")));
    assert!(matches!(cli.command, Commands::Check { .. }));
}
