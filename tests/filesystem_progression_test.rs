//! Progression against pseudopotential files and their `.djrepo` reports.

mod common;

use std::sync::Arc;

use common::{eos_result, hints_run, silicon_reference, temp_dir};
use pseudo_dojo::adapters::filesystem::{FilePseudo, FilePseudoLoader};
use pseudo_dojo::adapters::refdata::BirchMurnaghanDelta;
use pseudo_dojo::adapters::workflow::{LocalManager, LocalResourceRunner, ScriptedWorkflowFactory};
use pseudo_dojo::services::builtin_masters;
use pseudo_dojo::{Dojo, DojoError, Pseudo, TrainingOptions};
use serde_json::Value;

fn file_dojo(work_root: &std::path::Path) -> Dojo {
    let masters = builtin_masters(
        Arc::new(ScriptedWorkflowFactory::new(hints_run())),
        Arc::new(ScriptedWorkflowFactory::new(vec![eos_result()])),
        Arc::new(silicon_reference()),
        Arc::new(BirchMurnaghanDelta),
        "WIEN2k",
    );
    Dojo::new(
        Arc::new(LocalManager::default()),
        Arc::new(LocalResourceRunner::new()),
        Arc::new(FilePseudoLoader),
        masters,
    )
    .unwrap()
    .with_work_root(work_root)
}

#[tokio::test]
async fn test_report_is_persisted_next_to_the_pseudo() {
    let dir = temp_dir();
    let path = dir.path().join("Si-sp.psp8");
    std::fs::write(&path, "# pseudopotential").unwrap();
    let dojo = file_dojo(dir.path());

    let ok = dojo
        .challenge_pseudo(path.clone(), &TrainingOptions::default())
        .await
        .unwrap();
    assert!(ok);

    let raw = std::fs::read_to_string(dir.path().join("Si-sp.psp8.djrepo")).unwrap();
    let json: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["hints"]["high"]["ecut"], Value::from(31.0));
    assert!(json["delta_factor"]["normal"]["dfact"].is_number());

    // A fresh handle sees the committed report.
    let reloaded = FilePseudo::new(&path).unwrap();
    let report = reloaded.read_dojo_report().await.unwrap();
    assert_eq!(dojo.current_level(&report), Some(1));
}

#[tokio::test]
async fn test_missing_pseudo_file_is_invalid() {
    let dir = temp_dir();
    let dojo = file_dojo(dir.path());

    let err = dojo
        .challenge_pseudo(dir.path().join("Xx.psp8"), &TrainingOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DojoError::InvalidPseudo { .. }));
}

#[cfg(unix)]
mod external_programs {
    use super::*;
    use pseudo_dojo::cli::commands::build_dojo;
    use pseudo_dojo::domain::models::CommandConfig;
    use pseudo_dojo::Config;

    fn shell(script: &str) -> CommandConfig {
        CommandConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "dojo".to_string()],
            results_file: "results.json".to_string(),
        }
    }

    #[tokio::test]
    async fn test_configured_commands_drive_a_full_progression() {
        let dir = temp_dir();
        let pseudo = dir.path().join("Si.psp8");
        std::fs::write(&pseudo, "# pseudopotential").unwrap();

        let database = dir.path().join("reference.json");
        std::fs::write(
            &database,
            r#"{"Si": {"WIEN2k": {"v0": 20.446, "b0": 0.5542, "b0_GPa": 88.790, "b1": 4.296}}}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.work_root = dir.path().display().to_string();
        config.reference.database_path = database.display().to_string();
        config.workflows.hints = shell(
            r#"echo '{"low": {"ecut": 15.0}, "normal": {"ecut": 22.0}, "high": {"ecut": 30.0}}' > "$DOJO_RESULTS""#,
        );
        config.workflows.delta_factor = shell(
            r#"echo '{"v0": 20.55, "b0_GPa": 88.846, "b1": 4.329}' > "$DOJO_RESULTS""#,
        );

        let dojo = build_dojo(&config).await.unwrap();
        let summary = dojo
            .challenge_pseudo_detailed(pseudo.clone(), &TrainingOptions::default())
            .await
            .unwrap();

        assert!(summary.is_ok(), "{summary:?}");
        assert_eq!(summary.measurements.len(), 2);

        let report = FilePseudo::new(&pseudo)
            .unwrap()
            .read_dojo_report()
            .await
            .unwrap();
        assert_eq!(dojo.current_level(&report), Some(1));
        assert!(dir
            .path()
            .join("DOJO_Si.psp8")
            .join("LEVEL_0")
            .join("params.json")
            .exists());
    }

    #[tokio::test]
    async fn test_failing_program_halts_with_exceptions() {
        let dir = temp_dir();
        let pseudo = dir.path().join("Si.psp8");
        std::fs::write(&pseudo, "# pseudopotential").unwrap();

        let mut config = Config::default();
        config.work_root = dir.path().display().to_string();
        config.reference.database_path = dir.path().join("missing.json").display().to_string();
        config.workflows.hints = shell(
            r#"echo '{"low": {"ecut": 15.0}, "normal": {"ecut": 22.0}, "high": {"ecut": 30.0}}' > "$DOJO_RESULTS"; exit 3"#,
        );

        let dojo = build_dojo(&config).await.unwrap();
        let ok = dojo
            .challenge_pseudo(pseudo.clone(), &TrainingOptions::default())
            .await
            .unwrap();

        assert!(!ok);
        let report = FilePseudo::new(&pseudo)
            .unwrap()
            .read_dojo_report()
            .await
            .unwrap();
        assert!(report.has_trial("hints"));
        assert!(!report.has_trial("delta_factor"));
    }
}
