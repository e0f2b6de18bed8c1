//! Pseudo Dojo - staged validation of pseudopotentials
//!
//! A pseudopotential climbs a ladder of increasingly demanding trials
//! (levels). Each trial runs an external workflow, reduces the results into
//! a fragment of the pseudo's dojo report and commits it. A level may only
//! run once every level below it has recorded a result.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): report model, eligibility rules and ports
//! - **Service Layer** (`services`): trial masters, the trial runner and the
//!   [`Dojo`] progression engine
//! - **Adapters** (`adapters`): pseudo storage, workflow execution and
//!   reference data
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use pseudo_dojo::cli::commands::build_dojo;
//! use pseudo_dojo::{Config, TrainingOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dojo = build_dojo(&Config::default()).await?;
//!     let ok = dojo
//!         .challenge_pseudo(std::path::Path::new("Si.psp8"), &TrainingOptions::default())
//!         .await?;
//!     println!("passed: {ok}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Accuracy, AccuracyGating, Config, DojoReport, Eligibility, LoggingConfig, RejectionReason,
    ReportFragment, RunResult, TrainingMeasurement, TrainingOptions, TrialKind, TrialOutcome,
    TrialRegistry,
};
pub use domain::ports::{
    DeltaEstimator, ExecutionManager, Pseudo, PseudoLoader, PseudoSource, ReferenceDatabase,
    ResourceRunner, Work, WorkflowFactory,
};
pub use domain::{DojoError, DojoResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Dojo, Master, ProgressionSummary, TrialRunner};
