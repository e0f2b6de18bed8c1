//! Domain models for the dojo.

pub mod accuracy;
pub mod config;
pub mod eligibility;
pub mod options;
pub mod reference;
pub mod report;
pub mod run_result;
pub mod runner_state;
pub mod trial;

pub use accuracy::Accuracy;
pub use config::{
    CommandConfig, Config, LoggingConfig, ProgressionConfig, ReferenceConfig, WorkflowsConfig,
};
pub use eligibility::{AccuracyGating, Eligibility, RejectionReason};
pub use options::TrainingOptions;
pub use reference::{EosParameters, ReferenceEntry, DEFAULT_REFERENCE_CODE};
pub use report::{merge_fragment, DojoReport, MergeConflict, ReportFragment, EXCEPTIONS_FIELD};
pub use run_result::{CapturedFailures, RunResult, TrainingMeasurement, TrialOutcome};
pub use runner_state::RunnerState;
pub use trial::{TrialKind, TrialRegistry};
