//! Service layer: eligibility rule, trial lifecycle and progression engine.

pub mod dojo;
pub mod eligibility;
pub mod masters;
pub mod trial_runner;

pub use dojo::{Dojo, LevelAssessment, ProgressionSummary};
pub use masters::{builtin_masters, ChallengeContext, DeltaFactorMaster, HintsMaster, Master};
pub use trial_runner::TrialRunner;
