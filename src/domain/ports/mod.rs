//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces external collaborators must implement:
//! - Pseudo / PseudoLoader: pseudopotential identity and report storage
//! - WorkflowFactory / Work / ResourceRunner: calculation execution
//! - ReferenceDatabase / DeltaEstimator: reference data and scoring
//!
//! These traits keep the progression logic independent of file formats,
//! job schedulers and physics codes.

pub mod pseudo;
pub mod reference_database;
pub mod workflow;

pub use pseudo::{Pseudo, PseudoLoader, PseudoSource};
pub use reference_database::{DeltaEstimator, ReferenceDatabase};
pub use workflow::{EcutSpec, ExecutionManager, ResourceRunner, Work, WorkParams, WorkflowFactory};
