//! Domain layer for the pseudo dojo
//!
//! This module contains the progression model (trial kinds, reports,
//! eligibility verdicts) and the ports through which external collaborators
//! are consumed.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DojoError, DojoResult};
