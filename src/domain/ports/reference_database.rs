//! Reference data ports used to score delta-factor results.

use crate::domain::models::{EosParameters, ReferenceEntry};

/// Lookup of trusted equation-of-state parameters per element.
pub trait ReferenceDatabase: Send + Sync {
    fn has_symbol(&self, symbol: &str) -> bool;

    /// Entry computed with `code` for `symbol`, if known.
    fn get_entry(&self, symbol: &str, code: &str) -> Option<ReferenceEntry>;
}

/// Scalar quality estimator comparing two equations of state.
pub trait DeltaEstimator: Send + Sync {
    /// Delta in meV/atom between `reference` and `measured`.
    fn delta(&self, reference: &EosParameters, measured: &EosParameters) -> f64;
}
