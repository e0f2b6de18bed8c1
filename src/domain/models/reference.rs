//! Equation-of-state parameters and reference database entries.

use serde::{Deserialize, Serialize};

/// Code whose results are used as the delta-factor reference.
pub const DEFAULT_REFERENCE_CODE: &str = "WIEN2k";

/// Birch-Murnaghan fit parameters: volume per atom (A^3), bulk modulus (GPa)
/// and its pressure derivative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EosParameters {
    pub v0: f64,
    #[serde(rename = "b0_GPa")]
    pub b0_gpa: f64,
    pub b1: f64,
}

/// One row of the reference database.
///
/// `b0` is expressed in eV/A^3, `b0_gpa` in GPa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub v0: f64,
    pub b0: f64,
    #[serde(rename = "b0_GPa")]
    pub b0_gpa: f64,
    pub b1: f64,
}

impl ReferenceEntry {
    pub fn eos(&self) -> EosParameters {
        EosParameters {
            v0: self.v0,
            b0_gpa: self.b0_gpa,
            b1: self.b1,
        }
    }
}
