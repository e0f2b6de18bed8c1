//! Reference equation-of-state data and the delta-factor estimator.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::errors::DojoResult;
use crate::domain::models::{EosParameters, ReferenceEntry};
use crate::domain::ports::{DeltaEstimator, ReferenceDatabase};

/// Reference database read from a JSON file shaped as
/// `{"Si": {"WIEN2k": {"v0": .., "b0": .., "b0_GPa": .., "b1": ..}}}`.
#[derive(Debug, Clone, Default)]
pub struct JsonReferenceDatabase {
    entries: HashMap<String, HashMap<String, ReferenceEntry>>,
}

impl JsonReferenceDatabase {
    pub async fn load(path: &Path) -> DojoResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let entries = serde_json::from_slice(&bytes)?;
        Ok(Self { entries })
    }

    pub fn from_entries<S, C>(entries: impl IntoIterator<Item = (S, C, ReferenceEntry)>) -> Self
    where
        S: Into<String>,
        C: Into<String>,
    {
        let mut db = Self::default();
        for (symbol, code, entry) in entries {
            db.entries
                .entry(symbol.into())
                .or_default()
                .insert(code.into(), entry);
        }
        db
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceDatabase for JsonReferenceDatabase {
    fn has_symbol(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    fn get_entry(&self, symbol: &str, code: &str) -> Option<ReferenceEntry> {
        self.entries.get(symbol)?.get(code).copied()
    }
}

/// GPa -> eV/A^3
const GPA_TO_EV_PER_A3: f64 = 1.0e9 / 1.602_176_565e-19 / 1.0e30;

/// Delta gauge between two Birch-Murnaghan equations of state: the RMS
/// energy difference (meV/atom) over +-6% around the mean equilibrium
/// volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct BirchMurnaghanDelta;

impl BirchMurnaghanDelta {
    /// Coefficients of `E(V) = a0 + a1 V^-2/3 + a2 V^-4/3 + a3 V^-2`.
    fn coefficients(eos: &EosParameters) -> [f64; 4] {
        let v0 = eos.v0;
        let b0 = eos.b0_gpa * GPA_TO_EV_PER_A3;
        let b1 = eos.b1;
        let scale = 9.0 * b0 / 16.0;
        [
            scale * v0 * (6.0 - b1),
            scale * v0.powf(5.0 / 3.0) * (3.0 * b1 - 16.0),
            scale * v0.powf(7.0 / 3.0) * (14.0 - 3.0 * b1),
            scale * v0.powi(3) * (b1 - 4.0),
        ]
    }
}

impl DeltaEstimator for BirchMurnaghanDelta {
    fn delta(&self, reference: &EosParameters, measured: &EosParameters) -> f64 {
        let vref = (reference.v0 + measured.v0) / 2.0;
        let vi = 0.94 * vref;
        let vf = 1.06 * vref;

        let aw = Self::coefficients(reference);
        let af = Self::coefficients(measured);
        let d = [af[0] - aw[0], af[1] - aw[1], af[2] - aw[2], af[3] - aw[3]];

        // Antiderivative of (E_f - E_w)^2.
        let x = [
            d[0] * d[0],
            6.0 * d[1] * d[0],
            -3.0 * (2.0 * d[2] * d[0] + d[1] * d[1]),
            -2.0 * d[3] * d[0] - 2.0 * d[2] * d[1],
            -3.0 / 5.0 * (2.0 * d[3] * d[1] + d[2] * d[2]),
            -6.0 / 7.0 * d[3] * d[2],
            -1.0 / 3.0 * d[3] * d[3],
        ];
        let integral = |v: f64| -> f64 {
            x.iter()
                .enumerate()
                .map(|(n, xn)| xn * v.powf(-(2.0 * n as f64 - 3.0) / 3.0))
                .sum()
        };

        let mean_square = (integral(vf) - integral(vi)) / (vf - vi);
        1000.0 * mean_square.max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wien2k_si() -> EosParameters {
        EosParameters {
            v0: 20.446,
            b0_gpa: 88.790,
            b1: 4.296,
        }
    }

    fn measured_si() -> EosParameters {
        EosParameters {
            v0: 20.55,
            b0_gpa: 88.846,
            b1: 4.329,
        }
    }

    #[test]
    fn test_identical_eos_has_zero_delta() {
        let delta = BirchMurnaghanDelta.delta(&wien2k_si(), &wien2k_si());
        assert!(delta.abs() < 1e-6, "delta = {delta}");
    }

    #[test]
    fn test_known_silicon_delta() {
        let delta = BirchMurnaghanDelta.delta(&wien2k_si(), &measured_si());
        assert!((delta - 2.026_544_664_6).abs() < 1e-3, "delta = {delta}");
    }

    #[test]
    fn test_delta_is_symmetric() {
        let forward = BirchMurnaghanDelta.delta(&wien2k_si(), &measured_si());
        let backward = BirchMurnaghanDelta.delta(&measured_si(), &wien2k_si());
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn test_database_lookup() {
        let entry = ReferenceEntry {
            v0: 20.446,
            b0: 0.5542,
            b0_gpa: 88.790,
            b1: 4.296,
        };
        let db = JsonReferenceDatabase::from_entries([("Si", "WIEN2k", entry)]);

        assert!(db.has_symbol("Si"));
        assert!(!db.has_symbol("Ge"));
        assert_eq!(db.get_entry("Si", "WIEN2k"), Some(entry));
        assert_eq!(db.get_entry("Si", "VASP"), None);
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json");
        std::fs::write(
            &path,
            r#"{"Si": {"WIEN2k": {"v0": 20.446, "b0": 0.5542, "b0_GPa": 88.79, "b1": 4.296}}}"#,
        )
        .unwrap();

        let db = JsonReferenceDatabase::load(&path).await.unwrap();
        assert_eq!(db.len(), 1);
        assert!((db.get_entry("Si", "WIEN2k").unwrap().b0_gpa - 88.79).abs() < 1e-12);
    }
}
