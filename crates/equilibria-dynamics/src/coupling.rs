// ─────────────────────────────────────────────────────────────────────
// Equilibria — Coupling Model
// ─────────────────────────────────────────────────────────────────────
//! Cross-dimension coupling coefficients with harmony amplification:
//!
//!   C_ij(H) = K_ij · (1 + a_ij · H)
//!
//! Row i, column j is the influence of dimension i on dimension j. The
//! matrix need not be symmetric.

use std::collections::BTreeMap;

use equilibria_types::{AmplificationRule, CouplingConfig, EngineError, EngineResult};

use crate::params::{build_coupling_matrix, CANONICAL_AMPLIFICATION, N_DIMENSIONS};

/// Immutable coupling coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingModel {
    base_matrix: Vec<Vec<f64>>,
    amplification: BTreeMap<(usize, usize), f64>,
}

impl CouplingModel {
    /// Validate dimensions and build the model.
    ///
    /// A non-square matrix, a matrix of the wrong size, or a rule that
    /// points outside it is a configuration error.
    pub fn new(
        base_matrix: Vec<Vec<f64>>,
        amplification: BTreeMap<(usize, usize), f64>,
        n: usize,
    ) -> EngineResult<Self> {
        if base_matrix.len() != n {
            return Err(EngineError::Config(format!(
                "coupling matrix has {} rows, expected {n}",
                base_matrix.len()
            )));
        }
        for (i, row) in base_matrix.iter().enumerate() {
            if row.len() != n {
                return Err(EngineError::Config(format!(
                    "coupling matrix row {i} has {} columns, expected {n}",
                    row.len()
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(EngineError::Config(format!(
                    "coupling matrix entry ({i}, {j}) is not finite"
                )));
            }
        }
        for (&(i, j), &m) in &amplification {
            if i >= n || j >= n {
                return Err(EngineError::Config(format!(
                    "amplification rule ({i}, {j}) out of range for {n} dimensions"
                )));
            }
            if !m.is_finite() {
                return Err(EngineError::Config(format!(
                    "amplification multiplier for ({i}, {j}) is not finite"
                )));
            }
        }
        Ok(Self {
            base_matrix,
            amplification,
        })
    }

    /// Canonical four-dimensional coupling.
    pub fn canonical() -> Self {
        Self {
            base_matrix: build_coupling_matrix(N_DIMENSIONS),
            amplification: CANONICAL_AMPLIFICATION
                .iter()
                .map(|&(i, j, m)| ((i, j), m))
                .collect(),
        }
    }

    /// Import from config; missing fields fall back to the defaults for `n`.
    pub fn from_config(config: &CouplingConfig, n: usize) -> EngineResult<Self> {
        config.validate(n)?;
        let matrix = config
            .matrix
            .clone()
            .unwrap_or_else(|| build_coupling_matrix(n));
        let rules = match &config.amplification {
            Some(rules) => rules.iter().map(|r| ((r.from, r.to), r.multiplier)).collect(),
            None if n == N_DIMENSIONS => Self::canonical().amplification,
            None => BTreeMap::new(),
        };
        Self::new(matrix, rules, n)
    }

    /// Export as config.
    pub fn to_config(&self) -> CouplingConfig {
        CouplingConfig {
            matrix: Some(self.base_matrix.clone()),
            amplification: Some(
                self.amplification
                    .iter()
                    .map(|(&(from, to), &multiplier)| AmplificationRule {
                        from,
                        to,
                        multiplier,
                    })
                    .collect(),
            ),
        }
    }

    /// New model with the given rules replacing or adding multipliers.
    pub fn calibrated(&self, overrides: &[AmplificationRule]) -> EngineResult<Self> {
        let mut rules = self.amplification.clone();
        for r in overrides {
            rules.insert((r.from, r.to), r.multiplier);
        }
        Self::new(self.base_matrix.clone(), rules, self.dim())
    }

    pub fn dim(&self) -> usize {
        self.base_matrix.len()
    }

    #[inline]
    pub fn base(&self, i: usize, j: usize) -> f64 {
        self.base_matrix[i][j]
    }

    pub fn multiplier(&self, i: usize, j: usize) -> f64 {
        self.amplification.get(&(i, j)).copied().unwrap_or(0.0)
    }

    /// `base[i][j] * (1 + multiplier(i, j) * harmony)`.
    #[inline]
    pub fn amplified_coefficient(&self, i: usize, j: usize, harmony: f64) -> f64 {
        self.base_matrix[i][j] * (1.0 + self.multiplier(i, j) * harmony)
    }
}

impl Default for CouplingModel {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplified_without_rule() {
        let c = CouplingModel::canonical();
        assert!((c.amplified_coefficient(1, 0, 0.9) - c.base(1, 0)).abs() < 1e-15);
    }

    #[test]
    fn test_amplified_with_rule() {
        let c = CouplingModel::canonical();
        // K[0][1] = 1.0, a = 0.5, H = 0.8 → 1.4
        let v = c.amplified_coefficient(0, 1, 0.8);
        assert!((v - 1.4).abs() < 1e-12, "C_01={v}");
    }

    #[test]
    fn test_zero_harmony_is_base() {
        let c = CouplingModel::canonical();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(c.amplified_coefficient(i, j, 0.0), c.base(i, j));
            }
        }
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = CouplingModel::new(vec![vec![0.0; 4]; 3], BTreeMap::new(), 4);
        assert!(matches!(err, Err(EngineError::Config(_))));
        let err = CouplingModel::new(vec![vec![0.0; 3]; 4], BTreeMap::new(), 4);
        assert!(matches!(err, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rule_out_of_range_rejected() {
        let mut rules = BTreeMap::new();
        rules.insert((0, 7), 0.5);
        assert!(CouplingModel::new(build_coupling_matrix(4), rules, 4).is_err());
    }

    #[test]
    fn test_calibration_returns_new_model() {
        let c = CouplingModel::canonical();
        let tuned = c
            .calibrated(&[AmplificationRule {
                from: 2,
                to: 1,
                multiplier: 1.0,
            }])
            .unwrap();
        assert_eq!(c.multiplier(2, 1), 0.0);
        assert_eq!(tuned.multiplier(2, 1), 1.0);
    }

    #[test]
    fn test_config_export_import() {
        let c = CouplingModel::canonical();
        let back = CouplingModel::from_config(&c.to_config(), 4).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_from_config_other_dimension() {
        let c = CouplingModel::from_config(&CouplingConfig::default(), 3).unwrap();
        assert_eq!(c.dim(), 3);
        assert_eq!(c.multiplier(0, 1), 0.0);
        assert_eq!(c.base(0, 1), 1.0);
    }
}
