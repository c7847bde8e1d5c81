// ─────────────────────────────────────────────────────────────────────
// Equilibria — Canonical Parameters
// ─────────────────────────────────────────────────────────────────────
//! Canonical reference points, coupling matrix and rate constants for
//! the four-dimensional state.
//!
//! Dimension names are opaque labels; nothing in the engine depends on
//! their meaning.

use serde::{Deserialize, Serialize};

use equilibria_types::{EngineError, EngineResult, ParameterConfig};

pub const N_DIMENSIONS: usize = 4;

pub const DIMENSION_NAMES: [&str; N_DIMENSIONS] = ["love", "justice", "power", "wisdom"];

/// Index of the dimension read by phase classification and the optimizer.
pub const DISTINGUISHED_DIMENSION: usize = 0;

/// Anchor: every component at the unit upper bound.
pub const DEFAULT_ANCHOR: [f64; N_DIMENSIONS] = [1.0; N_DIMENSIONS];

/// Natural-rest point the dynamics relax toward.
pub const DEFAULT_EQUILIBRIUM: [f64; N_DIMENSIONS] = [0.80, 0.80, 0.70, 0.85];

/// Extended bound for the distinguished dimension in the quantum regime.
pub const QUANTUM_BOUND: f64 = std::f64::consts::SQRT_2;

/// Erosion: excess in `SOURCE` unchecked by `CHECK` drains `TARGET`.
pub const EROSION_SOURCE: usize = 2;
pub const EROSION_CHECK: usize = 3;
pub const EROSION_TARGET: usize = 1;

const DEFAULT_GROWTH: f64 = 0.1;
const DEFAULT_DECAY: f64 = 0.5;
const CANONICAL_DECAY: [f64; N_DIMENSIONS] = [0.6, 0.5, 0.55, 0.5];
const DEFAULT_SATURATION: f64 = 0.5;
const DEFAULT_EROSION: f64 = 0.2;

/// Canonical influence of row dimension on column dimension.
const CANONICAL_COUPLING: [[f64; N_DIMENSIONS]; N_DIMENSIONS] = [
    [0.0, 1.0, 0.8, 1.0],
    [0.6, 0.0, 0.5, 0.7],
    [0.4, 0.6, 0.0, 0.5],
    [0.8, 0.9, 0.6, 0.0],
];

/// Harmony amplification of selected couplings (from, to, multiplier).
pub const CANONICAL_AMPLIFICATION: [(usize, usize, f64); 3] = [
    (0, 1, 0.5), // love → justice
    (0, 3, 0.5), // love → wisdom
    (3, 0, 0.3), // wisdom → love
];

/// Build the coupling base matrix for `n` dimensions.
///
/// The canonical asymmetric matrix for `n == 4`; otherwise uniform unit
/// off-diagonal coupling. The diagonal is always zero.
pub fn build_coupling_matrix(n: usize) -> Vec<Vec<f64>> {
    if n == N_DIMENSIONS {
        return CANONICAL_COUPLING.iter().map(|row| row.to_vec()).collect();
    }
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 0.0 } else { 1.0 }).collect())
        .collect()
}

fn default_growth(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { 0.0 } else { DEFAULT_GROWTH })
                .collect()
        })
        .collect()
}

fn default_decay(n: usize) -> Vec<f64> {
    if n == N_DIMENSIONS {
        CANONICAL_DECAY.to_vec()
    } else {
        vec![DEFAULT_DECAY; n]
    }
}

/// Rate constants of the coupled dynamics.
///
/// All values are non-negative and fixed for a run. Experiments work on a
/// copy through [`Parameters::with_decay_rates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    growth_rates: Vec<Vec<f64>>,
    decay_rates: Vec<f64>,
    saturation_constant: f64,
    erosion_coefficient: f64,
}

impl Parameters {
    /// Canonical four-dimensional parameters.
    pub fn canonical() -> Self {
        Self::defaults_for(N_DIMENSIONS)
    }

    /// Documented defaults for `n` dimensions.
    pub fn defaults_for(n: usize) -> Self {
        Self {
            growth_rates: default_growth(n),
            decay_rates: default_decay(n),
            saturation_constant: DEFAULT_SATURATION,
            erosion_coefficient: DEFAULT_EROSION,
        }
    }

    /// Build from a validated config; missing keys take the defaults.
    pub fn from_config(config: &ParameterConfig, n: usize) -> EngineResult<Self> {
        config.validate(n)?;
        Ok(Self {
            growth_rates: config
                .growth_rates
                .clone()
                .unwrap_or_else(|| default_growth(n)),
            decay_rates: config.decay_rates.clone().unwrap_or_else(|| default_decay(n)),
            saturation_constant: config.saturation_constant.unwrap_or(DEFAULT_SATURATION),
            erosion_coefficient: config.erosion_coefficient.unwrap_or(DEFAULT_EROSION),
        })
    }

    /// Export as a config map.
    pub fn to_config(&self) -> ParameterConfig {
        ParameterConfig {
            growth_rates: Some(self.growth_rates.clone()),
            decay_rates: Some(self.decay_rates.clone()),
            saturation_constant: Some(self.saturation_constant),
            erosion_coefficient: Some(self.erosion_coefficient),
        }
    }

    /// Copy with replaced decay rates.
    pub fn with_decay_rates(&self, decay_rates: Vec<f64>) -> EngineResult<Self> {
        if decay_rates.len() != self.dim() {
            return Err(EngineError::Config(format!(
                "decay_rates has length {}, expected {}",
                decay_rates.len(),
                self.dim()
            )));
        }
        if decay_rates.iter().any(|&b| !(b.is_finite() && b >= 0.0)) {
            return Err(EngineError::Config(
                "decay_rates must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self {
            decay_rates,
            ..self.clone()
        })
    }

    pub fn dim(&self) -> usize {
        self.decay_rates.len()
    }

    #[inline]
    pub fn growth(&self, i: usize, j: usize) -> f64 {
        self.growth_rates[i][j]
    }

    #[inline]
    pub fn decay(&self, i: usize) -> f64 {
        self.decay_rates[i]
    }

    pub fn decay_rates(&self) -> &[f64] {
        &self.decay_rates
    }

    pub fn saturation_constant(&self) -> f64 {
        self.saturation_constant
    }

    pub fn erosion_coefficient(&self) -> f64 {
        self.erosion_coefficient
    }

    /// Fastest decay rate β_max.
    pub fn max_decay_rate(&self) -> f64 {
        self.decay_rates.iter().copied().fold(0.0, f64::max)
    }

    /// Heuristic step size `0.1 / β_max`.
    ///
    /// The engine never picks dt on its own. Steps much larger than this
    /// can oscillate divergently; that is an expected numerical outcome,
    /// and post-step clamping keeps the state bounded regardless.
    /// `None` when every decay rate is zero.
    pub fn recommended_dt(&self) -> Option<f64> {
        let beta_max = self.max_decay_rate();
        (beta_max > 0.0).then(|| 0.1 / beta_max)
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_names_length() {
        assert_eq!(DIMENSION_NAMES.len(), N_DIMENSIONS);
    }

    #[test]
    fn test_equilibrium_distinct_from_anchor() {
        assert_ne!(DEFAULT_EQUILIBRIUM, DEFAULT_ANCHOR);
        assert!(DEFAULT_EQUILIBRIUM.iter().all(|&e| e > 0.0 && e <= 1.0));
    }

    #[test]
    fn test_coupling_zero_diagonal() {
        for n in [2, 4, 6] {
            let k = build_coupling_matrix(n);
            for (i, row) in k.iter().enumerate() {
                assert_eq!(row.len(), n);
                assert_eq!(row[i], 0.0, "K[{i},{i}] should be 0");
            }
        }
    }

    #[test]
    fn test_canonical_coupling_asymmetric() {
        let k = build_coupling_matrix(N_DIMENSIONS);
        assert!((k[0][1] - k[1][0]).abs() > 1e-9);
    }

    #[test]
    fn test_canonical_decay_dominates_growth() {
        // Column sums of amplified growth stay below each decay rate.
        let p = Parameters::canonical();
        let k = build_coupling_matrix(N_DIMENSIONS);
        for j in 0..N_DIMENSIONS {
            let inflow: f64 = (0..N_DIMENSIONS)
                .map(|i| {
                    let amp = CANONICAL_AMPLIFICATION
                        .iter()
                        .find(|&&(a, b, _)| a == i && b == j)
                        .map_or(0.0, |r| r.2);
                    p.growth(i, j) * k[i][j] * (1.0 + amp)
                })
                .sum();
            assert!(inflow < p.decay(j), "dimension {j}: inflow {inflow} >= decay");
        }
    }

    #[test]
    fn test_recommended_dt() {
        let p = Parameters::canonical();
        let dt = p.recommended_dt().unwrap();
        assert!((dt - 0.1 / 0.6).abs() < 1e-12, "dt={dt}");
    }

    #[test]
    fn test_recommended_dt_without_decay() {
        let p = Parameters::canonical().with_decay_rates(vec![0.0; 4]).unwrap();
        assert!(p.recommended_dt().is_none());
    }

    #[test]
    fn test_from_config_defaults_missing_keys() {
        let cfg = ParameterConfig {
            erosion_coefficient: Some(0.0),
            ..Default::default()
        };
        let p = Parameters::from_config(&cfg, 4).unwrap();
        assert_eq!(p.erosion_coefficient(), 0.0);
        assert_eq!(p.decay_rates(), &CANONICAL_DECAY);
    }

    #[test]
    fn test_from_config_dimension_mismatch() {
        let cfg = ParameterConfig {
            decay_rates: Some(vec![0.5; 3]),
            ..Default::default()
        };
        assert!(Parameters::from_config(&cfg, 4).is_err());
    }

    #[test]
    fn test_with_decay_rates_rejects_negative() {
        let p = Parameters::canonical();
        assert!(p.with_decay_rates(vec![0.5, -0.5, 0.5, 0.5]).is_err());
    }
}
