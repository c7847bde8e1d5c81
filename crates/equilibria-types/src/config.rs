// ─────────────────────────────────────────────────────────────────────
// Equilibria — Engine Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, EngineResult};

/// Dimension count of the canonical four-dimensional state.
pub const DEFAULT_DIMENSIONS: usize = 4;

/// Top-level engine configuration.
///
/// Every section rejects unknown keys and falls back to its documented
/// defaults for missing ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub reference: ReferenceConfig,
    pub coupling: CouplingConfig,
    pub parameters: ParameterConfig,
    pub phase: PhaseThresholds,
    pub integrator: IntegratorConfig,
    pub optimizer: OptimizerConfig,
    pub collective: CollectiveConfig,
}

impl EngineConfig {
    /// Validate every section against the configured dimension count.
    pub fn validate(&self) -> EngineResult<()> {
        let n = self.reference.dimensions;
        self.reference.validate()?;
        self.coupling.validate(n)?;
        self.parameters.validate(n)?;
        self.phase.validate()?;
        self.optimizer.validate()?;
        self.collective.validate()?;
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("JSON parse error: {e}")))
    }
}

/// Reference points and bounds shared by every state vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Number of state dimensions. Default: 4.
    pub dimensions: usize,
    /// Anchor point. Defaults to the upper bounds (all 1.0).
    pub anchor: Option<Vec<f64>>,
    /// Natural-rest point. Required unless `dimensions == 4`.
    pub equilibrium: Option<Vec<f64>>,
    /// Per-dimension upper bounds. Default: 1.0 everywhere.
    pub upper_bounds: Option<Vec<f64>>,
    /// Dimension read by the phase classifier and the optimizer objective.
    pub distinguished_dimension: usize,
    /// Extend the distinguished dimension's bound to √2.
    pub quantum_bound: bool,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
            anchor: None,
            equilibrium: None,
            upper_bounds: None,
            distinguished_dimension: 0,
            quantum_bound: false,
        }
    }
}

impl ReferenceConfig {
    pub fn validate(&self) -> EngineResult<()> {
        let n = self.dimensions;
        if n == 0 {
            return Err(EngineError::Config("dimensions must be >= 1".to_string()));
        }
        if self.equilibrium.is_none() && n != DEFAULT_DIMENSIONS {
            return Err(EngineError::Config(format!(
                "equilibrium is required for {n} dimensions (defaults exist only for {DEFAULT_DIMENSIONS})"
            )));
        }
        for (name, v) in [
            ("anchor", &self.anchor),
            ("equilibrium", &self.equilibrium),
            ("upper_bounds", &self.upper_bounds),
        ] {
            if let Some(v) = v {
                check_len(name, v.len(), n)?;
            }
        }
        if self.distinguished_dimension >= n {
            return Err(EngineError::Config(format!(
                "distinguished_dimension {} out of range for {n} dimensions",
                self.distinguished_dimension
            )));
        }
        Ok(())
    }
}

/// One amplification rule: `base[from][to] *= 1 + multiplier * harmony`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmplificationRule {
    pub from: usize,
    pub to: usize,
    pub multiplier: f64,
}

/// Coupling matrix import. Missing fields use the canonical matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CouplingConfig {
    pub matrix: Option<Vec<Vec<f64>>>,
    pub amplification: Option<Vec<AmplificationRule>>,
}

impl CouplingConfig {
    pub fn validate(&self, n: usize) -> EngineResult<()> {
        if let Some(m) = &self.matrix {
            check_square("coupling.matrix", m, n)?;
        }
        if let Some(rules) = &self.amplification {
            for r in rules {
                if r.from >= n || r.to >= n {
                    return Err(EngineError::Config(format!(
                        "amplification rule ({}, {}) out of range for {n} dimensions",
                        r.from, r.to
                    )));
                }
                if !r.multiplier.is_finite() {
                    return Err(EngineError::Config(format!(
                        "amplification multiplier for ({}, {}) must be finite",
                        r.from, r.to
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Recognized dynamics parameter keys.
///
/// This is the `config_map` of the construction API: any other key is a
/// configuration error, missing keys take the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterConfig {
    pub growth_rates: Option<Vec<Vec<f64>>>,
    pub decay_rates: Option<Vec<f64>>,
    pub saturation_constant: Option<f64>,
    pub erosion_coefficient: Option<f64>,
}

impl ParameterConfig {
    pub fn validate(&self, n: usize) -> EngineResult<()> {
        if let Some(g) = &self.growth_rates {
            check_square("growth_rates", g, n)?;
            if g.iter().flatten().any(|&v| !(v.is_finite() && v >= 0.0)) {
                return Err(EngineError::Config(
                    "growth_rates must be finite and non-negative".to_string(),
                ));
            }
        }
        if let Some(b) = &self.decay_rates {
            check_len("decay_rates", b.len(), n)?;
            if b.iter().any(|&v| !(v.is_finite() && v >= 0.0)) {
                return Err(EngineError::Config(
                    "decay_rates must be finite and non-negative".to_string(),
                ));
            }
        }
        if let Some(k) = self.saturation_constant {
            if !(k.is_finite() && k > 0.0) {
                return Err(EngineError::Config(format!(
                    "saturation_constant must be > 0, got {k}"
                )));
            }
        }
        if let Some(g) = self.erosion_coefficient {
            if !(g.is_finite() && g >= 0.0) {
                return Err(EngineError::Config(format!(
                    "erosion_coefficient must be >= 0, got {g}"
                )));
            }
        }
        Ok(())
    }

    /// Parse from a JSON object map.
    pub fn from_map(map: &Map<String, Value>) -> EngineResult<Self> {
        serde_json::from_value(Value::Object(map.clone()))
            .map_err(|e| EngineError::Config(format!("parameter config: {e}")))
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("JSON parse error: {e}")))
    }
}

/// Harmony and distinguished-dimension thresholds for phase classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseThresholds {
    /// Below this harmony the state is collapsing. Default: 0.5.
    pub h_low: f64,
    /// At or above this harmony the state may be growing. Default: 0.6.
    pub h_high: f64,
    /// Distinguished dimension level required for growth. Default: 0.7.
    pub l_threshold: f64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            h_low: 0.5,
            h_high: 0.6,
            l_threshold: 0.7,
        }
    }
}

impl PhaseThresholds {
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.h_low) || !(0.0..=1.0).contains(&self.h_high) {
            return Err(EngineError::Config(format!(
                "harmony thresholds must be in [0, 1], got h_low={} h_high={}",
                self.h_low, self.h_high
            )));
        }
        if self.h_low > self.h_high {
            return Err(EngineError::Config(format!(
                "h_low ({}) must not exceed h_high ({})",
                self.h_low, self.h_high
            )));
        }
        if !(self.l_threshold.is_finite() && self.l_threshold >= 0.0) {
            return Err(EngineError::Config(format!(
                "l_threshold must be >= 0, got {}",
                self.l_threshold
            )));
        }
        Ok(())
    }
}

/// Integrator options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegratorConfig {
    /// Abort a trajectory once this many numeric warnings accumulate.
    /// `None` (default) never aborts.
    pub warning_limit: Option<usize>,
}

/// Self-optimizer tuning. The per-generation step bound is fixed at 0.05.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Gradient scale. Default: 0.1.
    pub learning_rate: f64,
    /// Forward-difference perturbation. Default: 1e-6.
    pub epsilon: f64,
    /// Per-dimension floor after each step. Default: 0.2.
    pub lower_bound: f64,
    /// Converged once max |Δ| falls below this. Default: 1e-4.
    pub tolerance: f64,
    /// Generation budget for `run` when the caller passes none. Default: 100.
    pub max_generations: usize,
    /// Allowed objective drop before a generation is flagged. Default: 1e-9.
    pub monotonic_tolerance: f64,
    /// Abort an optimizer, tuning or collective run once this many numeric
    /// warnings accumulate. `None` (default) never aborts.
    pub warning_limit: Option<usize>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epsilon: 1e-6,
            lower_bound: 0.2,
            tolerance: 1e-4,
            max_generations: 100,
            monotonic_tolerance: 1e-9,
            warning_limit: None,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(EngineError::Config(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(EngineError::Config(format!(
                "epsilon must be > 0, got {}",
                self.epsilon
            )));
        }
        if !(self.lower_bound.is_finite() && self.lower_bound >= 0.0) {
            return Err(EngineError::Config(format!(
                "lower_bound must be >= 0, got {}",
                self.lower_bound
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(EngineError::Config(format!(
                "tolerance must be >= 0, got {}",
                self.tolerance
            )));
        }
        if !(self.monotonic_tolerance.is_finite() && self.monotonic_tolerance >= 0.0) {
            return Err(EngineError::Config(format!(
                "monotonic_tolerance must be >= 0, got {}",
                self.monotonic_tolerance
            )));
        }
        Ok(())
    }
}

/// Collective coordination options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectiveConfig {
    /// Diffusive pull toward the mean state. Default: 0.1.
    pub coupling_strength: f64,
    /// Run the individual-improvement phase on the rayon pool. Default: true.
    pub parallel: bool,
    /// When set, each agent takes one RK4 step of this size before its
    /// optimizer generation. Default: none (optimizer only).
    pub integration_dt: Option<f64>,
}

impl Default for CollectiveConfig {
    fn default() -> Self {
        Self {
            coupling_strength: 0.1,
            parallel: true,
            integration_dt: None,
        }
    }
}

impl CollectiveConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.coupling_strength.is_finite() && self.coupling_strength >= 0.0) {
            return Err(EngineError::Config(format!(
                "coupling_strength must be >= 0, got {}",
                self.coupling_strength
            )));
        }
        if let Some(dt) = self.integration_dt {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(EngineError::Config(format!(
                    "integration_dt must be > 0, got {dt}"
                )));
            }
        }
        Ok(())
    }
}

fn check_len(name: &str, got: usize, n: usize) -> EngineResult<()> {
    if got != n {
        return Err(EngineError::Config(format!(
            "{name} has length {got}, expected {n}"
        )));
    }
    Ok(())
}

fn check_square(name: &str, m: &[Vec<f64>], n: usize) -> EngineResult<()> {
    check_len(name, m.len(), n)?;
    for (i, row) in m.iter().enumerate() {
        if row.len() != n {
            return Err(EngineError::Config(format!(
                "{name} row {i} has length {}, expected {n}",
                row.len()
            )));
        }
    }
    Ok(())
}
