// ─────────────────────────────────────────────────────────────────────
// Equilibria — History Records
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_component(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_component: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_component: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Kind of recoverable numeric event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A component left its bound after a step and was clamped back.
    Clamped,
    /// The derivative produced NaN/Inf for a component.
    NonFiniteDerivative,
    /// An optimizer generation lowered the objective.
    NonMonotonicObjective,
}

/// A recoverable numeric-instability event.
///
/// Recorded in run histories instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericWarning {
    pub kind: WarningKind,
    /// Integration step or optimizer generation that produced the event.
    pub step: usize,
    /// Affected dimension, if the event concerns a single component.
    pub dimension: Option<usize>,
    /// Offending raw value (pre-clamp value, or objective drop).
    pub value: f64,
}

impl NumericWarning {
    pub fn clamped(step: usize, dimension: usize, value: f64) -> Self {
        Self {
            kind: WarningKind::Clamped,
            step,
            dimension: Some(dimension),
            value,
        }
    }

    pub fn non_finite(step: usize, dimension: usize, value: f64) -> Self {
        Self {
            kind: WarningKind::NonFiniteDerivative,
            step,
            dimension: Some(dimension),
            value,
        }
    }

    pub fn non_monotonic(generation: usize, drop: f64) -> Self {
        Self {
            kind: WarningKind::NonMonotonicObjective,
            step: generation,
            dimension: None,
            value: drop,
        }
    }
}

/// One optimizer generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub before: Vec<f64>,
    pub after: Vec<f64>,
    pub delta: Vec<f64>,
    pub objective_before: f64,
    pub objective_after: f64,
    pub improved: bool,
    pub warnings: Vec<NumericWarning>,
}

impl GenerationRecord {
    /// Largest absolute component of the applied step.
    pub fn max_step(&self) -> f64 {
        self.delta.iter().fold(0.0, |m, d| m.max(d.abs()))
    }
}

/// Plain `(t, values)` sample of a trajectory, for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub t: f64,
    pub values: Vec<f64>,
}

/// A numeric warning raised while advancing one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentWarning {
    pub agent: usize,
    pub warning: NumericWarning,
}

/// Collective metric after one coordinator step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectiveRecord {
    pub step: usize,
    pub synchrony: f64,
    pub mean_objective: f64,
    pub collective_objective: f64,
    /// Integration clamps, optimizer warnings and barrier clamps of this step.
    #[serde(default)]
    pub warnings: Vec<AgentWarning>,
}
