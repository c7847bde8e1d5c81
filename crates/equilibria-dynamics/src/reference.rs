// ─────────────────────────────────────────────────────────────────────
// Equilibria — Reference Points
// ─────────────────────────────────────────────────────────────────────
//! Immutable anchor/equilibrium/bounds configuration.
//!
//! Built and validated once, then shared by `Arc` with every state
//! vector and dynamics system that needs it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use equilibria_types::{EngineError, EngineResult, ReferenceConfig};

use crate::params::{
    DEFAULT_ANCHOR, DEFAULT_EQUILIBRIUM, DISTINGUISHED_DIMENSION, N_DIMENSIONS, QUANTUM_BOUND,
};

/// Euclidean distance between two equal-length slices.
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Anchor, equilibrium and per-dimension upper bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoints {
    anchor: Vec<f64>,
    equilibrium: Vec<f64>,
    upper_bounds: Vec<f64>,
    distinguished: usize,
}

impl ReferencePoints {
    /// Validate and build a reference set.
    ///
    /// A zero equilibrium component is rejected here with `DivisionByZero`
    /// so that self-referential harmony is total afterwards.
    pub fn new(
        anchor: Vec<f64>,
        equilibrium: Vec<f64>,
        upper_bounds: Vec<f64>,
        distinguished: usize,
    ) -> EngineResult<Self> {
        let n = upper_bounds.len();
        if n == 0 {
            return Err(EngineError::Config("reference points need >= 1 dimension".into()));
        }
        if anchor.len() != n || equilibrium.len() != n {
            return Err(EngineError::Config(format!(
                "anchor ({}) / equilibrium ({}) / bounds ({n}) length mismatch",
                anchor.len(),
                equilibrium.len()
            )));
        }
        if distinguished >= n {
            return Err(EngineError::Config(format!(
                "distinguished dimension {distinguished} out of range for {n} dimensions"
            )));
        }
        if let Some(i) = upper_bounds.iter().position(|&b| !(b.is_finite() && b > 0.0)) {
            return Err(EngineError::Config(format!(
                "upper bound for dimension {i} must be finite and > 0, got {}",
                upper_bounds[i]
            )));
        }
        for (name, point) in [("anchor", &anchor), ("equilibrium", &equilibrium)] {
            for (i, (&v, &b)) in point.iter().zip(&upper_bounds).enumerate() {
                if !v.is_finite() || !(0.0..=b).contains(&v) {
                    return Err(EngineError::Config(format!(
                        "{name}[{i}] = {v} outside [0, {b}]"
                    )));
                }
            }
        }
        if let Some(i) = equilibrium.iter().position(|&e| e == 0.0) {
            return Err(EngineError::DivisionByZero(format!(
                "equilibrium component {i} is zero"
            )));
        }
        if anchor == equilibrium {
            return Err(EngineError::Config(
                "equilibrium must be distinct from anchor".into(),
            ));
        }
        Ok(Self {
            anchor,
            equilibrium,
            upper_bounds,
            distinguished,
        })
    }

    /// Canonical four-dimensional reference set with unit bounds.
    pub fn canonical() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR.to_vec(),
            equilibrium: DEFAULT_EQUILIBRIUM.to_vec(),
            upper_bounds: vec![1.0; N_DIMENSIONS],
            distinguished: DISTINGUISHED_DIMENSION,
        }
    }

    /// Extend the distinguished dimension's bound to √2.
    pub fn with_quantum_bound(mut self) -> Self {
        self.upper_bounds[self.distinguished] = QUANTUM_BOUND;
        self
    }

    pub fn from_config(config: &ReferenceConfig) -> EngineResult<Self> {
        config.validate()?;
        let n = config.dimensions;
        let upper_bounds = config.upper_bounds.clone().unwrap_or_else(|| vec![1.0; n]);
        let anchor = match &config.anchor {
            Some(a) => a.clone(),
            None if n == N_DIMENSIONS => DEFAULT_ANCHOR.to_vec(),
            None => vec![1.0; n],
        };
        let equilibrium = match &config.equilibrium {
            Some(e) => e.clone(),
            None => DEFAULT_EQUILIBRIUM.to_vec(),
        };
        let refs = Self::new(anchor, equilibrium, upper_bounds, config.distinguished_dimension)?;
        Ok(if config.quantum_bound {
            refs.with_quantum_bound()
        } else {
            refs
        })
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn dim(&self) -> usize {
        self.upper_bounds.len()
    }

    pub fn anchor(&self) -> &[f64] {
        &self.anchor
    }

    pub fn equilibrium(&self) -> &[f64] {
        &self.equilibrium
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    #[inline]
    pub fn upper_bound(&self, i: usize) -> f64 {
        self.upper_bounds[i]
    }

    pub fn distinguished(&self) -> usize {
        self.distinguished
    }

    /// `1 / (1 + |x - equilibrium|)` for raw component values.
    #[inline]
    pub fn harmony_of(&self, values: &[f64]) -> f64 {
        1.0 / (1.0 + euclidean(values, &self.equilibrium))
    }
}

impl Default for ReferencePoints {
    fn default() -> Self {
        Self::canonical()
    }
}
