// ─────────────────────────────────────────────────────────────────────
// Equilibria — Phase Classification
// ─────────────────────────────────────────────────────────────────────
//! Memoryless mapping from a state to its regime:
//!
//!   H <  h_low                      → Collapsing
//!   H >= h_high and x_d >= l_thr    → Growing
//!   otherwise                       → Stable

use std::fmt;

use serde::{Deserialize, Serialize};

use equilibria_types::{EngineResult, PhaseThresholds};

use crate::state::StateVector;

/// Regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Collapsing,
    Stable,
    Growing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Collapsing => "collapsing",
            Phase::Stable => "stable",
            Phase::Growing => "growing",
        };
        f.write_str(s)
    }
}

/// Classify with explicit thresholds.
pub fn classify(state: &StateVector, thresholds: &PhaseThresholds) -> Phase {
    let h = state.harmony();
    if h < thresholds.h_low {
        Phase::Collapsing
    } else if h >= thresholds.h_high && state.distinguished_value() >= thresholds.l_threshold {
        Phase::Growing
    } else {
        Phase::Stable
    }
}

/// Classifier bound to one validated threshold set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseClassifier {
    thresholds: PhaseThresholds,
}

impl PhaseClassifier {
    pub fn new(thresholds: PhaseThresholds) -> EngineResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &PhaseThresholds {
        &self.thresholds
    }

    pub fn classify(&self, state: &StateVector) -> Phase {
        classify(state, &self.thresholds)
    }
}
