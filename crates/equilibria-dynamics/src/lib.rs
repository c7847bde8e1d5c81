// ─────────────────────────────────────────────────────────────────────
// Equilibria — Dynamics Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Bounded state vectors, harmony-coupled ODE dynamics, the RK4
//! integrator, phase classification and the bounded self-optimizer.

pub mod coupling;
pub mod integrator;
pub mod optimizer;
pub mod params;
pub mod phase;
pub mod reference;
pub mod state;
pub mod system;

pub use coupling::CouplingModel;
pub use integrator::{Integrator, Trajectory, TrajectoryIter};
pub use optimizer::{
    objective, OptimizationRun, ParameterTuning, SelfOptimizer, DECAY_RATE_BOUNDS, MAX_STEP,
};
pub use params::{build_coupling_matrix, Parameters, DIMENSION_NAMES, N_DIMENSIONS};
pub use phase::{classify, Phase, PhaseClassifier};
pub use reference::ReferencePoints;
pub use state::StateVector;
pub use system::DynamicsSystem;
