// ─────────────────────────────────────────────────────────────────────
// Equilibria — State-Dynamics Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Config-driven facade over the Equilibria engine: bounded state
//! vectors, coupled dynamics with RK4 integration, phase classification,
//! bounded self-optimization, collective synchronization and
//! harmony-weighted collapse.

pub mod api;
pub mod engine;

#[cfg(test)]
mod scenarios;

pub use api::{new_coupling_model, new_parameters, new_partial_state, new_state};
pub use engine::Engine;

pub use equilibria_collapse::{Candidate, Collapsed, CollapseSelector, Superposition};
pub use equilibria_collective::{Agent, CollectiveCoordinator, CollectiveRun, CollectiveState};
pub use equilibria_dynamics::{
    classify, objective, CouplingModel, DynamicsSystem, Integrator, OptimizationRun,
    ParameterTuning, Parameters, Phase, PhaseClassifier, ReferencePoints, SelfOptimizer,
    StateVector, Trajectory,
};
pub use equilibria_types::{
    AgentWarning, CollectiveRecord, EngineConfig, EngineError, EngineResult, GenerationRecord,
    NumericWarning, TrajectoryPoint, WarningKind,
};
