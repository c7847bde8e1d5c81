// ─────────────────────────────────────────────────────────────────────
// Equilibria — Engine Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Equilibria state-dynamics engine.

pub mod config;
pub mod error;
pub mod record;

pub use config::{
    AmplificationRule, CollectiveConfig, CouplingConfig, EngineConfig, IntegratorConfig,
    OptimizerConfig, ParameterConfig, PhaseThresholds, ReferenceConfig, DEFAULT_DIMENSIONS,
};
pub use error::{EngineError, EngineResult};
pub use record::{
    clamp_component, AgentWarning, CollectiveRecord, GenerationRecord, NumericWarning,
    TrajectoryPoint, WarningKind,
};
