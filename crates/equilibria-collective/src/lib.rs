// ─────────────────────────────────────────────────────────────────────
// Equilibria — Collective Coordination
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Multi-agent improvement with a diffusive synchronization barrier.

pub mod agent;
pub mod coordinator;
pub mod metrics;

pub use agent::{Agent, CollectiveState};
pub use coordinator::{CollectiveCoordinator, CollectiveRun};
pub use metrics::{collective_objective, mean_objective, mean_state, synchrony};
