// ─────────────────────────────────────────────────────────────────────
// Equilibria — Collapse Selection
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Probabilistic resolution of a set of candidate states, weighted by
//! squared amplitude and harmony.

pub mod selector;
pub mod superposition;

pub use selector::{Candidate, Collapsed, CollapseSelector};
pub use superposition::Superposition;
