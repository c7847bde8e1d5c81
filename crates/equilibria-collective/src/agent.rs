// ─────────────────────────────────────────────────────────────────────
// Equilibria — Agents
// ─────────────────────────────────────────────────────────────────────

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use equilibria_dynamics::{ReferencePoints, StateVector};
use equilibria_types::{EngineError, EngineResult};

/// One participant: a stable id and its own state.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: usize,
    pub state: StateVector,
}

/// Agents plus the diffusive coupling that pulls them together.
///
/// Agent order is the id order and never changes, so every pass over the
/// collective is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectiveState {
    agents: Vec<Agent>,
    coupling_strength: f64,
}

impl CollectiveState {
    pub fn new(states: Vec<StateVector>, coupling_strength: f64) -> EngineResult<Self> {
        let first = states
            .first()
            .ok_or_else(|| EngineError::Config("collective needs at least one agent".into()))?;
        let n = first.dim();
        if let Some(id) = states.iter().position(|s| s.dim() != n) {
            return Err(EngineError::Config(format!(
                "agent {id} has {} dimensions, agent 0 has {n}",
                states[id].dim()
            )));
        }
        if !(coupling_strength.is_finite() && coupling_strength >= 0.0) {
            return Err(EngineError::Config(format!(
                "coupling_strength must be >= 0, got {coupling_strength}"
            )));
        }
        let agents = states
            .into_iter()
            .enumerate()
            .map(|(id, state)| Agent { id, state })
            .collect();
        Ok(Self {
            agents,
            coupling_strength,
        })
    }

    /// `count` agents drawn uniformly inside the bounds from a seeded RNG.
    pub fn random(
        count: usize,
        refs: &Arc<ReferencePoints>,
        coupling_strength: f64,
        seed: u64,
    ) -> EngineResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let states = (0..count)
            .map(|_| StateVector::random(refs, &mut rng))
            .collect();
        Self::new(states, coupling_strength)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.agents[0].state.dim()
    }

    pub fn coupling_strength(&self) -> f64 {
        self.coupling_strength
    }

    /// Iterator over the agents' current states.
    pub fn states(&self) -> impl Iterator<Item = &StateVector> + '_ {
        self.agents.iter().map(|a| &a.state)
    }
}
