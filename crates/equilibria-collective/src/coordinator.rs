// ─────────────────────────────────────────────────────────────────────
// Equilibria — Collective Coordinator
// ─────────────────────────────────────────────────────────────────────
//! One collective step:
//!   1. Improve: each agent (optionally) takes one RK4 step, then one
//!      optimizer generation. Agents are independent here, so this phase
//!      may run on the rayon pool.
//!   2. Barrier: read every improved state, compute the mean, then write
//!      x ← clip(x + k · (mean - x)) for every agent.
//!   3. Measure synchrony and the collective objective.
//!
//! Numeric warnings from every phase are tagged with the agent id and kept
//! in the step's [`CollectiveRecord`].

use rayon::prelude::*;

use equilibria_dynamics::{DynamicsSystem, Integrator, SelfOptimizer, StateVector};
use equilibria_types::{
    AgentWarning, CollectiveConfig, CollectiveRecord, EngineError, EngineResult, NumericWarning,
};

use crate::agent::{Agent, CollectiveState};
use crate::metrics::{collective_objective, mean_objective, mean_state, synchrony};

/// Final agents and the per-step metric history of a collective run.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectiveRun {
    pub agents: Vec<Agent>,
    pub metrics: Vec<CollectiveRecord>,
}

#[derive(Debug, Clone)]
struct AttachedDynamics {
    system: DynamicsSystem,
    integrator: Integrator,
    dt: f64,
}

/// Drives a population of agents through improve-then-synchronize steps.
#[derive(Debug, Clone)]
pub struct CollectiveCoordinator {
    optimizer: SelfOptimizer,
    dynamics: Option<AttachedDynamics>,
    parallel: bool,
}

impl CollectiveCoordinator {
    /// Optimizer-only coordinator, parallel improvement enabled.
    pub fn new(optimizer: SelfOptimizer) -> Self {
        Self {
            optimizer,
            dynamics: None,
            parallel: true,
        }
    }

    /// Build from config; dynamics are attached when `integration_dt` is set.
    pub fn from_config(
        optimizer: SelfOptimizer,
        config: &CollectiveConfig,
        system: &DynamicsSystem,
        integrator: Integrator,
    ) -> EngineResult<Self> {
        config.validate()?;
        let coordinator = Self::new(optimizer).with_parallel(config.parallel);
        match config.integration_dt {
            Some(dt) => coordinator.with_dynamics(system.clone(), integrator, dt),
            None => Ok(coordinator),
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Precede every optimizer generation with one RK4 step of size `dt`.
    pub fn with_dynamics(
        mut self,
        system: DynamicsSystem,
        integrator: Integrator,
        dt: f64,
    ) -> EngineResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(EngineError::Config(format!(
                "integration dt must be > 0, got {dt}"
            )));
        }
        self.dynamics = Some(AttachedDynamics {
            system,
            integrator,
            dt,
        });
        Ok(self)
    }

    pub fn optimizer(&self) -> &SelfOptimizer {
        &self.optimizer
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    fn improve(
        &self,
        state: &StateVector,
        step: usize,
    ) -> EngineResult<(StateVector, Vec<NumericWarning>)> {
        let (start, mut warnings) = match &self.dynamics {
            Some(d) => d
                .integrator
                .step_recorded(state, &d.system.derivative_fn(), d.dt, step)?,
            None => (state.clone(), Vec::new()),
        };
        let (next, record) = self.optimizer.propose(&start, step);
        warnings.extend(record.warnings);
        Ok((next, warnings))
    }

    /// Advance every agent by one collective step and return the metrics.
    pub fn collective_step(
        &self,
        collective: &mut CollectiveState,
        step: usize,
    ) -> EngineResult<CollectiveRecord> {
        if let Some(d) = &self.dynamics {
            if d.system.dim() != collective.dim() {
                return Err(EngineError::Config(format!(
                    "agents have {} dimensions, dynamics system has {}",
                    collective.dim(),
                    d.system.dim()
                )));
            }
        }

        // Improve.
        let improved: Vec<(StateVector, Vec<NumericWarning>)> = if self.parallel {
            collective
                .agents()
                .par_iter()
                .map(|a| self.improve(&a.state, step))
                .collect::<EngineResult<_>>()?
        } else {
            collective
                .agents()
                .iter()
                .map(|a| self.improve(&a.state, step))
                .collect::<EngineResult<_>>()?
        };

        let (improved, raised): (Vec<StateVector>, Vec<Vec<NumericWarning>>) =
            improved.into_iter().unzip();
        let mut warnings: Vec<AgentWarning> = Vec::new();

        // Barrier: read all, then write all.
        let mean = mean_state(&improved);
        let k = collective.coupling_strength();
        for ((agent, state), mut raised) in collective
            .agents_mut()
            .iter_mut()
            .zip(improved)
            .zip(raised)
        {
            agent.state = if k == 0.0 {
                state
            } else {
                let pulled = state
                    .values()
                    .iter()
                    .zip(&mean)
                    .map(|(x, m)| x + k * (m - x))
                    .collect();
                let (pulled, clamps) = StateVector::from_clamped(pulled, state.refs(), step);
                raised.extend(clamps);
                pulled
            };
            let id = agent.id;
            warnings.extend(
                raised
                    .into_iter()
                    .map(|warning| AgentWarning { agent: id, warning }),
            );
        }

        let states: Vec<&StateVector> = collective.states().collect();
        let record = CollectiveRecord {
            step,
            synchrony: synchrony(&states),
            mean_objective: mean_objective(&states),
            collective_objective: collective_objective(&states),
            warnings,
        };
        log::trace!(
            "collective step {step}: S={:.4} J={:.4} C={:.4}, {} warnings",
            record.synchrony,
            record.mean_objective,
            record.collective_objective,
            record.warnings.len()
        );
        Ok(record)
    }

    /// Run `steps` collective steps over `agents`.
    ///
    /// Warnings accumulate across steps against the optimizer's
    /// `warning_limit`.
    pub fn run(
        &self,
        agents: Vec<StateVector>,
        coupling_strength: f64,
        steps: usize,
    ) -> EngineResult<CollectiveRun> {
        let mut collective = CollectiveState::new(agents, coupling_strength)?;
        let mut metrics = Vec::with_capacity(steps);
        let mut warning_count = 0;
        for step in 0..steps {
            let record = self.collective_step(&mut collective, step)?;
            warning_count += record.warnings.len();
            self.optimizer.check_warning_limit(warning_count)?;
            metrics.push(record);
        }
        Ok(CollectiveRun {
            agents: collective.into_agents(),
            metrics,
        })
    }
}
