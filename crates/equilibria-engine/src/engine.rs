// ─────────────────────────────────────────────────────────────────────
// Equilibria — Engine Facade
// ─────────────────────────────────────────────────────────────────────
//! Assembles every component from one validated [`EngineConfig`]:
//!
//!   config → reference points → coupling + parameters → dynamics system
//!          → integrator, classifier, optimizer, coordinator, selector

use std::sync::Arc;

use rand::Rng;

use equilibria_collapse::{Candidate, Collapsed, CollapseSelector};
use equilibria_collective::{CollectiveCoordinator, CollectiveRun};
use equilibria_dynamics::{
    CouplingModel, DynamicsSystem, Integrator, OptimizationRun, ParameterTuning, Parameters,
    Phase, PhaseClassifier, ReferencePoints, SelfOptimizer, StateVector, Trajectory,
};
use equilibria_types::{EngineConfig, EngineError, EngineResult, NumericWarning};

/// One fully-configured engine instance.
///
/// Immutable once built; every run owns its own states and histories, so
/// independent runs may share one engine.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    system: DynamicsSystem,
    integrator: Integrator,
    classifier: PhaseClassifier,
    optimizer: SelfOptimizer,
    coordinator: CollectiveCoordinator,
    selector: CollapseSelector,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let n = config.reference.dimensions;

        let refs = ReferencePoints::from_config(&config.reference)?.shared();
        let coupling = CouplingModel::from_config(&config.coupling, n)?;
        let params = Parameters::from_config(&config.parameters, n)?;
        let system = DynamicsSystem::new(Arc::clone(&refs), coupling, params)?;

        let integrator = Integrator::new(config.integrator);
        let classifier = PhaseClassifier::new(config.phase)?;
        let optimizer = SelfOptimizer::new(config.optimizer)?;
        let coordinator =
            CollectiveCoordinator::from_config(optimizer, &config.collective, &system, integrator)?;

        log::debug!(
            "engine ready: {n} dimensions, recommended dt {:?}",
            system.params().recommended_dt()
        );

        Ok(Self {
            config,
            system,
            integrator,
            classifier,
            optimizer,
            coordinator,
            selector: CollapseSelector::new(),
        })
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Self::new(EngineConfig::from_json(json)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn refs(&self) -> &Arc<ReferencePoints> {
        self.system.refs()
    }

    pub fn system(&self) -> &DynamicsSystem {
        &self.system
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    pub fn classifier(&self) -> &PhaseClassifier {
        &self.classifier
    }

    pub fn optimizer(&self) -> &SelfOptimizer {
        &self.optimizer
    }

    pub fn coordinator(&self) -> &CollectiveCoordinator {
        &self.coordinator
    }

    pub fn selector(&self) -> &CollapseSelector {
        &self.selector
    }

    /// State from explicit values, or the equilibrium.
    pub fn new_state(&self, values: Option<Vec<f64>>) -> EngineResult<StateVector> {
        crate::api::new_state(values, self.refs())
    }

    /// One RK4 step of the configured dynamics.
    pub fn step(
        &self,
        state: &StateVector,
        dt: f64,
    ) -> EngineResult<(StateVector, Vec<NumericWarning>)> {
        self.check_dim(state)?;
        self.integrator
            .step_recorded(state, &self.system.derivative_fn(), dt, 0)
    }

    /// Lazy trajectory of the configured dynamics.
    pub fn integrate(
        &self,
        initial: &StateVector,
        t_span: (f64, f64),
        n_steps: usize,
    ) -> EngineResult<Trajectory<impl Fn(&[f64]) -> Vec<f64> + '_>> {
        self.check_dim(initial)?;
        self.integrator
            .integrate(initial, self.system.derivative_fn(), t_span, n_steps)
    }

    pub fn classify(&self, state: &StateVector) -> Phase {
        self.classifier.classify(state)
    }

    /// Optimize with the configured generation budget.
    pub fn optimize(&self, state: &StateVector) -> EngineResult<OptimizationRun> {
        self.optimizer.optimize(state)
    }

    /// Tune a copy of the configured decay rates.
    pub fn tune_decay_rates(
        &self,
        initial: &StateVector,
        horizon: f64,
        n_steps: usize,
        generations: usize,
    ) -> EngineResult<ParameterTuning> {
        self.optimizer
            .tune_decay_rates(&self.system, initial, horizon, n_steps, generations)
    }

    /// Collective run with the configured coupling strength.
    pub fn run_collective(
        &self,
        agents: Vec<StateVector>,
        steps: usize,
    ) -> EngineResult<CollectiveRun> {
        self.coordinator
            .run(agents, self.config.collective.coupling_strength, steps)
    }

    pub fn collapse<R: Rng + ?Sized>(
        &self,
        candidates: &[Candidate],
        rng: &mut R,
    ) -> EngineResult<Collapsed> {
        self.selector.collapse(candidates, rng)
    }

    pub fn collapse_seeded(&self, candidates: &[Candidate], seed: u64) -> EngineResult<Collapsed> {
        self.selector.collapse_seeded(candidates, seed)
    }

    fn check_dim(&self, state: &StateVector) -> EngineResult<()> {
        if state.dim() != self.system.dim() {
            return Err(EngineError::Config(format!(
                "state has {} components, engine has {}",
                state.dim(),
                self.system.dim()
            )));
        }
        Ok(())
    }
}
