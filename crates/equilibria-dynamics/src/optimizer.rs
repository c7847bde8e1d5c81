// ─────────────────────────────────────────────────────────────────────
// Equilibria — Self Optimizer
// ─────────────────────────────────────────────────────────────────────
//! Bounded gradient ascent on
//!
//!   J(x) = H(x) · x_d / V_max_d        (clamped to [0, 1])
//!
//! One generation:
//!   1. J at the current point
//!   2. forward-difference gradient with step ε
//!   3. Δ = clip(lr · ∇J, ±MAX_STEP)
//!   4. x' = clip(x + Δ, lower, upper)
//!   5. append a GenerationRecord
//!
//! The same ascent drives parameter experiments, where the point is the
//! decay-rate vector and J is read off the end of an integrated
//! trajectory.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use equilibria_types::{
    EngineError, EngineResult, GenerationRecord, NumericWarning, OptimizerConfig,
};

use crate::integrator::Integrator;
use crate::params::Parameters;
use crate::reference::ReferencePoints;
use crate::state::StateVector;
use crate::system::DynamicsSystem;

/// Hard per-generation step bound for every component.
pub const MAX_STEP: f64 = 0.05;

/// Range decay rates are held to during parameter experiments.
pub const DECAY_RATE_BOUNDS: (f64, f64) = (0.01, 5.0);

/// Objective at raw component values.
pub fn objective_of(refs: &ReferencePoints, values: &[f64]) -> f64 {
    let d = refs.distinguished();
    let j = refs.harmony_of(values) * values[d] / refs.upper_bound(d);
    j.clamp(0.0, 1.0)
}

/// Objective of a state, in [0, 1].
pub fn objective(state: &StateVector) -> f64 {
    objective_of(state.refs(), state.values())
}

/// Forward-difference gradient of a fallible objective.
///
/// `f0` is the objective already evaluated at `x`.
pub fn gradient_forward<O, E>(
    x: &[f64],
    f0: f64,
    eps: f64,
    objective: &mut O,
) -> Result<Vec<f64>, E>
where
    O: FnMut(&[f64]) -> Result<f64, E>,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_perturb = x.to_vec();
    for i in 0..x.len() {
        x_perturb[i] = x[i] + eps;
        grad[i] = (objective(&x_perturb)? - f0) / eps;
        x_perturb[i] = x[i];
    }
    Ok(grad)
}

/// `lr · g`, each component clipped to ±MAX_STEP.
pub fn bounded_step(grad: &[f64], learning_rate: f64) -> Vec<f64> {
    grad.iter()
        .map(|g| (learning_rate * g).clamp(-MAX_STEP, MAX_STEP))
        .collect()
}

/// Result of [`SelfOptimizer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRun {
    pub final_state: StateVector,
    pub history: Vec<GenerationRecord>,
    pub converged: bool,
}

/// Result of [`SelfOptimizer::tune_decay_rates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTuning {
    pub parameters: Parameters,
    pub history: Vec<GenerationRecord>,
    pub converged: bool,
}

/// Bounded gradient-ascent optimizer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelfOptimizer {
    config: OptimizerConfig,
}

impl SelfOptimizer {
    pub fn new(config: OptimizerConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Forward-difference gradient of the objective at `state`.
    pub fn gradient(&self, state: &StateVector) -> Vec<f64> {
        let refs = state.refs();
        let f0 = objective(state);
        let mut obj = |p: &[f64]| Ok::<f64, Infallible>(objective_of(refs, p));
        match gradient_forward(state.values(), f0, self.config.epsilon, &mut obj) {
            Ok(grad) => grad,
            Err(never) => match never {},
        }
    }

    /// One generation as a pure transition.
    ///
    /// Components pushed outside `[lower_bound, upper]` are clamped back and
    /// reported in the record's warnings.
    pub fn propose(
        &self,
        state: &StateVector,
        generation: usize,
    ) -> (StateVector, GenerationRecord) {
        let before = state.values().to_vec();
        let objective_before = objective(state);
        let step = bounded_step(&self.gradient(state), self.config.learning_rate);

        let raw: Vec<f64> = before.iter().zip(&step).map(|(x, d)| x + d).collect();
        let lower = self.config.lower_bound;
        let (next, clamps) = StateVector::from_clamped_within(raw, state.refs(), lower, generation);

        let objective_after = objective(&next);
        let after = next.values().to_vec();
        let record = self.record(
            generation,
            before,
            after,
            objective_before,
            objective_after,
            clamps,
        );
        (next, record)
    }

    /// Error once `count` accumulated warnings exceed the configured limit.
    pub fn check_warning_limit(&self, count: usize) -> EngineResult<()> {
        match self.config.warning_limit {
            Some(limit) if count > limit => {
                log::warn!("run aborted: {count} numeric warnings (limit {limit})");
                Err(EngineError::WarningLimitExceeded { count, limit })
            }
            _ => Ok(()),
        }
    }

    /// Run up to `generations` generations, stopping early once the applied
    /// step falls below the tolerance.
    pub fn run(&self, state: &StateVector, generations: usize) -> EngineResult<OptimizationRun> {
        let mut current = state.clone();
        let mut history = Vec::with_capacity(generations);
        let mut converged = false;
        let mut warning_count = 0;

        for generation in 0..generations {
            let (next, record) = self.propose(&current, generation);
            warning_count += record.warnings.len();
            self.check_warning_limit(warning_count)?;
            let done = record.max_step() < self.config.tolerance;
            history.push(record);
            current = next;
            if done {
                converged = true;
                break;
            }
        }

        Ok(OptimizationRun {
            final_state: current,
            history,
            converged,
        })
    }

    /// [`SelfOptimizer::run`] with the configured generation budget.
    pub fn optimize(&self, state: &StateVector) -> EngineResult<OptimizationRun> {
        self.run(state, self.config.max_generations)
    }

    /// Tune a copy of the decay rates so the state reached after
    /// integrating `initial` over `[0, horizon]` scores higher.
    ///
    /// `system` is left untouched. Each objective evaluation integrates a
    /// full trajectory, so a generation costs `N + 1` trajectories.
    pub fn tune_decay_rates(
        &self,
        system: &DynamicsSystem,
        initial: &StateVector,
        horizon: f64,
        n_steps: usize,
        generations: usize,
    ) -> EngineResult<ParameterTuning> {
        if initial.dim() != system.dim() {
            return Err(EngineError::Config(format!(
                "initial state has {} components, system has {}",
                initial.dim(),
                system.dim()
            )));
        }
        let integrator = Integrator::default();
        let mut endpoint = |rates: &[f64]| -> EngineResult<f64> {
            let params = system.params().with_decay_rates(rates.to_vec())?;
            let trial = system.with_parameters(params)?;
            let last = integrator
                .integrate(initial, trial.derivative_fn(), (0.0, horizon), n_steps)?
                .final_state()?;
            Ok(objective(&last))
        };

        let (lo, hi) = DECAY_RATE_BOUNDS;
        let mut rates = system.params().decay_rates().to_vec();
        let mut current = endpoint(&rates)?;
        let mut history = Vec::with_capacity(generations);
        let mut converged = false;
        let mut warning_count = 0;

        for generation in 0..generations {
            let grad = gradient_forward(&rates, current, self.config.epsilon, &mut endpoint)?;
            let step = bounded_step(&grad, self.config.learning_rate);
            let next: Vec<f64> = rates
                .iter()
                .zip(&step)
                .map(|(b, d)| (b + d).clamp(lo, hi))
                .collect();
            let after = endpoint(&next)?;

            let record =
                self.record(generation, rates, next.clone(), current, after, Vec::new());
            warning_count += record.warnings.len();
            self.check_warning_limit(warning_count)?;
            let done = record.max_step() < self.config.tolerance;
            history.push(record);
            rates = next;
            current = after;
            if done {
                converged = true;
                break;
            }
        }

        Ok(ParameterTuning {
            parameters: system.params().with_decay_rates(rates)?,
            history,
            converged,
        })
    }

    fn record(
        &self,
        generation: usize,
        before: Vec<f64>,
        after: Vec<f64>,
        objective_before: f64,
        objective_after: f64,
        mut warnings: Vec<NumericWarning>,
    ) -> GenerationRecord {
        let delta = after.iter().zip(&before).map(|(a, b)| a - b).collect();
        let drop = objective_before - objective_after;
        if drop > self.config.monotonic_tolerance {
            log::debug!("generation {generation}: objective fell by {drop:.3e}");
            warnings.push(NumericWarning::non_monotonic(generation, drop));
        }
        GenerationRecord {
            generation,
            before,
            after,
            delta,
            objective_before,
            objective_after,
            improved: objective_after > objective_before,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equilibria_types::WarningKind;
    use std::sync::Arc;

    fn refs() -> Arc<ReferencePoints> {
        ReferencePoints::canonical().shared()
    }

    fn state(values: [f64; 4]) -> StateVector {
        StateVector::new(values.to_vec(), &refs()).unwrap()
    }

    #[test]
    fn test_objective_range() {
        let r = refs();
        for values in [[0.0; 4], [1.0; 4], [0.8, 0.8, 0.7, 0.85], [0.3, 0.9, 0.1, 0.6]] {
            let j = objective_of(&r, &values);
            assert!((0.0..=1.0).contains(&j), "J={j} for {values:?}");
        }
        // At the equilibrium J = x_d.
        assert!((objective(&StateVector::equilibrium(&r)) - 0.8).abs() < 1e-15);
    }

    #[test]
    fn test_gradient_points_toward_equilibrium() {
        let opt = SelfOptimizer::default();
        let g = opt.gradient(&state([0.5, 0.4, 0.3, 0.5]));
        assert!(g.iter().all(|&gi| gi > 0.0), "grad={g:?}");
        let g = opt.gradient(&state([0.5, 1.0, 1.0, 1.0]));
        assert!(g[0] > 0.0 && g[1] < 0.0 && g[2] < 0.0 && g[3] < 0.0, "grad={g:?}");
    }

    #[test]
    fn test_step_bounded() {
        let opt = SelfOptimizer::new(OptimizerConfig {
            learning_rate: 50.0,
            ..Default::default()
        })
        .unwrap();
        let (_, record) = opt.propose(&state([0.3, 0.3, 0.3, 0.3]), 0);
        assert!(record.max_step() <= MAX_STEP + 1e-12, "step {}", record.max_step());
    }

    #[test]
    fn test_lower_bound_enforced() {
        let opt = SelfOptimizer::default();
        let (next, record) = opt.propose(&state([0.0, 0.05, 0.1, 0.15]), 4);
        assert!(next.values().iter().all(|&v| v >= 0.2), "{:?}", next.values());
        let clamps: Vec<_> = record
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::Clamped)
            .collect();
        assert!(clamps.len() >= 3, "warnings: {:?}", record.warnings);
        assert!(clamps.iter().all(|w| w.step == 4 && w.value < 0.2));
    }

    #[test]
    fn test_far_state_improves() {
        let opt = SelfOptimizer::default();
        let run = opt.run(&state([0.4, 0.3, 0.3, 0.4]), 10).unwrap();
        assert_eq!(run.history.len(), 10);
        for rec in &run.history {
            assert!(rec.improved, "generation {} did not improve", rec.generation);
            assert!(rec.warnings.is_empty());
        }
        assert!(objective(&run.final_state) > run.history[0].objective_before);
    }

    #[test]
    fn test_propose_is_pure() {
        let opt = SelfOptimizer::default();
        let s = state([0.4, 0.5, 0.6, 0.3]);
        let a = opt.propose(&s, 3);
        let b = opt.propose(&s, 3);
        assert_eq!(a, b);
        assert_eq!(a.1.generation, 3);
        assert_eq!(a.1.before, s.values());
    }

    #[test]
    fn test_converges_with_loose_tolerance() {
        let opt = SelfOptimizer::new(OptimizerConfig {
            tolerance: 1.0,
            ..Default::default()
        })
        .unwrap();
        let run = opt.run(&state([0.4, 0.5, 0.6, 0.3]), 50).unwrap();
        assert!(run.converged);
        assert_eq!(run.history.len(), 1);
    }

    #[test]
    fn test_zero_generations() {
        let s = state([0.4, 0.5, 0.6, 0.3]);
        let run = SelfOptimizer::default().run(&s, 0).unwrap();
        assert!(run.history.is_empty());
        assert!(!run.converged);
        assert_eq!(run.final_state, s);
    }

    #[test]
    fn test_non_monotonic_flagged() {
        // At the equilibrium the forward difference sees only the rising
        // side of the cone and steps off it.
        let opt = SelfOptimizer::default();
        let (_, record) = opt.propose(&StateVector::equilibrium(&refs()), 0);
        assert!(record.objective_after < record.objective_before);
        assert!(!record.improved);
        assert_eq!(record.warnings.len(), 1);
        assert_eq!(record.warnings[0].kind, WarningKind::NonMonotonicObjective);
    }

    #[test]
    fn test_warning_limit_aborts_run() {
        let opt = SelfOptimizer::new(OptimizerConfig {
            warning_limit: Some(0),
            ..Default::default()
        })
        .unwrap();
        let err = opt.run(&StateVector::equilibrium(&refs()), 5);
        assert!(matches!(
            err,
            Err(EngineError::WarningLimitExceeded { count: 1, limit: 0 })
        ));
        // A clean ascent never reaches the limit.
        let run = opt.run(&state([0.4, 0.3, 0.3, 0.4]), 10).unwrap();
        assert_eq!(run.history.len(), 10);
    }

    #[test]
    fn test_warning_limit_aborts_tuning() {
        let opt = SelfOptimizer::new(OptimizerConfig {
            warning_limit: Some(0),
            ..Default::default()
        })
        .unwrap();
        let sys = DynamicsSystem::canonical();
        let initial = state([0.5, 0.4, 0.6, 0.7]);
        let unlimited = SelfOptimizer::default()
            .tune_decay_rates(&sys, &initial, 2.0, 11, 3)
            .unwrap();
        let flagged: usize = unlimited.history.iter().map(|r| r.warnings.len()).sum();
        let limited = opt.tune_decay_rates(&sys, &initial, 2.0, 11, 3);
        if flagged == 0 {
            assert_eq!(limited.unwrap(), unlimited);
        } else {
            assert!(matches!(
                limited,
                Err(EngineError::WarningLimitExceeded { limit: 0, .. })
            ));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(SelfOptimizer::new(OptimizerConfig {
            learning_rate: 0.0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_tune_decay_rates_works_on_copy() {
        let sys = DynamicsSystem::canonical();
        let original = sys.params().clone();
        let initial = state([0.5, 0.4, 0.6, 0.7]);
        let tuning = SelfOptimizer::default()
            .tune_decay_rates(&sys, &initial, 2.0, 11, 3)
            .unwrap();
        assert_eq!(sys.params(), &original);
        assert!(!tuning.history.is_empty() && tuning.history.len() <= 3);
        let (lo, hi) = DECAY_RATE_BOUNDS;
        for &b in tuning.parameters.decay_rates() {
            assert!((lo..=hi).contains(&b), "decay {b} outside [{lo}, {hi}]");
        }
        for rec in &tuning.history {
            assert_eq!(rec.before.len(), 4);
            assert!(rec.max_step() <= MAX_STEP + 1e-12);
        }
    }

    #[test]
    fn test_tune_decay_rates_propagates_config_error() {
        let sys = DynamicsSystem::canonical();
        let initial = state([0.5, 0.4, 0.6, 0.7]);
        let err = SelfOptimizer::default().tune_decay_rates(&sys, &initial, 0.0, 11, 3);
        assert!(matches!(err, Err(EngineError::Config(_))));
    }
}
