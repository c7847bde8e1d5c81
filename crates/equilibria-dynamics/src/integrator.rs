// ─────────────────────────────────────────────────────────────────────
// Equilibria — RK4 Integrator
// ─────────────────────────────────────────────────────────────────────
//! Fixed-step classic Runge–Kutta integrator:
//!
//!   k1 = f(x)
//!   k2 = f(x + dt/2 · k1)
//!   k3 = f(x + dt/2 · k2)
//!   k4 = f(x + dt · k3)
//!   x' = x + dt/6 · (k1 + 2k2 + 2k3 + k4)
//!
//! Every step is followed by clamping to the declared bounds. Clamps are
//! soft saturation events: recorded as warnings, never errors.

use std::iter::FusedIterator;

use equilibria_types::{
    EngineError, EngineResult, IntegratorConfig, NumericWarning, TrajectoryPoint,
};

use crate::state::StateVector;

fn axpy(x: &[f64], a: f64, k: &[f64]) -> Vec<f64> {
    x.iter().zip(k).map(|(xi, ki)| xi + a * ki).collect()
}

fn eval<F>(f: &F, x: &[f64]) -> EngineResult<Vec<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let k = f(x);
    if k.len() != x.len() {
        return Err(EngineError::Config(format!(
            "derivative returned {} components for a {}-dimensional state",
            k.len(),
            x.len()
        )));
    }
    Ok(k)
}

/// One unclamped RK4 step on raw component values.
pub fn rk4_raw<F>(x: &[f64], f: &F, dt: f64) -> EngineResult<Vec<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let k1 = eval(f, x)?;
    let k2 = eval(f, &axpy(x, 0.5 * dt, &k1))?;
    let k3 = eval(f, &axpy(x, 0.5 * dt, &k2))?;
    let k4 = eval(f, &axpy(x, dt, &k3))?;
    Ok(x.iter()
        .enumerate()
        .map(|(i, xi)| xi + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
        .collect())
}

/// Fixed-step RK4 integrator with post-step clamping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator {
    warning_limit: Option<usize>,
}

impl Integrator {
    pub fn new(config: IntegratorConfig) -> Self {
        Self {
            warning_limit: config.warning_limit,
        }
    }

    pub fn warning_limit(&self) -> Option<usize> {
        self.warning_limit
    }

    /// Advance `state` by one RK4 step of size `dt`.
    ///
    /// `derivative_fn` must be a pure function of the state.
    pub fn step<F>(
        &self,
        state: &StateVector,
        derivative_fn: F,
        dt: f64,
    ) -> EngineResult<StateVector>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        self.step_recorded(state, &derivative_fn, dt, 0)
            .map(|(next, _)| next)
    }

    /// Like [`Integrator::step`], also returning the clamp warnings.
    pub fn step_recorded<F>(
        &self,
        state: &StateVector,
        derivative_fn: &F,
        dt: f64,
        step: usize,
    ) -> EngineResult<(StateVector, Vec<NumericWarning>)>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        if !dt.is_finite() {
            return Err(EngineError::Config(format!("dt must be finite, got {dt}")));
        }
        let raw = rk4_raw(state.values(), derivative_fn, dt)?;
        Ok(StateVector::from_clamped(raw, state.refs(), step))
    }

    /// Lazy trajectory of `n_steps` samples over `t_span`.
    ///
    /// Samples are evenly spaced, the first is `(t0, initial)` and the last
    /// lands on `t1`. The derivative is evaluated once at `initial` to check
    /// its shape; the steps themselves run only when the trajectory is
    /// iterated, and each iteration restarts from `initial`.
    pub fn integrate<F>(
        &self,
        initial: &StateVector,
        derivative_fn: F,
        t_span: (f64, f64),
        n_steps: usize,
    ) -> EngineResult<Trajectory<F>>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let (t0, t1) = t_span;
        if !(t0.is_finite() && t1.is_finite()) {
            return Err(EngineError::Config(format!(
                "t_span must be finite, got ({t0}, {t1})"
            )));
        }
        if n_steps == 0 {
            return Err(EngineError::Config("n_steps must be >= 1".to_string()));
        }
        if n_steps > 1 && t1 <= t0 {
            return Err(EngineError::Config(format!(
                "t_span end {t1} must exceed start {t0}"
            )));
        }
        eval(&derivative_fn, initial.values())?;
        let dt = if n_steps > 1 {
            (t1 - t0) / (n_steps - 1) as f64
        } else {
            0.0
        };
        Ok(Trajectory {
            initial: initial.clone(),
            derivative_fn,
            t0,
            t1,
            dt,
            n_steps,
            warning_limit: self.warning_limit,
        })
    }
}

/// A restartable, finite sequence of `(t, state)` samples.
pub struct Trajectory<F> {
    initial: StateVector,
    derivative_fn: F,
    t0: f64,
    t1: f64,
    dt: f64,
    n_steps: usize,
    warning_limit: Option<usize>,
}

impl<F> Trajectory<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    pub fn iter(&self) -> TrajectoryIter<'_, F> {
        TrajectoryIter {
            trajectory: self,
            index: 0,
            current: None,
            warnings: Vec::new(),
            done: false,
        }
    }

    pub fn len(&self) -> usize {
        self.n_steps
    }

    pub fn is_empty(&self) -> bool {
        self.n_steps == 0
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn initial(&self) -> &StateVector {
        &self.initial
    }

    /// Run to the end and return the last state.
    pub fn final_state(&self) -> EngineResult<StateVector> {
        let mut last = self.initial.clone();
        for item in self.iter() {
            last = item?.1;
        }
        Ok(last)
    }

    /// Run to the end as plain serialisable samples plus all warnings.
    pub fn points(&self) -> EngineResult<(Vec<TrajectoryPoint>, Vec<NumericWarning>)> {
        let mut iter = self.iter();
        let mut points = Vec::with_capacity(self.n_steps);
        for item in iter.by_ref() {
            let (t, state) = item?;
            points.push(TrajectoryPoint {
                t,
                values: state.into_values(),
            });
        }
        Ok((points, iter.into_warnings()))
    }
}

impl<'a, F> IntoIterator for &'a Trajectory<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    type Item = EngineResult<(f64, StateVector)>;
    type IntoIter = TrajectoryIter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over a [`Trajectory`].
pub struct TrajectoryIter<'a, F> {
    trajectory: &'a Trajectory<F>,
    index: usize,
    current: Option<StateVector>,
    warnings: Vec<NumericWarning>,
    done: bool,
}

impl<F> TrajectoryIter<'_, F> {
    /// Warnings accumulated so far in this pass.
    pub fn warnings(&self) -> &[NumericWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<NumericWarning> {
        self.warnings
    }
}

impl<F> Iterator for TrajectoryIter<'_, F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    type Item = EngineResult<(f64, StateVector)>;

    fn next(&mut self) -> Option<Self::Item> {
        let traj = self.trajectory;
        if self.done || self.index >= traj.n_steps {
            return None;
        }

        let prev = match self.current.take() {
            None => {
                self.current = Some(traj.initial.clone());
                self.index = 1;
                return Some(Ok((traj.t0, traj.initial.clone())));
            }
            Some(prev) => prev,
        };

        let raw = match rk4_raw(prev.values(), &traj.derivative_fn, traj.dt) {
            Ok(raw) => raw,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let (next, warnings) = StateVector::from_clamped(raw, prev.refs(), self.index);
        self.warnings.extend(warnings);

        if let Some(limit) = traj.warning_limit {
            if self.warnings.len() > limit {
                log::warn!(
                    "trajectory aborted at step {}: {} numeric warnings (limit {limit})",
                    self.index,
                    self.warnings.len()
                );
                self.done = true;
                return Some(Err(EngineError::WarningLimitExceeded {
                    count: self.warnings.len(),
                    limit,
                }));
            }
        }

        let t = if self.index + 1 == traj.n_steps {
            traj.t1
        } else {
            traj.t0 + self.index as f64 * traj.dt
        };
        self.index += 1;
        self.current = Some(next.clone());
        Some(Ok((t, next)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.done {
            0
        } else {
            self.trajectory.n_steps - self.index
        };
        (0, Some(remaining))
    }
}

impl<F> FusedIterator for TrajectoryIter<'_, F> where F: Fn(&[f64]) -> Vec<f64> {}
