// ─────────────────────────────────────────────────────────────────────
// Equilibria — Collective Metrics
// ─────────────────────────────────────────────────────────────────────
//! Synchrony S = 1 / (1 + mean_d Var_agents(x_d)) ∈ (0, 1].
//!
//! Collective objective = mean(J) · S² · N.

use equilibria_dynamics::{objective, StateVector};

/// Component-wise mean over states. Empty input gives an empty vector.
pub fn mean_state<'a, I>(states: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a StateVector>,
{
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0usize;
    for s in states {
        if sum.is_empty() {
            sum = vec![0.0; s.dim()];
        }
        for (acc, v) in sum.iter_mut().zip(s.values()) {
            *acc += v;
        }
        count += 1;
    }
    if count > 0 {
        let inv = 1.0 / count as f64;
        sum.iter_mut().for_each(|v| *v *= inv);
    }
    sum
}

/// `1 / (1 + mean population variance across dimensions)`.
///
/// Identical states give exactly 1.0.
pub fn synchrony(states: &[&StateVector]) -> f64 {
    if states.is_empty() {
        return 1.0;
    }
    let mean = mean_state(states.iter().copied());
    let n = states.len() as f64;
    let total_var: f64 = mean
        .iter()
        .enumerate()
        .map(|(d, m)| states.iter().map(|s| (s.get(d) - m).powi(2)).sum::<f64>() / n)
        .sum();
    1.0 / (1.0 + total_var / mean.len().max(1) as f64)
}

/// Mean individual objective over the agents.
pub fn mean_objective(states: &[&StateVector]) -> f64 {
    if states.is_empty() {
        return 0.0;
    }
    states.iter().map(|s| objective(s)).sum::<f64>() / states.len() as f64
}

/// `mean_objective · synchrony² · N`.
pub fn collective_objective(states: &[&StateVector]) -> f64 {
    let s = synchrony(states);
    mean_objective(states) * s * s * states.len() as f64
}
