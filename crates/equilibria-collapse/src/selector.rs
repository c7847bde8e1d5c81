// ─────────────────────────────────────────────────────────────────────
// Equilibria — Collapse Selector
// ─────────────────────────────────────────────────────────────────────
//! Harmony-weighted selection among candidate states:
//!
//!   p_k = |a_k|² · H_k / Σ_i |a_i|² · H_i
//!
//! Randomness always comes from the caller, either as an RNG or as a
//! seed for a portable ChaCha8 stream.

use num_complex::Complex64;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use equilibria_dynamics::StateVector;
use equilibria_types::{EngineError, EngineResult};

/// A candidate state with its complex amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub state: StateVector,
    pub amplitude: Complex64,
}

impl Candidate {
    pub fn new(state: StateVector, amplitude: Complex64) -> Self {
        Self { state, amplitude }
    }

    /// Unnormalised selection weight `|a|² · H`.
    pub fn weight(&self) -> f64 {
        self.amplitude.norm_sqr() * self.state.harmony()
    }
}

/// Outcome of a collapse.
#[derive(Debug, Clone, PartialEq)]
pub struct Collapsed {
    /// Position of the chosen candidate in the input.
    pub index: usize,
    pub state: StateVector,
    /// Probability the chosen candidate had.
    pub probability: f64,
}

/// Stateless harmony-weighted selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseSelector;

impl CollapseSelector {
    pub fn new() -> Self {
        Self
    }

    /// Selection probability of every candidate, in input order.
    pub fn probabilities(&self, candidates: &[Candidate]) -> EngineResult<Vec<f64>> {
        let weights = weights(candidates)?;
        let total: f64 = weights.iter().sum();
        Ok(weights.iter().map(|w| w / total).collect())
    }

    /// Draw one candidate using the caller's RNG.
    pub fn collapse<R: Rng + ?Sized>(
        &self,
        candidates: &[Candidate],
        rng: &mut R,
    ) -> EngineResult<Collapsed> {
        let weights = weights(candidates)?;
        let total: f64 = weights.iter().sum();
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| EngineError::DegenerateSuperposition(e.to_string()))?;
        let index = dist.sample(rng);
        log::trace!("collapse: picked {index} of {}", candidates.len());
        Ok(Collapsed {
            index,
            state: candidates[index].state.clone(),
            probability: weights[index] / total,
        })
    }

    /// Draw one candidate from a ChaCha8 stream seeded with `seed`.
    pub fn collapse_seeded(&self, candidates: &[Candidate], seed: u64) -> EngineResult<Collapsed> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.collapse(candidates, &mut rng)
    }
}

fn weights(candidates: &[Candidate]) -> EngineResult<Vec<f64>> {
    if candidates.is_empty() {
        return Err(EngineError::EmptyCandidateSet);
    }
    let weights: Vec<f64> = candidates.iter().map(Candidate::weight).collect();
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(EngineError::DegenerateSuperposition(format!(
            "total weight is {total}"
        )));
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use equilibria_dynamics::ReferencePoints;
    use std::sync::Arc;

    fn refs() -> Arc<ReferencePoints> {
        ReferencePoints::canonical().shared()
    }

    fn pair() -> Vec<Candidate> {
        let s = StateVector::new(vec![0.5, 0.5, 0.5, 0.5], &refs()).unwrap();
        vec![
            Candidate::new(s.clone(), Complex64::new(0.6, 0.0)),
            Candidate::new(s, Complex64::new(0.0, 0.8)),
        ]
    }

    #[test]
    fn test_empty_candidates() {
        let sel = CollapseSelector::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            sel.collapse(&[], &mut rng).unwrap_err(),
            EngineError::EmptyCandidateSet
        );
        assert!(sel.probabilities(&[]).is_err());
    }

    #[test]
    fn test_zero_amplitudes_degenerate() {
        let s = StateVector::equilibrium(&refs());
        let cands = vec![
            Candidate::new(s.clone(), Complex64::new(0.0, 0.0)),
            Candidate::new(s, Complex64::new(0.0, 0.0)),
        ];
        let err = CollapseSelector::new().collapse_seeded(&cands, 1);
        assert!(matches!(err, Err(EngineError::DegenerateSuperposition(_))));
    }

    #[test]
    fn test_non_finite_amplitude_degenerate() {
        let s = StateVector::equilibrium(&refs());
        let cands = vec![Candidate::new(s, Complex64::new(f64::NAN, 0.0))];
        let err = CollapseSelector::new().probabilities(&cands);
        assert!(matches!(err, Err(EngineError::DegenerateSuperposition(_))));
    }

    #[test]
    fn test_probabilities_equal_harmony() {
        let p = CollapseSelector::new().probabilities(&pair()).unwrap();
        assert!((p[0] - 0.36).abs() < 1e-12, "p0={}", p[0]);
        assert!((p[1] - 0.64).abs() < 1e-12, "p1={}", p[1]);
    }

    #[test]
    fn test_harmony_tilts_probabilities() {
        let r = refs();
        let near = StateVector::equilibrium(&r);
        let far = StateVector::new(vec![0.0; 4], &r).unwrap();
        let a = Complex64::new(1.0, 0.0);
        let p = CollapseSelector::new()
            .probabilities(&[Candidate::new(near, a), Candidate::new(far, a)])
            .unwrap();
        assert!(p[0] > p[1], "p={p:?}");
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_deterministic() {
        let sel = CollapseSelector::new();
        let cands = pair();
        for seed in 0..20 {
            let a = sel.collapse_seeded(&cands, seed).unwrap();
            let b = sel.collapse_seeded(&cands, seed).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_distribution_matches_born_weights() {
        let sel = CollapseSelector::new();
        let cands = pair();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let draws = 100_000;
        let mut hits = [0usize; 2];
        for _ in 0..draws {
            hits[sel.collapse(&cands, &mut rng).unwrap().index] += 1;
        }
        let f0 = hits[0] as f64 / draws as f64;
        let f1 = hits[1] as f64 / draws as f64;
        assert!((f0 - 0.36).abs() < 0.01, "f0={f0}");
        assert!((f1 - 0.64).abs() < 0.01, "f1={f1}");
    }

    #[test]
    fn test_single_candidate_certain() {
        let s = StateVector::equilibrium(&refs());
        let cands = vec![Candidate::new(s.clone(), Complex64::new(0.3, 0.4))];
        let out = CollapseSelector::new().collapse_seeded(&cands, 9).unwrap();
        assert_eq!(out.index, 0);
        assert_eq!(out.state, s);
        assert!((out.probability - 1.0).abs() < 1e-12);
    }
}
