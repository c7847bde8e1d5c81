// ─────────────────────────────────────────────────────────────────────
// Equilibria — Superposition
// ─────────────────────────────────────────────────────────────────────

use num_complex::Complex64;
use rand::Rng;

use equilibria_dynamics::StateVector;
use equilibria_types::{EngineError, EngineResult};

use crate::selector::{Candidate, Collapsed, CollapseSelector};

/// Owned candidate set with amplitudes normalised to Σ|a|² = 1.
///
/// Consumed by [`Superposition::collapse`]: once observed it is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    candidates: Vec<Candidate>,
}

impl Superposition {
    pub fn new(candidates: Vec<Candidate>) -> EngineResult<Self> {
        let mut sp = Self { candidates };
        sp.renormalize()?;
        Ok(sp)
    }

    /// Add a candidate and renormalise.
    pub fn push(&mut self, state: StateVector, amplitude: Complex64) -> EngineResult<()> {
        self.candidates.push(Candidate::new(state, amplitude));
        if let Err(e) = self.renormalize() {
            self.candidates.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Σ|a|², 1.0 up to rounding.
    pub fn norm_sqr(&self) -> f64 {
        self.candidates.iter().map(|c| c.amplitude.norm_sqr()).sum()
    }

    pub fn probabilities(&self) -> EngineResult<Vec<f64>> {
        CollapseSelector::new().probabilities(&self.candidates)
    }

    pub fn collapse<R: Rng + ?Sized>(self, rng: &mut R) -> EngineResult<Collapsed> {
        CollapseSelector::new().collapse(&self.candidates, rng)
    }

    pub fn collapse_seeded(self, seed: u64) -> EngineResult<Collapsed> {
        CollapseSelector::new().collapse_seeded(&self.candidates, seed)
    }

    fn renormalize(&mut self) -> EngineResult<()> {
        if self.candidates.is_empty() {
            return Err(EngineError::EmptyCandidateSet);
        }
        let norm = self.norm_sqr().sqrt();
        if !norm.is_finite() || norm <= 0.0 {
            return Err(EngineError::DegenerateSuperposition(format!(
                "amplitude norm is {norm}"
            )));
        }
        for c in &mut self.candidates {
            c.amplitude /= norm;
        }
        Ok(())
    }
}
