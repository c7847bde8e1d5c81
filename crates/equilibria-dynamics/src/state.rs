// ─────────────────────────────────────────────────────────────────────
// Equilibria — State Vector
// ─────────────────────────────────────────────────────────────────────
//! Bounded N-dimensional state and its derived metrics.

use std::sync::Arc;

use rand::Rng;

use equilibria_types::{clamp_component, EngineError, EngineResult, NumericWarning};

use crate::reference::{euclidean, ReferencePoints};

/// A point in the bounded state space.
///
/// Every component is finite and inside `[0, upper_bound_i]`. Only the
/// integrator, optimizer and collective coordinator produce new states
/// from existing ones.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    values: Vec<f64>,
    refs: Arc<ReferencePoints>,
}

impl StateVector {
    /// Build from explicit component values.
    pub fn new(values: Vec<f64>, refs: &Arc<ReferencePoints>) -> EngineResult<Self> {
        if values.len() != refs.dim() {
            return Err(EngineError::Config(format!(
                "state has {} components, reference points have {}",
                values.len(),
                refs.dim()
            )));
        }
        for (dim, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(EngineError::Numerical(format!(
                    "component {dim} is {value}"
                )));
            }
            let bound = refs.upper_bound(dim);
            if !(0.0..=bound).contains(&value) {
                return Err(EngineError::OutOfRange { dim, value, bound });
            }
        }
        Ok(Self {
            values,
            refs: Arc::clone(refs),
        })
    }

    /// Build from a partial specification.
    ///
    /// Supplied components are validated as in [`StateVector::new`]. Each
    /// missing component is the equilibrium value scaled by the mean ratio
    /// `x_i / e_i` of the supplied components, clamped to its bound. With
    /// nothing supplied the result is the equilibrium.
    pub fn from_partial(
        partial: &[Option<f64>],
        refs: &Arc<ReferencePoints>,
    ) -> EngineResult<Self> {
        if partial.len() != refs.dim() {
            return Err(EngineError::Config(format!(
                "partial state has {} slots, reference points have {}",
                partial.len(),
                refs.dim()
            )));
        }
        let eq = refs.equilibrium();
        let (sum, count) = partial
            .iter()
            .zip(eq)
            .filter_map(|(p, &e)| p.map(|v| v / e))
            .fold((0.0, 0usize), |(s, c), r| (s + r, c + 1));
        let ratio = if count == 0 { 1.0 } else { sum / count as f64 };
        let values = partial
            .iter()
            .enumerate()
            .map(|(i, p)| match p {
                Some(v) => *v,
                None => clamp_component(eq[i] * ratio, 0.0, refs.upper_bound(i)),
            })
            .collect();
        Self::new(values, refs)
    }

    /// The equilibrium point itself.
    pub fn equilibrium(refs: &Arc<ReferencePoints>) -> Self {
        Self {
            values: refs.equilibrium().to_vec(),
            refs: Arc::clone(refs),
        }
    }

    /// The anchor point itself.
    pub fn anchor(refs: &Arc<ReferencePoints>) -> Self {
        Self {
            values: refs.anchor().to_vec(),
            refs: Arc::clone(refs),
        }
    }

    /// Uniform sample inside the bounds from a caller-owned RNG.
    pub fn random<R: Rng + ?Sized>(refs: &Arc<ReferencePoints>, rng: &mut R) -> Self {
        let values = refs
            .upper_bounds()
            .iter()
            .map(|&b| rng.gen::<f64>() * b)
            .collect();
        Self {
            values,
            refs: Arc::clone(refs),
        }
    }

    /// Build from unchecked values, clamping each component into bounds.
    ///
    /// Every clamp is returned as a recoverable warning tagged with `step`.
    pub fn from_clamped(
        values: Vec<f64>,
        refs: &Arc<ReferencePoints>,
        step: usize,
    ) -> (Self, Vec<NumericWarning>) {
        Self::from_clamped_within(values, refs, 0.0, step)
    }

    /// Like [`StateVector::from_clamped`] with a raised lower bound.
    pub fn from_clamped_within(
        mut values: Vec<f64>,
        refs: &Arc<ReferencePoints>,
        lower: f64,
        step: usize,
    ) -> (Self, Vec<NumericWarning>) {
        debug_assert_eq!(values.len(), refs.dim());
        let mut warnings = Vec::new();
        for (dim, v) in values.iter_mut().enumerate() {
            let hi = refs.upper_bound(dim);
            let lo = lower.min(hi);
            let raw = *v;
            if !raw.is_finite() {
                warnings.push(NumericWarning::non_finite(step, dim, raw));
            } else if raw < lo || raw > hi {
                log::debug!("step {step}: dimension {dim} = {raw:.6} clamped to [{lo}, {hi}]");
                warnings.push(NumericWarning::clamped(step, dim, raw));
            }
            *v = clamp_component(raw, lo, hi);
        }
        (
            Self {
                values,
                refs: Arc::clone(refs),
            },
            warnings,
        )
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn refs(&self) -> &Arc<ReferencePoints> {
        &self.refs
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.values[i]
    }

    /// Value of the distinguished dimension.
    pub fn distinguished_value(&self) -> f64 {
        self.values[self.refs.distinguished()]
    }

    /// Euclidean distance to an arbitrary reference point.
    pub fn distance_to(&self, reference: &[f64]) -> f64 {
        euclidean(&self.values, reference)
    }

    pub fn distance_to_equilibrium(&self) -> f64 {
        self.distance_to(self.refs.equilibrium())
    }

    pub fn distance_to_anchor(&self) -> f64 {
        self.distance_to(self.refs.anchor())
    }

    /// `1 / (1 + distance to equilibrium)`, always in (0, 1].
    pub fn harmony(&self) -> f64 {
        self.refs.harmony_of(&self.values)
    }

    /// `Π x_i / Π e_i`; unbounded above.
    ///
    /// Total because reference points reject zero equilibrium components.
    pub fn self_referential_harmony(&self) -> f64 {
        let num: f64 = self.values.iter().product();
        let den: f64 = self.refs.equilibrium().iter().product();
        num / den
    }
}
