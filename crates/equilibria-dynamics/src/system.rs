// ─────────────────────────────────────────────────────────────────────
// Equilibria — Coupled Dynamics
// ─────────────────────────────────────────────────────────────────────
//! Harmony-coupled ODE right-hand side, in deviation form u = x - e:
//!
//!   dx_j/dt = -β_j u_j
//!           + Σ_{i≠j} α_ij C_ij(H) s(u_i)          (saturating growth)
//!           - [j = target] γ relu(u_src) relu(-u_chk)  (erosion)
//!
//!   s(u) = u K / (K + |u|),   H = 1 / (1 + |u|)
//!
//! The equilibrium is a fixed point. The right-hand side depends on the
//! state alone, so RK4 keeps its accuracy order.

use std::sync::Arc;

use equilibria_types::{EngineError, EngineResult};

use crate::coupling::CouplingModel;
use crate::params::{Parameters, EROSION_CHECK, EROSION_SOURCE, EROSION_TARGET};
use crate::reference::ReferencePoints;

/// Michaelis–Menten style saturation, odd and with unit slope at zero.
#[inline]
pub fn saturate(u: f64, k: f64) -> f64 {
    u * k / (k + u.abs())
}

/// Reference points + coupling + rates: everything the derivative needs.
#[derive(Debug, Clone)]
pub struct DynamicsSystem {
    refs: Arc<ReferencePoints>,
    coupling: CouplingModel,
    params: Parameters,
}

impl DynamicsSystem {
    pub fn new(
        refs: Arc<ReferencePoints>,
        coupling: CouplingModel,
        params: Parameters,
    ) -> EngineResult<Self> {
        let n = refs.dim();
        if coupling.dim() != n || params.dim() != n {
            return Err(EngineError::Config(format!(
                "dimension mismatch: references {n}, coupling {}, parameters {}",
                coupling.dim(),
                params.dim()
            )));
        }
        Ok(Self {
            refs,
            coupling,
            params,
        })
    }

    /// Canonical four-dimensional system.
    pub fn canonical() -> Self {
        Self {
            refs: ReferencePoints::canonical().shared(),
            coupling: CouplingModel::canonical(),
            params: Parameters::canonical(),
        }
    }

    /// Copy with different parameters (same references and coupling).
    pub fn with_parameters(&self, params: Parameters) -> EngineResult<Self> {
        Self::new(Arc::clone(&self.refs), self.coupling.clone(), params)
    }

    pub fn refs(&self) -> &Arc<ReferencePoints> {
        &self.refs
    }

    pub fn coupling(&self) -> &CouplingModel {
        &self.coupling
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn dim(&self) -> usize {
        self.refs.dim()
    }

    /// Right-hand side at raw component values `x`.
    ///
    /// Empty when `x` does not have [`DynamicsSystem::dim`] components; the
    /// integrator rejects that as a dimension mismatch.
    pub fn derivative(&self, x: &[f64]) -> Vec<f64> {
        let n = self.dim();
        if x.len() != n {
            return Vec::new();
        }
        let eq = self.refs.equilibrium();
        let h = self.refs.harmony_of(x);
        let k = self.params.saturation_constant();

        let u: Vec<f64> = x.iter().zip(eq).map(|(xi, ei)| xi - ei).collect();
        let s: Vec<f64> = u.iter().map(|&ui| saturate(ui, k)).collect();

        let mut dx = vec![0.0; n];
        for (j, d) in dx.iter_mut().enumerate() {
            let mut growth = 0.0;
            for i in (0..n).filter(|&i| i != j) {
                growth += self.params.growth(i, j)
                    * self.coupling.amplified_coefficient(i, j, h)
                    * s[i];
            }
            *d = -self.params.decay(j) * u[j] + growth;
        }

        if n > EROSION_CHECK {
            let gamma = self.params.erosion_coefficient();
            let excess = u[EROSION_SOURCE].max(0.0);
            let deficit = (-u[EROSION_CHECK]).max(0.0);
            dx[EROSION_TARGET] -= gamma * excess * deficit;
        }

        dx
    }

    /// Borrow the derivative as a closure for the integrator.
    pub fn derivative_fn(&self) -> impl Fn(&[f64]) -> Vec<f64> + '_ {
        move |x: &[f64]| self.derivative(x)
    }
}
