// ─────────────────────────────────────────────────────────────────────
// Equilibria — Construction API
// ─────────────────────────────────────────────────────────────────────
//! Free-standing constructors for callers that do not need the full
//! [`crate::Engine`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use equilibria_dynamics::{CouplingModel, Parameters, ReferencePoints, StateVector};
use equilibria_types::{EngineResult, ParameterConfig};

/// State from explicit values, or the equilibrium when `values` is `None`.
pub fn new_state(
    values: Option<Vec<f64>>,
    refs: &Arc<ReferencePoints>,
) -> EngineResult<StateVector> {
    match values {
        Some(v) => StateVector::new(v, refs),
        None => Ok(StateVector::equilibrium(refs)),
    }
}

/// State from a partial specification; missing components are derived.
pub fn new_partial_state(
    partial: &[Option<f64>],
    refs: &Arc<ReferencePoints>,
) -> EngineResult<StateVector> {
    StateVector::from_partial(partial, refs)
}

/// Coupling model sized by the matrix itself.
pub fn new_coupling_model(
    matrix: Vec<Vec<f64>>,
    rules: BTreeMap<(usize, usize), f64>,
) -> EngineResult<CouplingModel> {
    let n = matrix.len();
    CouplingModel::new(matrix, rules, n)
}

/// Parameters from a JSON object with keys `growth_rates`, `decay_rates`,
/// `saturation_constant`, `erosion_coefficient`.
///
/// Unknown keys are a configuration error; missing keys default.
pub fn new_parameters(config_map: &Map<String, Value>, n: usize) -> EngineResult<Parameters> {
    Parameters::from_config(&ParameterConfig::from_map(config_map)?, n)
}
