// ─────────────────────────────────────────────────────────────────────
// Equilibria — Engine Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all engine failures.
///
/// Construction and configuration errors are fatal. Soft numeric
/// conditions (clamping, non-monotonic objective) are not errors: they
/// travel as [`crate::NumericWarning`] inside run histories and only become
/// `WarningLimitExceeded` when a caller opts into a limit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A component lies outside its declared bound at construction time.
    #[error("value {value} for dimension {dim} outside [0, {bound}]")]
    OutOfRange { dim: usize, value: f64, bound: f64 },

    /// Dimension mismatch, unknown key, or missing reference constant.
    #[error("config error: {0}")]
    Config(String),

    /// Zero equilibrium component (self-referential harmony undefined).
    #[error("division by zero: {0}")]
    DivisionByZero(String),

    /// Collapse requested on an empty candidate list.
    #[error("empty candidate set")]
    EmptyCandidateSet,

    /// Collapse weights sum to zero or are non-finite.
    #[error("degenerate superposition: {0}")]
    DegenerateSuperposition(String),

    /// Numerical error (NaN/Inf in an input).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Caller-configured limit on recoverable numeric warnings was hit.
    #[error("numeric warning limit exceeded: {count} warnings (limit {limit})")]
    WarningLimitExceeded { count: usize, limit: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;
