//! Errors surfaced while executing a rewritten function.
use crate::units::Unit;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A dimensional mismatch detected at transform time, deferred to the
    /// point the rewritten expression runs. Carries the offending unit pair
    /// as data so callers can inspect it programmatically.
    #[error("dimensional mismatch: received '{received}', expected '{expected}'")]
    DimensionalMismatch { received: Unit, expected: Unit },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown constant '{module}.{name}'")]
    UnknownConstant { module: String, name: String },

    #[error("calling '{name}': expected {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("value shape error: {0}")]
    Shape(String),
}
