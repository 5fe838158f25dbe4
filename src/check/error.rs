//! Transform-time errors. Any of these aborts installing the rewritten
//! function; dimensional mismatches are *not* among them — those are
//! deferred into the rewritten code (see `compute::EvalError`).
use crate::units::UnitError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    /// A referenced name has no resolvable unit anywhere (strict mode only;
    /// the permissive mode downgrades this to a logged `unknown`).
    #[error("no unit known for '{name}'")]
    UndefinedUnit { name: String },

    /// Strict mode met an operand whose unit could not be determined.
    #[error("cannot verify units of {context}")]
    Unverifiable { context: String },

    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Re-transforming an installed function would double-apply conversions.
    #[error("function '{name}' is already transformed")]
    AlreadyTransformed { name: String },

    /// A statement or expression shape the inference rules do not cover.
    #[error("unsupported construct: {detail}")]
    Unsupported { detail: String },
}
