//! The unit compiler: statically walks a function's statement tree, infers
//! the physical unit of every expression, inserts conversion factors where
//! units differ but are compatible, and injects deferred dimensional errors
//! where they are not.
pub mod error;
pub mod infer;
pub mod rewrite;
pub mod signatures;
pub mod symbols;
pub mod transform;

pub use error::CheckError;
pub use infer::{InferredUnit, TypedExpr};
pub use signatures::{FunctionSignature, ParamSignature, ReturnUnits, SignatureRegistry};
pub use symbols::{ConstantTable, SymbolTable};
pub use transform::{CheckedFunction, Workspace};

use serde::{Deserialize, Serialize};

/// What unit an untyped numeric literal carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LiteralPolicy {
    /// Literals are `dimensionless` quantities and take part in checking.
    #[default]
    Dimensionless,
    /// Literals have no known unit; expressions containing them are left
    /// unverified.
    Unknown,
}

/// How an operand with unknown unit is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnknownPolicy {
    /// Propagate `unknown` and disable checking for the containing
    /// expression; the gap is logged.
    #[default]
    Propagate,
    /// Fail the transformation with [`CheckError::Unverifiable`].
    Fail,
}

/// Strictness configuration for a transformation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckOptions {
    pub literals: LiteralPolicy,
    pub on_unknown: UnknownPolicy,
}
