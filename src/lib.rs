//! Unit-checking rewriter for physical formulas.
//!
//! A formula is written once as a small expression tree with unit
//! annotations (`tas: "kts"`, `h: "ft"`). Transforming it walks the tree,
//! infers the physical unit of every sub-expression, inserts the scale
//! factors the arithmetic needs, and replaces provably incoherent
//! expressions with deferred errors that fire only if that code path runs.
//! The rewritten function then executes as plain `f64` arithmetic with
//! scalar/series broadcasting.
//!
//! ```
//! use aerocheck::check::Workspace;
//! use aerocheck::compute::Value;
//! use aerocheck::syntax::build::*;
//!
//! let mut ws = Workspace::new();
//! ws.transform(&function(
//!     "to_feet",
//!     vec![param("x", "m")],
//!     returns("ft"),
//!     vec![declare("y", "ft", name("x")), ret(name("y"))],
//! ))
//! .unwrap();
//!
//! let y = ws.call("to_feet", &[Value::Scalar(1000.0)]).unwrap();
//! assert!((y.as_scalar().unwrap() - 3280.84).abs() < 0.01);
//! ```

pub mod check;
pub mod compute;
pub mod formulas;
pub mod syntax;
pub mod units;

pub use check::{CheckError, CheckOptions, LiteralPolicy, UnknownPolicy, Workspace};
pub use compute::{EvalError, Value};
pub use formulas::standard_workspace;
pub use syntax::FunctionDef;
pub use units::{Unit, UnitError, UnitRegistry};
