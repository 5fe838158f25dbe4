//! Execution of rewritten function bodies: values, builtins and the
//! interpreter. Purely numeric; all unit knowledge was compiled into the
//! statement list beforehand.
pub mod builtins;
pub mod engine;
pub mod error;
pub mod value;

pub use builtins::BuiltinTable;
pub use error::EvalError;
pub use value::Value;
