//! Native callables reachable from checked functions.
//!
//! Two kinds live here: unmodeled math primitives (`maximum`, `sqrt`, ...)
//! whose result unit the checker treats as unknown, and modeled natives
//! (the geodesy pair) that register a full unit signature alongside their
//! implementation.

use super::error::EvalError;
use super::value::Value;
use std::collections::HashMap;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, EvalError>;

#[derive(Default)]
pub struct BuiltinTable {
    map: HashMap<&'static str, BuiltinFn>,
}

impl BuiltinTable {
    /// Table pre-populated with the math primitives.
    pub fn standard() -> Self {
        let mut table = Self::default();
        table.insert("maximum", maximum);
        table.insert("minimum", minimum);
        table.insert("sqrt", sqrt);
        table.insert("exp", exp);
        table.insert("log", log);
        table.insert("where_select", where_select);
        table
    }

    pub fn insert(&mut self, name: &'static str, f: BuiltinFn) {
        self.map.insert(name, f);
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.map.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn maximum(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("maximum", args, 2)?;
    args[0].zip_with(&args[1], |a, b| Ok(a.max(b)))
}

fn minimum(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("minimum", args, 2)?;
    args[0].zip_with(&args[1], |a, b| Ok(a.min(b)))
}

fn sqrt(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("sqrt", args, 1)?;
    args[0].map(f64::sqrt)
}

fn exp(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("exp", args, 1)?;
    args[0].map(f64::exp)
}

fn log(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("log", args, 1)?;
    args[0].map(f64::ln)
}

fn where_select(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("where_select", args, 3)?;
    Value::select(&args[0], &args[1], &args[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximum_broadcasts() {
        let table = BuiltinTable::standard();
        let f = table.get("maximum").unwrap();
        let out = f(&[
            Value::Series(vec![1.0, 5.0, 3.0]),
            Value::Scalar(2.0),
        ])
        .unwrap();
        assert_eq!(out, Value::Series(vec![2.0, 5.0, 3.0]));
    }

    #[test]
    fn wrong_arity_is_reported() {
        let table = BuiltinTable::standard();
        let f = table.get("sqrt").unwrap();
        let err = f(&[Value::Scalar(1.0), Value::Scalar(2.0)]).unwrap_err();
        assert!(matches!(err, EvalError::ArityMismatch { expected: 1, actual: 2, .. }));
    }
}
