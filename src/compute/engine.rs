//! Tree-walking interpreter for rewritten statement lists.
//!
//! By the time a body reaches the engine every conversion factor is already a
//! plain multiplication and every dimensional mismatch an explicit `Raise`
//! node, so evaluation is ordinary f64 arithmetic with scalar/series
//! broadcasting.

use super::error::EvalError;
use super::value::Value;
use crate::check::Workspace;
use crate::syntax::{BinOp, Expr, Stmt};
use smallvec::SmallVec;
use std::collections::HashMap;

type Frame = HashMap<String, Value>;

pub struct Engine<'a> {
    ws: &'a Workspace,
}

impl<'a> Engine<'a> {
    pub fn new(ws: &'a Workspace) -> Self {
        Self { ws }
    }

    /// Dispatches to a native builtin or an installed checked function.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        if let Some(f) = self.ws.builtins.get(name) {
            return f(args);
        }
        let Some(func) = self.ws.functions.get(name) else {
            return Err(EvalError::UnknownFunction(name.to_string()));
        };
        if func.params.len() != args.len() {
            return Err(EvalError::ArityMismatch {
                name: name.to_string(),
                expected: func.params.len(),
                actual: args.len(),
            });
        }

        let mut frame: Frame = func
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();

        for stmt in &func.body {
            match stmt {
                Stmt::Declare { name, value, .. } => {
                    let v = self.eval(&frame, value)?;
                    frame.insert(name.clone(), v);
                }
                Stmt::Assign { targets, value } => {
                    let v = self.eval(&frame, value)?;
                    if targets.len() == 1 {
                        frame.insert(targets[0].clone(), v);
                    } else {
                        let Value::Tuple(elems) = v else {
                            return Err(EvalError::Shape(format!(
                                "destructuring {} name(s) from a non-tuple value",
                                targets.len()
                            )));
                        };
                        if elems.len() != targets.len() {
                            return Err(EvalError::Shape(format!(
                                "destructuring {} name(s) from a tuple of {}",
                                targets.len(),
                                elems.len()
                            )));
                        }
                        for (target, elem) in targets.iter().zip(elems) {
                            frame.insert(target.clone(), elem);
                        }
                    }
                }
                Stmt::Expr(value) => {
                    self.eval(&frame, value)?;
                }
                Stmt::Return(value) => return self.eval(&frame, value),
                Stmt::Raise { received, expected } => {
                    return Err(EvalError::DimensionalMismatch {
                        received: received.clone(),
                        expected: expected.clone(),
                    })
                }
            }
        }
        // Body fell through without a return statement.
        Ok(Value::Tuple(Vec::new()))
    }

    fn eval(&self, frame: &Frame, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Num(v) => Ok(Value::Scalar(*v)),

            Expr::Name(n) => frame
                .get(n)
                .cloned()
                .ok_or_else(|| EvalError::UnknownVariable(n.clone())),

            Expr::Attr { module, name } => match self.ws.constants.get(module, name) {
                Some((value, _)) => Ok(Value::Scalar(*value)),
                None => Err(EvalError::UnknownConstant {
                    module: module.clone(),
                    name: name.clone(),
                }),
            },

            Expr::Neg(inner) => self.eval(frame, inner)?.map(|x| -x),

            Expr::Bin { op, left, right } => {
                let l = self.eval(frame, left)?;
                let r = self.eval(frame, right)?;
                match op {
                    BinOp::Add => l.zip_with(&r, |a, b| Ok(a + b)),
                    BinOp::Sub => l.zip_with(&r, |a, b| Ok(a - b)),
                    BinOp::Mul => l.zip_with(&r, |a, b| Ok(a * b)),
                    BinOp::Div => l.zip_with(&r, |a, b| {
                        if b == 0.0 {
                            Err(EvalError::DivisionByZero)
                        } else {
                            Ok(a / b)
                        }
                    }),
                    BinOp::Pow => l.zip_with(&r, |a, b| Ok(a.powf(b))),
                    BinOp::Lt => l.zip_with(&r, |a, b| Ok(if a < b { 1.0 } else { 0.0 })),
                    BinOp::Gt => l.zip_with(&r, |a, b| Ok(if a > b { 1.0 } else { 0.0 })),
                }
            }

            Expr::Call { callee, args } => {
                let mut values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len());
                for a in args {
                    values.push(self.eval(frame, a)?);
                }
                self.call(callee, &values)
            }

            Expr::Tuple(elems) => {
                let mut out = Vec::with_capacity(elems.len());
                for e in elems {
                    out.push(self.eval(frame, e)?);
                }
                Ok(Value::Tuple(out))
            }

            Expr::List(elems) => {
                let mut out = Vec::with_capacity(elems.len());
                for e in elems {
                    out.push(self.eval(frame, e)?.as_scalar()?);
                }
                Ok(Value::Series(out))
            }

            Expr::Raise { received, expected } => Err(EvalError::DimensionalMismatch {
                received: received.clone(),
                expected: expected.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::*;
    use crate::syntax::ReturnSpec;

    fn workspace_with(def: crate::syntax::FunctionDef) -> Workspace {
        let mut ws = Workspace::new();
        ws.transform(&def).unwrap();
        ws
    }

    #[test]
    fn series_arguments_broadcast_through_arithmetic() {
        let ws = workspace_with(function(
            "double_plus",
            vec![untyped_param("x"), untyped_param("y")],
            ReturnSpec::None,
            vec![ret(name("x") * num(2.0) + name("y"))],
        ));
        let out = ws
            .call(
                "double_plus",
                &[Value::Series(vec![1.0, 2.0, 3.0]), Value::Scalar(10.0)],
            )
            .unwrap();
        assert_eq!(out, Value::Series(vec![12.0, 14.0, 16.0]));
    }

    #[test]
    fn division_by_zero_is_reported() {
        let ws = workspace_with(function(
            "inverse",
            vec![untyped_param("x")],
            ReturnSpec::None,
            vec![ret(num(1.0) / name("x"))],
        ));
        let err = ws.call("inverse", &[Value::Scalar(0.0)]).unwrap_err();
        assert_eq!(err, EvalError::DivisionByZero);
    }

    #[test]
    fn list_literal_evaluates_to_a_series() {
        let ws = workspace_with(function(
            "range3",
            vec![],
            ReturnSpec::None,
            vec![ret(Expr::List(vec![num(1.0), num(2.0), num(3.0)]))],
        ));
        let out = ws.call("range3", &[]).unwrap();
        assert_eq!(out, Value::Series(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn comparison_yields_a_numeric_mask() {
        let ws = workspace_with(function(
            "positive",
            vec![untyped_param("x")],
            ReturnSpec::None,
            vec![ret(name("x").gt(num(0.0)))],
        ));
        let out = ws
            .call("positive", &[Value::Series(vec![-1.0, 0.0, 2.0])])
            .unwrap();
        assert_eq!(out, Value::Series(vec![0.0, 0.0, 1.0]));
    }

    #[test]
    fn body_without_return_yields_the_empty_tuple() {
        let ws = workspace_with(function(
            "silent",
            vec![untyped_param("x")],
            ReturnSpec::None,
            vec![assign("y", name("x") + num(1.0))],
        ));
        let out = ws.call("silent", &[Value::Scalar(1.0)]).unwrap();
        assert_eq!(out, Value::Tuple(Vec::new()));
    }

    #[test]
    fn unknown_function_is_reported() {
        let ws = Workspace::new();
        let err = ws.call("ghost", &[]).unwrap_err();
        assert_eq!(err, EvalError::UnknownFunction("ghost".to_string()));
    }
}
