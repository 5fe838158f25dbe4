//! The statement rewriter: transforms one statement at a time, threading the
//! symbol table forward in source order.

use super::error::CheckError;
use super::infer::{infer, scaled, InferCtx, InferredUnit};
use super::signatures::ReturnUnits;
use super::symbols::SymbolTable;
use super::UnknownPolicy;
use crate::syntax::{Expr, Stmt};
use crate::units::Unit;
use tracing::{debug, warn};

/// Outcome of checking a value expression against a declared unit.
enum Coerced {
    /// Units already agree (or the value is an untyped literal being tagged).
    Kept(Expr),
    /// Compatible but different: value rescaled into the declared unit.
    Converted(Expr),
    /// Incompatible dimensions.
    Mismatch { received: Unit, expected: Unit },
}

pub(crate) struct Rewriter<'a> {
    ctx: InferCtx<'a>,
    symbols: SymbolTable,
    returns: Option<&'a ReturnUnits>,
    fname: &'a str,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(
        ctx: InferCtx<'a>,
        symbols: SymbolTable,
        returns: Option<&'a ReturnUnits>,
        fname: &'a str,
    ) -> Self {
        Self {
            ctx,
            symbols,
            returns,
            fname,
        }
    }

    /// Rewrites a whole body, collecting every statement's errors. Any error
    /// aborts installation of the function.
    pub(crate) fn rewrite_body(&mut self, body: &[Stmt]) -> Result<Vec<Stmt>, Vec<CheckError>> {
        let mut out = Vec::with_capacity(body.len());
        let mut errors = Vec::new();
        for stmt in body {
            match self.rewrite_stmt(stmt) {
                Ok(s) => out.push(s),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }

    fn rewrite_stmt(&mut self, stmt: &Stmt) -> Result<Stmt, CheckError> {
        match stmt {
            Stmt::Declare {
                name,
                annotation,
                value,
            } => {
                let declared = annotation.unit();
                let t = infer(&self.ctx, &self.symbols, value)?;
                let rewritten = match &t.unit {
                    InferredUnit::Unknown => {
                        warn!(function = self.fname, name = %name, declared = %declared,
                              "cannot verify declaration; accepting as-is");
                        Stmt::Declare {
                            name: name.clone(),
                            annotation: annotation.clone(),
                            value: t.expr,
                        }
                    }
                    InferredUnit::Tuple(_) => {
                        return Err(CheckError::Unsupported {
                            detail: format!("tuple value in annotated declaration of '{}'", name),
                        })
                    }
                    InferredUnit::Single(inferred) => {
                        match self.coerce(t.expr, inferred, &declared)? {
                            Coerced::Kept(e) | Coerced::Converted(e) => Stmt::Declare {
                                name: name.clone(),
                                annotation: annotation.clone(),
                                value: e,
                            },
                            Coerced::Mismatch { received, expected } => {
                                Stmt::Raise { received, expected }
                            }
                        }
                    }
                };
                // Bind the declared contract regardless of the outcome so
                // later statements check against the declaration.
                self.symbols
                    .bind(name.clone(), InferredUnit::Single(declared));
                Ok(rewritten)
            }

            Stmt::Assign { targets, value } => {
                let t = infer(&self.ctx, &self.symbols, value)?;
                if targets.len() == 1 {
                    self.symbols.bind(targets[0].clone(), t.unit.clone());
                    return Ok(Stmt::Assign {
                        targets: targets.clone(),
                        value: t.expr,
                    });
                }
                match &t.unit {
                    InferredUnit::Tuple(units) if units.len() == targets.len() => {
                        for (target, unit) in targets.iter().zip(units) {
                            self.symbols.bind(target.clone(), unit.clone());
                        }
                    }
                    InferredUnit::Unknown => {
                        warn!(function = self.fname, targets = ?targets,
                              "destructuring a value with unknown units");
                        for target in targets {
                            self.symbols.bind(target.clone(), InferredUnit::Unknown);
                        }
                    }
                    _ => {
                        return Err(CheckError::Unsupported {
                            detail: format!(
                                "destructuring {} name(s) from a non-tuple value",
                                targets.len()
                            ),
                        })
                    }
                }
                Ok(Stmt::Assign {
                    targets: targets.clone(),
                    value: t.expr,
                })
            }

            Stmt::Expr(value) => {
                // Rewritten like an annotated value, inferred unit discarded.
                let t = infer(&self.ctx, &self.symbols, value)?;
                Ok(Stmt::Expr(t.expr))
            }

            Stmt::Return(value) => self.rewrite_return(value),

            Stmt::Raise { received, expected } => Ok(Stmt::Raise {
                received: received.clone(),
                expected: expected.clone(),
            }),
        }
    }

    fn rewrite_return(&mut self, value: &Expr) -> Result<Stmt, CheckError> {
        let t = infer(&self.ctx, &self.symbols, value)?;
        let Some(returns) = self.returns else {
            return Ok(Stmt::Return(t.expr));
        };

        match (returns, t) {
            (ReturnUnits::Single(declared), t) => match &t.unit {
                InferredUnit::Unknown => {
                    warn!(function = self.fname, declared = %declared,
                          "cannot verify return value; accepting as-is");
                    Ok(Stmt::Return(t.expr))
                }
                InferredUnit::Tuple(_) => Err(CheckError::Unsupported {
                    detail: format!("tuple returned from '{}' declaring a single unit", self.fname),
                }),
                InferredUnit::Single(inferred) => {
                    match self.coerce(t.expr, inferred, declared)? {
                        Coerced::Kept(e) | Coerced::Converted(e) => Ok(Stmt::Return(e)),
                        Coerced::Mismatch { received, expected } => {
                            Ok(Stmt::Raise { received, expected })
                        }
                    }
                }
            },
            (ReturnUnits::Tuple(declared), t) => match (&t.unit, t.expr) {
                (InferredUnit::Tuple(units), Expr::Tuple(elems))
                    if units.len() == declared.len() && elems.len() == declared.len() =>
                {
                    let mut out = Vec::with_capacity(elems.len());
                    for ((elem, unit), want) in elems.into_iter().zip(units).zip(declared) {
                        match unit {
                            InferredUnit::Single(inferred) => {
                                match self.coerce(elem, inferred, want)? {
                                    Coerced::Kept(e) | Coerced::Converted(e) => out.push(e),
                                    Coerced::Mismatch { received, expected } => {
                                        out.push(Expr::Raise { received, expected })
                                    }
                                }
                            }
                            _ => {
                                warn!(function = self.fname, declared = %want,
                                      "cannot verify tuple return element; accepting as-is");
                                out.push(elem);
                            }
                        }
                    }
                    Ok(Stmt::Return(Expr::Tuple(out)))
                }
                (unit, expr) => {
                    // Tuple-declared return fed by a non-literal tuple (a
                    // bound name or a call): verifiable only when the units
                    // line up exactly.
                    let wanted = InferredUnit::Tuple(
                        declared
                            .iter()
                            .cloned()
                            .map(InferredUnit::Single)
                            .collect(),
                    );
                    if *unit != wanted && !unit.is_unknown() {
                        warn!(function = self.fname,
                              "return value units do not match the declared tuple; accepting as-is");
                    }
                    Ok(Stmt::Return(expr))
                }
            },
        }
    }

    /// Shared declaration/return coercion. An untyped (dimensionless) value
    /// declared with a real unit is a tagging operation, per the literal
    /// policy, not a conversion.
    fn coerce(
        &self,
        expr: Expr,
        inferred: &Unit,
        declared: &Unit,
    ) -> Result<Coerced, CheckError> {
        if inferred == declared {
            return Ok(Coerced::Kept(expr));
        }
        if inferred == &Unit::dimensionless() {
            debug!(function = self.fname, declared = %declared,
                   "tagging untyped value with its declared unit");
            return Ok(Coerced::Kept(expr));
        }
        match self.ctx.units.compatible(inferred, declared) {
            Ok(true) => {
                let factor = self.ctx.units.scale_factor(inferred, declared)?;
                debug!(function = self.fname, from = %inferred, to = %declared, factor,
                       "inserting declaration conversion");
                Ok(Coerced::Converted(scaled(expr, factor)))
            }
            Ok(false) => Ok(Coerced::Mismatch {
                received: inferred.clone(),
                expected: declared.clone(),
            }),
            Err(e) => match self.ctx.options.on_unknown {
                UnknownPolicy::Propagate => {
                    warn!(function = self.fname, error = %e,
                          "declared unit not resolvable; accepting as-is");
                    Ok(Coerced::Kept(expr))
                }
                UnknownPolicy::Fail => Err(e.into()),
            },
        }
    }
}
