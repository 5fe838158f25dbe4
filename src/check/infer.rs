//! The unit inference engine: determines the unit of an arbitrary
//! sub-expression, applying operator-specific propagation rules, and returns
//! the (possibly rewritten) expression paired with its inferred unit.
//!
//! Rewriting is pure: input nodes are never mutated, replacements are freshly
//! built. A dimensional mismatch does not abort inference — it produces a
//! `Raise` node that fails when the rewritten code executes, so unreachable
//! branches never fail a transformation spuriously.

use super::error::CheckError;
use super::signatures::{ReturnUnits, SignatureRegistry};
use super::symbols::{ConstantTable, SymbolTable};
use super::{CheckOptions, LiteralPolicy, UnknownPolicy};
use crate::syntax::{BinOp, Expr};
use crate::units::{Unit, UnitRegistry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The unit attributed to an expression: a single known unit, a pointwise
/// sequence for tuple-shaped values, or `Unknown` when inference could not
/// determine one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InferredUnit {
    Unknown,
    Single(Unit),
    Tuple(Vec<InferredUnit>),
}

impl InferredUnit {
    pub fn is_unknown(&self) -> bool {
        matches!(self, InferredUnit::Unknown)
    }

    pub fn as_single(&self) -> Option<&Unit> {
        match self {
            InferredUnit::Single(u) => Some(u),
            _ => None,
        }
    }
}

impl From<&ReturnUnits> for InferredUnit {
    fn from(r: &ReturnUnits) -> Self {
        match r {
            ReturnUnits::Single(u) => InferredUnit::Single(u.clone()),
            ReturnUnits::Tuple(us) => {
                InferredUnit::Tuple(us.iter().cloned().map(InferredUnit::Single).collect())
            }
        }
    }
}

/// Result of one inference call: the rewritten node and its unit.
/// Created fresh by every call, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub expr: Expr,
    pub unit: InferredUnit,
}

impl TypedExpr {
    fn new(expr: Expr, unit: InferredUnit) -> Self {
        Self { expr, unit }
    }
}

/// Read-only context shared by inference and statement rewriting.
pub(crate) struct InferCtx<'a> {
    pub units: &'a UnitRegistry,
    pub signatures: &'a SignatureRegistry,
    pub constants: &'a ConstantTable,
    pub options: &'a CheckOptions,
}

impl<'a> InferCtx<'a> {
    /// Policy gate for every place a unit cannot be determined: permissive
    /// mode logs the checking gap and propagates `unknown`, strict mode
    /// fails the transformation.
    pub(crate) fn unknown_or_fail(&self, context: &str) -> Result<InferredUnit, CheckError> {
        match self.options.on_unknown {
            UnknownPolicy::Propagate => {
                warn!(context, "unit unknown; checking disabled for this value");
                Ok(InferredUnit::Unknown)
            }
            UnknownPolicy::Fail => Err(CheckError::Unverifiable {
                context: context.to_string(),
            }),
        }
    }
}

/// Wraps `expr` in a multiplication by `factor`, skipping the identity.
pub(crate) fn scaled(expr: Expr, factor: f64) -> Expr {
    if factor == 1.0 {
        expr
    } else {
        Expr::Bin {
            op: BinOp::Mul,
            left: Box::new(expr),
            right: Box::new(Expr::Num(factor)),
        }
    }
}

fn rebuild(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Bin {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Infers the unit of `expr` against the current symbol table, returning the
/// rewritten node and its unit.
pub(crate) fn infer(
    ctx: &InferCtx,
    symbols: &SymbolTable,
    expr: &Expr,
) -> Result<TypedExpr, CheckError> {
    match expr {
        Expr::Num(v) => {
            let unit = match ctx.options.literals {
                LiteralPolicy::Dimensionless => InferredUnit::Single(Unit::dimensionless()),
                LiteralPolicy::Unknown => InferredUnit::Unknown,
            };
            Ok(TypedExpr::new(Expr::Num(*v), unit))
        }

        Expr::Name(n) => match symbols.lookup(n) {
            Some(unit) => Ok(TypedExpr::new(expr.clone(), unit.clone())),
            None => {
                let unit = match ctx.options.on_unknown {
                    UnknownPolicy::Propagate => {
                        warn!(name = %n, "name has no unit in scope; propagating unknown");
                        InferredUnit::Unknown
                    }
                    UnknownPolicy::Fail => {
                        return Err(CheckError::UndefinedUnit { name: n.clone() })
                    }
                };
                Ok(TypedExpr::new(expr.clone(), unit))
            }
        },

        Expr::Attr { module, name } => match ctx.constants.get(module, name) {
            Some((_, unit)) => Ok(TypedExpr::new(
                expr.clone(),
                InferredUnit::Single(unit.clone()),
            )),
            None => {
                let qualified = format!("{}.{}", module, name);
                let unit = match ctx.options.on_unknown {
                    UnknownPolicy::Propagate => {
                        warn!(constant = %qualified, "unregistered constant; propagating unknown");
                        InferredUnit::Unknown
                    }
                    UnknownPolicy::Fail => {
                        return Err(CheckError::UndefinedUnit { name: qualified })
                    }
                };
                Ok(TypedExpr::new(expr.clone(), unit))
            }
        },

        Expr::Neg(inner) => {
            let t = infer(ctx, symbols, inner)?;
            Ok(TypedExpr::new(Expr::Neg(Box::new(t.expr)), t.unit))
        }

        Expr::Bin { op, left, right } => {
            let l = infer(ctx, symbols, left)?;
            let r = infer(ctx, symbols, right)?;
            match op {
                BinOp::Add | BinOp::Sub => additive(ctx, *op, l, r),
                BinOp::Mul | BinOp::Div => multiplicative(ctx, *op, l, r),
                // Left-propagation simplification for every other operator.
                BinOp::Pow | BinOp::Lt | BinOp::Gt => {
                    let unit = l.unit.clone();
                    Ok(TypedExpr::new(rebuild(*op, l.expr, r.expr), unit))
                }
            }
        }

        Expr::Tuple(elems) => {
            let inferred = elems
                .iter()
                .map(|e| infer(ctx, symbols, e))
                .collect::<Result<Vec<_>, _>>()?;
            let units = inferred.iter().map(|t| t.unit.clone()).collect();
            let nodes = inferred.into_iter().map(|t| t.expr).collect();
            Ok(TypedExpr::new(Expr::Tuple(nodes), InferredUnit::Tuple(units)))
        }

        Expr::List(elems) => {
            let inferred = elems
                .iter()
                .map(|e| infer(ctx, symbols, e))
                .collect::<Result<Vec<_>, _>>()?;
            let units = inferred.iter().map(|t| t.unit.clone()).collect();
            let nodes = inferred.into_iter().map(|t| t.expr).collect();
            Ok(TypedExpr::new(Expr::List(nodes), InferredUnit::Tuple(units)))
        }

        Expr::Call { callee, args } => infer_call(ctx, symbols, callee, args),

        // Already-injected error nodes carry no further unit information.
        Expr::Raise { .. } => Ok(TypedExpr::new(expr.clone(), InferredUnit::Unknown)),
    }
}

/// Additive rule: operands must share a dimension; the right operand is
/// rescaled into the left operand's unit.
fn additive(
    ctx: &InferCtx,
    op: BinOp,
    left: TypedExpr,
    right: TypedExpr,
) -> Result<TypedExpr, CheckError> {
    let (lu, ru) = match (&left.unit, &right.unit) {
        (InferredUnit::Single(l), InferredUnit::Single(r)) => (l.clone(), r.clone()),
        (InferredUnit::Tuple(_), _) | (_, InferredUnit::Tuple(_)) => {
            return Err(CheckError::Unsupported {
                detail: "tuple operand in an arithmetic expression".to_string(),
            })
        }
        _ => {
            let unit = ctx.unknown_or_fail("an additive expression")?;
            return Ok(TypedExpr::new(rebuild(op, left.expr, right.expr), unit));
        }
    };

    if lu == ru {
        return Ok(TypedExpr::new(
            rebuild(op, left.expr, right.expr),
            InferredUnit::Single(lu),
        ));
    }

    match ctx.units.compatible(&lu, &ru) {
        Ok(true) => {
            let factor = ctx.units.scale_factor(&ru, &lu)?;
            debug!(from = %ru, to = %lu, factor, "inserting additive conversion");
            Ok(TypedExpr::new(
                rebuild(op, left.expr, scaled(right.expr, factor)),
                InferredUnit::Single(lu),
            ))
        }
        Ok(false) => Ok(TypedExpr::new(
            Expr::Raise {
                received: ru,
                expected: lu.clone(),
            },
            InferredUnit::Single(lu),
        )),
        Err(e) => match ctx.options.on_unknown {
            UnknownPolicy::Propagate => {
                warn!(error = %e, "unit not resolvable; checking disabled for this expression");
                Ok(TypedExpr::new(
                    rebuild(op, left.expr, right.expr),
                    InferredUnit::Unknown,
                ))
            }
            UnknownPolicy::Fail => Err(e.into()),
        },
    }
}

/// Multiplicative rule: like dimensions are normalized (the right operand is
/// rescaled into the left unit), different dimensions compose symbolically.
fn multiplicative(
    ctx: &InferCtx,
    op: BinOp,
    left: TypedExpr,
    right: TypedExpr,
) -> Result<TypedExpr, CheckError> {
    let (lu, ru) = match (&left.unit, &right.unit) {
        (InferredUnit::Single(l), InferredUnit::Single(r)) => (l.clone(), r.clone()),
        (InferredUnit::Tuple(_), _) | (_, InferredUnit::Tuple(_)) => {
            return Err(CheckError::Unsupported {
                detail: "tuple operand in an arithmetic expression".to_string(),
            })
        }
        _ => {
            let unit = ctx.unknown_or_fail("a multiplicative expression")?;
            return Ok(TypedExpr::new(rebuild(op, left.expr, right.expr), unit));
        }
    };

    match ctx.units.compatible(&lu, &ru) {
        Ok(true) => {
            // Accidentally the same physical dimension: normalize so both
            // magnitudes are expressed in the left unit before combining.
            let factor = ctx.units.scale_factor(&ru, &lu)?;
            if factor != 1.0 {
                debug!(from = %ru, to = %lu, factor, "normalizing like-dimension operands");
            }
            let unit = match op {
                BinOp::Mul => lu.multiply(&lu)?,
                _ => Unit::dimensionless(),
            };
            Ok(TypedExpr::new(
                rebuild(op, left.expr, scaled(right.expr, factor)),
                InferredUnit::Single(unit),
            ))
        }
        Ok(false) => {
            // Different dimensions, the common case: symbolic composition.
            let composed = match op {
                BinOp::Mul => lu.multiply(&ru),
                _ => lu.divide(&ru),
            };
            match composed {
                Ok(unit) => Ok(TypedExpr::new(
                    rebuild(op, left.expr, right.expr),
                    InferredUnit::Single(unit),
                )),
                Err(e) => match ctx.options.on_unknown {
                    UnknownPolicy::Propagate => {
                        warn!(error = %e, "unit composition failed; propagating unknown");
                        Ok(TypedExpr::new(
                            rebuild(op, left.expr, right.expr),
                            InferredUnit::Unknown,
                        ))
                    }
                    UnknownPolicy::Fail => Err(e.into()),
                },
            }
        }
        Err(e) => match ctx.options.on_unknown {
            UnknownPolicy::Propagate => {
                warn!(error = %e, "unit not resolvable; checking disabled for this expression");
                Ok(TypedExpr::new(
                    rebuild(op, left.expr, right.expr),
                    InferredUnit::Unknown,
                ))
            }
            UnknownPolicy::Fail => Err(e.into()),
        },
    }
}

/// Call rule: arguments are checked (and converted) against the callee's
/// registered unit signature; the call's unit is the declared return unit.
/// Callees without a signature are unmodeled: arguments pass through with
/// their own rewrites, the result unit is unknown.
fn infer_call(
    ctx: &InferCtx,
    symbols: &SymbolTable,
    callee: &str,
    args: &[Expr],
) -> Result<TypedExpr, CheckError> {
    let inferred = args
        .iter()
        .map(|a| infer(ctx, symbols, a))
        .collect::<Result<Vec<_>, _>>()?;

    let Some(sig) = ctx.signatures.get(callee) else {
        debug!(callee, "no unit signature registered for callee");
        let unit = ctx.unknown_or_fail(&format!("call to unmodeled '{}'", callee))?;
        let nodes = inferred.into_iter().map(|t| t.expr).collect();
        return Ok(TypedExpr::new(
            Expr::Call {
                callee: callee.to_string(),
                args: nodes,
            },
            unit,
        ));
    };

    if sig.params.len() != inferred.len() {
        return Err(CheckError::Unsupported {
            detail: format!(
                "call to '{}' with {} argument(s), signature declares {}",
                callee,
                inferred.len(),
                sig.params.len()
            ),
        });
    }

    let result_unit = match &sig.returns {
        Some(r) => InferredUnit::from(r),
        None => ctx.unknown_or_fail(&format!("call to '{}' (no declared return unit)", callee))?,
    };

    let mut new_args = Vec::with_capacity(inferred.len());
    for (t, p) in inferred.into_iter().zip(&sig.params) {
        let Some(expected) = &p.unit else {
            // Unannotated parameter: no conversion, keep the arg's own rewrites.
            new_args.push(t.expr);
            continue;
        };
        match &t.unit {
            InferredUnit::Single(received) if received == expected => new_args.push(t.expr),
            InferredUnit::Single(received) => match ctx.units.compatible(received, expected) {
                Ok(true) => {
                    let factor = ctx.units.scale_factor(received, expected)?;
                    debug!(callee, param = %p.name, from = %received, to = %expected, factor,
                           "inserting call-boundary conversion");
                    new_args.push(scaled(t.expr, factor));
                }
                Ok(false) => {
                    // Whole call collapses into a deferred dimensional error.
                    return Ok(TypedExpr::new(
                        Expr::Raise {
                            received: received.clone(),
                            expected: expected.clone(),
                        },
                        result_unit,
                    ));
                }
                Err(e) => match ctx.options.on_unknown {
                    UnknownPolicy::Propagate => {
                        warn!(callee, param = %p.name, error = %e,
                              "argument unit not resolvable; passing unchecked");
                        new_args.push(t.expr);
                    }
                    UnknownPolicy::Fail => return Err(e.into()),
                },
            },
            InferredUnit::Unknown => {
                match ctx.options.on_unknown {
                    UnknownPolicy::Propagate => {
                        warn!(callee, param = %p.name, expected = %expected,
                              "argument unit unknown; passing unchecked");
                        new_args.push(t.expr);
                    }
                    UnknownPolicy::Fail => {
                        return Err(CheckError::Unverifiable {
                            context: format!("argument '{}' of call to '{}'", p.name, callee),
                        })
                    }
                }
            }
            InferredUnit::Tuple(_) => {
                return Err(CheckError::Unsupported {
                    detail: format!("tuple argument in call to '{}'", callee),
                })
            }
        }
    }

    Ok(TypedExpr::new(
        Expr::Call {
            callee: callee.to_string(),
            args: new_args,
        },
        result_unit,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::signatures::{FunctionSignature, ParamSignature};
    use crate::syntax::build::*;

    fn setup() -> (UnitRegistry, SignatureRegistry, ConstantTable, CheckOptions) {
        let mut sigs = SignatureRegistry::new();
        sigs.insert(FunctionSignature {
            name: "temperature".into(),
            params: vec![ParamSignature {
                name: "h".into(),
                unit: Some(Unit::new("m")),
            }],
            returns: Some(ReturnUnits::Single(Unit::new("K"))),
        });
        (
            UnitRegistry::new(),
            sigs,
            ConstantTable::new(),
            CheckOptions::default(),
        )
    }

    fn infer_with(
        symbols: &SymbolTable,
        expr: &Expr,
        options: CheckOptions,
    ) -> Result<TypedExpr, CheckError> {
        let (units, sigs, consts, _) = setup();
        let ctx = InferCtx {
            units: &units,
            signatures: &sigs,
            constants: &consts,
            options: &options,
        };
        infer(&ctx, symbols, expr)
    }

    fn symbols_m_ft() -> SymbolTable {
        let mut s = SymbolTable::new();
        s.bind("alt_m", InferredUnit::Single(Unit::new("m")));
        s.bind("alt_ft", InferredUnit::Single(Unit::new("ft")));
        s.bind("temp", InferredUnit::Single(Unit::new("K")));
        s
    }

    #[test]
    fn additive_compatible_inserts_scale_on_right() {
        let t = infer_with(
            &symbols_m_ft(),
            &(name("alt_m") + name("alt_ft")),
            CheckOptions::default(),
        )
        .unwrap();
        assert_eq!(t.unit, InferredUnit::Single(Unit::new("m")));
        // right operand becomes alt_ft * 0.3048
        match &t.expr {
            Expr::Bin { op: BinOp::Add, right, .. } => match right.as_ref() {
                Expr::Bin { op: BinOp::Mul, right: factor, .. } => {
                    assert_eq!(**factor, Expr::Num(0.3048));
                }
                other => panic!("expected scaled right operand, got {:?}", other),
            },
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn additive_incompatible_becomes_deferred_raise() {
        let t = infer_with(
            &symbols_m_ft(),
            &(name("alt_m") + name("temp")),
            CheckOptions::default(),
        )
        .unwrap();
        assert_eq!(
            t.expr,
            Expr::Raise {
                received: Unit::new("K"),
                expected: Unit::new("m"),
            }
        );
    }

    #[test]
    fn multiplicative_composes_symbolically() {
        let mut s = symbols_m_ft();
        s.bind("c", InferredUnit::Single(Unit::new("K/m")));
        let t = infer_with(&s, &(name("c") * name("alt_m")), CheckOptions::default()).unwrap();
        assert_eq!(t.unit, InferredUnit::Single(Unit::new("K")));
    }

    #[test]
    fn like_dimension_division_is_dimensionless() {
        let t = infer_with(
            &symbols_m_ft(),
            &(name("alt_m") / name("alt_ft")),
            CheckOptions::default(),
        )
        .unwrap();
        assert_eq!(t.unit, InferredUnit::Single(Unit::dimensionless()));
    }

    #[test]
    fn call_boundary_converts_compatible_argument() {
        let t = infer_with(
            &symbols_m_ft(),
            &call("temperature", vec![name("alt_ft")]),
            CheckOptions::default(),
        )
        .unwrap();
        assert_eq!(t.unit, InferredUnit::Single(Unit::new("K")));
        match &t.expr {
            Expr::Call { args, .. } => {
                assert_eq!(
                    args[0],
                    name("alt_ft") * num(0.3048),
                    "ft argument must be rescaled to m"
                );
            }
            other => panic!("expected Call, got {:?}", other),
        }
    }

    #[test]
    fn call_boundary_mismatch_collapses_to_raise() {
        let t = infer_with(
            &symbols_m_ft(),
            &call("temperature", vec![name("temp")]),
            CheckOptions::default(),
        )
        .unwrap();
        assert_eq!(
            t.expr,
            Expr::Raise {
                received: Unit::new("K"),
                expected: Unit::new("m"),
            }
        );
    }

    #[test]
    fn unmodeled_call_is_unknown_in_permissive_mode() {
        let t = infer_with(
            &symbols_m_ft(),
            &call("sqrt", vec![name("alt_m")]),
            CheckOptions::default(),
        )
        .unwrap();
        assert!(t.unit.is_unknown());
    }

    #[test]
    fn unmodeled_call_fails_in_strict_mode() {
        let options = CheckOptions {
            on_unknown: UnknownPolicy::Fail,
            ..Default::default()
        };
        let err = infer_with(&symbols_m_ft(), &call("sqrt", vec![name("alt_m")]), options)
            .unwrap_err();
        assert!(matches!(err, CheckError::Unverifiable { .. }));
    }

    #[test]
    fn undefined_name_fails_in_strict_mode() {
        let options = CheckOptions {
            on_unknown: UnknownPolicy::Fail,
            ..Default::default()
        };
        let err = infer_with(&SymbolTable::new(), &name("ghost"), options).unwrap_err();
        assert_eq!(err, CheckError::UndefinedUnit { name: "ghost".into() });
    }

    #[test]
    fn literal_policy_controls_literal_units() {
        let t = infer_with(&SymbolTable::new(), &num(5.0), CheckOptions::default()).unwrap();
        assert_eq!(t.unit, InferredUnit::Single(Unit::dimensionless()));

        let options = CheckOptions {
            literals: LiteralPolicy::Unknown,
            ..Default::default()
        };
        let t = infer_with(&SymbolTable::new(), &num(5.0), options).unwrap();
        assert!(t.unit.is_unknown());
    }

    #[test]
    fn tuple_units_are_pointwise() {
        let t = infer_with(
            &symbols_m_ft(),
            &tuple(vec![name("alt_m"), name("temp")]),
            CheckOptions::default(),
        )
        .unwrap();
        assert_eq!(
            t.unit,
            InferredUnit::Tuple(vec![
                InferredUnit::Single(Unit::new("m")),
                InferredUnit::Single(Unit::new("K")),
            ])
        );
    }
}
