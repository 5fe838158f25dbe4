//! The statement/expression tree that checked functions are written in.
//!
//! This is deliberately a narrow grammar: numeric literals, names, registered
//! module constants, arithmetic, comparisons (for conditional selection),
//! tuples/lists, calls, annotated declarations, assignments and returns.
//! Set and dict literals are not part of the grammar. `Raise` nodes never
//! appear in user-built trees; the rewriter injects them where a dimensional
//! mismatch must surface at execution time.

pub mod build;

use crate::units::Unit;
use serde::{Deserialize, Serialize};

/// Binary operators.
///
/// `Pow`, `Lt` and `Gt` use the left-propagation rule during unit inference
/// (the result carries the left operand's unit); only the arithmetic four
/// participate in conversion insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric literal.
    Num(f64),
    /// Local variable or parameter reference.
    Name(String),
    /// Registered module constant, e.g. `isa.RHO_0`.
    Attr { module: String, name: String },
    Neg(Box<Expr>),
    Bin {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call { callee: String, args: Vec<Expr> },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    /// Deferred dimensional error: checked at transform time, thrown when the
    /// rewritten expression executes.
    Raise { received: Unit, expected: Unit },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Annotated declaration: `name: unit = value`.
    Declare {
        name: String,
        annotation: Annotation,
        value: Expr,
    },
    /// Plain assignment; several targets destructure a tuple-valued right side.
    Assign { targets: Vec<String>, value: Expr },
    /// Bare expression evaluated for effect.
    Expr(Expr),
    Return(Expr),
    /// Injected replacement for a statement whose declaration cannot hold.
    Raise { received: Unit, expected: Unit },
}

/// A unit annotation: either a bare unit string or a two-part tag pairing a
/// placeholder value type with the unit string. Both forms carry the same
/// unit information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    Bare(String),
    Tagged { placeholder: String, unit: String },
}

impl Annotation {
    pub fn unit(&self) -> Unit {
        match self {
            Annotation::Bare(u) => Unit::new(u.clone()),
            Annotation::Tagged { unit, .. } => Unit::new(unit.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub annotation: Option<Annotation>,
}

/// Declared return units of a function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnSpec {
    None,
    Single(Annotation),
    Tuple(Vec<Annotation>),
}

/// An analyzable function body with unit-bearing annotations: the input to
/// the transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: ReturnSpec,
    pub body: Vec<Stmt>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::*;

    #[test]
    fn annotation_forms_carry_the_same_unit() {
        let bare = Annotation::Bare("m".into());
        let tagged = Annotation::Tagged {
            placeholder: "Array".into(),
            unit: "m".into(),
        };
        assert_eq!(bare.unit(), tagged.unit());
    }

    #[test]
    fn function_def_round_trips_through_json() {
        let def = FunctionDef {
            name: "double".into(),
            params: vec![param("x", "m")],
            returns: ReturnSpec::Single(Annotation::Bare("m".into())),
            body: vec![ret(name("x") * num(2.0))],
        };
        let json = serde_json::to_string(&def).unwrap();
        let back: FunctionDef = serde_json::from_str(&json).unwrap();
        assert_eq!(def, back);
    }
}
