//! Builder helpers and operator overloads so formula bodies read close to
//! the mathematical notation they implement.

use super::{Annotation, BinOp, Expr, FunctionDef, Param, ReturnSpec, Stmt};

pub fn num(v: f64) -> Expr {
    Expr::Num(v)
}

pub fn name(n: &str) -> Expr {
    Expr::Name(n.to_string())
}

/// Registered module constant, e.g. `attr("isa", "RHO_0")`.
pub fn attr(module: &str, n: &str) -> Expr {
    Expr::Attr {
        module: module.to_string(),
        name: n.to_string(),
    }
}

pub fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: callee.to_string(),
        args,
    }
}

pub fn tuple(elems: Vec<Expr>) -> Expr {
    Expr::Tuple(elems)
}

impl Expr {
    pub fn pow(self, exp: Expr) -> Expr {
        bin(BinOp::Pow, self, exp)
    }

    pub fn lt(self, rhs: Expr) -> Expr {
        bin(BinOp::Lt, self, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Expr {
        bin(BinOp::Gt, self, rhs)
    }
}

fn bin(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Bin {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        bin(BinOp::Add, self, rhs)
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        bin(BinOp::Sub, self, rhs)
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        bin(BinOp::Mul, self, rhs)
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        bin(BinOp::Div, self, rhs)
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

// --- Statement helpers ---

/// `name: unit = value`
pub fn declare(n: &str, unit: &str, value: Expr) -> Stmt {
    Stmt::Declare {
        name: n.to_string(),
        annotation: Annotation::Bare(unit.to_string()),
        value,
    }
}

pub fn assign(n: &str, value: Expr) -> Stmt {
    Stmt::Assign {
        targets: vec![n.to_string()],
        value,
    }
}

/// `a, b, ... = value`
pub fn destructure(names: &[&str], value: Expr) -> Stmt {
    Stmt::Assign {
        targets: names.iter().map(|s| s.to_string()).collect(),
        value,
    }
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return(value)
}

// --- Function definition helpers ---

pub fn param(n: &str, unit: &str) -> Param {
    Param {
        name: n.to_string(),
        annotation: Some(Annotation::Bare(unit.to_string())),
    }
}

pub fn untyped_param(n: &str) -> Param {
    Param {
        name: n.to_string(),
        annotation: None,
    }
}

pub fn function(
    n: &str,
    params: Vec<Param>,
    returns: ReturnSpec,
    body: Vec<Stmt>,
) -> FunctionDef {
    FunctionDef {
        name: n.to_string(),
        params,
        returns,
        body,
    }
}

pub fn returns(unit: &str) -> ReturnSpec {
    ReturnSpec::Single(Annotation::Bare(unit.to_string()))
}

pub fn returns_tuple(units: &[&str]) -> ReturnSpec {
    ReturnSpec::Tuple(
        units
            .iter()
            .map(|u| Annotation::Bare(u.to_string()))
            .collect(),
    )
}
