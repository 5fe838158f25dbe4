//! The function transformer and installer.
//!
//! A `Workspace` owns the unit registry, the signature registry, the
//! constant table and the installed (rewritten) functions. Its lifecycle has
//! two phases: a registration/transformation phase taking `&mut self`, and a
//! read-only execution phase — installed functions are called through
//! `&self` and are safe to invoke repeatedly and concurrently.

use super::error::CheckError;
use super::infer::{InferCtx, InferredUnit};
use super::rewrite::Rewriter;
use super::signatures::{FunctionSignature, SignatureRegistry};
use super::symbols::{ConstantTable, SymbolTable};
use super::CheckOptions;
use crate::compute::engine::Engine;
use crate::compute::{BuiltinTable, EvalError, Value};
use crate::syntax::{FunctionDef, Stmt};
use crate::units::{Unit, UnitRegistry};
use std::collections::HashMap;
use tracing::info;

/// A function whose body has been rewritten for unit coherence. Replaces the
/// original definition's executable behavior; dispatch goes through the
/// workspace's stored reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedFunction {
    pub name: String,
    /// Parameter names in declaration order; their units live in the
    /// registered signature.
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

pub struct Workspace {
    pub(crate) units: UnitRegistry,
    pub(crate) signatures: SignatureRegistry,
    pub(crate) constants: ConstantTable,
    pub(crate) functions: HashMap<String, CheckedFunction>,
    pub(crate) builtins: BuiltinTable,
    options: CheckOptions,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_options(CheckOptions::default())
    }

    pub fn with_options(options: CheckOptions) -> Self {
        let mut ws = Self {
            units: UnitRegistry::new(),
            signatures: SignatureRegistry::new(),
            constants: ConstantTable::new(),
            functions: HashMap::new(),
            builtins: BuiltinTable::standard(),
            options,
        };
        crate::formulas::geodesy::install(&mut ws);
        ws
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    pub fn unit_registry(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn signatures(&self) -> &SignatureRegistry {
        &self.signatures
    }

    pub fn is_transformed(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registers a module-level annotated constant (e.g. `isa.RHO_0`).
    /// The unit spelling is validated against the registry up front.
    pub fn register_constant(
        &mut self,
        module: &str,
        name: &str,
        value: f64,
        unit: &str,
    ) -> Result<(), CheckError> {
        let unit = Unit::new(unit);
        // A unit is well-formed iff it is compatible with itself.
        self.units.compatible(&unit, &unit)?;
        self.constants.insert(module, name, value, unit);
        Ok(())
    }

    /// Transforms a function definition: rewrites its body per the unit
    /// inference rules, installs the result, and registers its unit
    /// signature so call sites elsewhere check against it.
    ///
    /// Transforming the same name twice is rejected — re-applying the pass
    /// would double-apply conversions.
    pub fn transform(&mut self, def: &FunctionDef) -> Result<(), Vec<CheckError>> {
        if self.signatures.contains(&def.name) || self.builtins.contains(&def.name) {
            return Err(vec![CheckError::AlreadyTransformed {
                name: def.name.clone(),
            }]);
        }

        let sig = FunctionSignature::of(def);

        // Seed the symbol table from parameter annotations; unannotated
        // parameters carry an unknown unit.
        let mut symbols = SymbolTable::new();
        for p in &sig.params {
            let unit = match &p.unit {
                Some(u) => InferredUnit::Single(u.clone()),
                None => InferredUnit::Unknown,
            };
            symbols.bind(p.name.clone(), unit);
        }

        let ctx = InferCtx {
            units: &self.units,
            signatures: &self.signatures,
            constants: &self.constants,
            options: &self.options,
        };
        let mut rewriter = Rewriter::new(ctx, symbols, sig.returns.as_ref(), &def.name);
        let body = rewriter.rewrite_body(&def.body)?;

        info!(function = %def.name, statements = body.len(), "installed checked function");
        self.functions.insert(
            def.name.clone(),
            CheckedFunction {
                name: def.name.clone(),
                params: def.params.iter().map(|p| p.name.clone()).collect(),
                body,
            },
        );
        self.signatures.insert(sig);
        Ok(())
    }

    /// Invokes an installed function (or a native builtin). Arguments are
    /// magnitudes expressed in the declared parameter units.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        Engine::new(self).call(name, args)
    }
}
