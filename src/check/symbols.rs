//! Per-function symbol table and the registry of module-level annotated
//! constants.

use super::infer::InferredUnit;
use crate::units::Unit;
use std::collections::HashMap;

/// Mapping from variable name to its currently known unit within one
/// function transformation pass. Seeded from parameter annotations,
/// updated statement by statement in source order.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    vars: HashMap<String, InferredUnit>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, unit: InferredUnit) {
        self.vars.insert(name.into(), unit);
    }

    /// `None` means the name is not defined yet — an "undefined unit"
    /// condition for the caller to signal, never silently defaulted here.
    pub fn lookup(&self, name: &str) -> Option<&InferredUnit> {
        self.vars.get(name)
    }
}

/// Module-level annotated constants (e.g. `isa.RHO_0`), registered
/// explicitly during a setup phase. Provides both the declared unit for
/// inference and the numeric value for execution.
#[derive(Debug, Default, Clone)]
pub struct ConstantTable {
    entries: HashMap<String, (f64, Unit)>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(module: &str, name: &str) -> String {
        format!("{}.{}", module, name)
    }

    pub fn insert(&mut self, module: &str, name: &str, value: f64, unit: Unit) {
        self.entries.insert(Self::key(module, name), (value, unit));
    }

    pub fn get(&self, module: &str, name: &str) -> Option<&(f64, Unit)> {
        self.entries.get(&Self::key(module, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_bindings_overwrite_earlier_ones() {
        let mut table = SymbolTable::new();
        table.bind("x", InferredUnit::Single(Unit::new("m")));
        table.bind("x", InferredUnit::Single(Unit::new("ft")));
        assert_eq!(
            table.lookup("x"),
            Some(&InferredUnit::Single(Unit::new("ft")))
        );
        assert_eq!(table.lookup("y"), None);
    }

    #[test]
    fn constants_are_scoped_by_module() {
        let mut consts = ConstantTable::new();
        consts.insert("isa", "RHO_0", 1.225, Unit::new("kg/m^3"));
        assert!(consts.get("isa", "RHO_0").is_some());
        assert!(consts.get("aero", "RHO_0").is_none());
    }
}
