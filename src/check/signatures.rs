//! The process-wide registry of unit contracts for transformed functions.
//!
//! Call sites are checked against these entries instead of re-deriving the
//! callee's contract. The registry is append-only: it is populated during
//! the registration/transformation phase and read-only afterwards, which is
//! what makes installed functions safe to call concurrently.

use crate::syntax::{FunctionDef, ReturnSpec};
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSignature {
    pub name: String,
    /// `None` for an unannotated parameter: arguments pass unchecked.
    pub unit: Option<Unit>,
}

/// Declared return unit(s) of a signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnUnits {
    Single(Unit),
    Tuple(Vec<Unit>),
}

/// The unit contract of one function: parameter units plus return unit(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ParamSignature>,
    pub returns: Option<ReturnUnits>,
}

impl FunctionSignature {
    /// Extracts the contract from a definition's annotations.
    pub fn of(def: &FunctionDef) -> Self {
        let params = def
            .params
            .iter()
            .map(|p| ParamSignature {
                name: p.name.clone(),
                unit: p.annotation.as_ref().map(|a| a.unit()),
            })
            .collect();
        let returns = match &def.returns {
            ReturnSpec::None => None,
            ReturnSpec::Single(a) => Some(ReturnUnits::Single(a.unit())),
            ReturnSpec::Tuple(annots) => {
                Some(ReturnUnits::Tuple(annots.iter().map(|a| a.unit()).collect()))
            }
        };
        Self {
            name: def.name.clone(),
            params,
            returns,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SignatureRegistry {
    by_name: HashMap<String, FunctionSignature>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.by_name.get(name)
    }

    /// Append-only insert: returns `false` (and leaves the existing entry
    /// untouched) if the name is already registered.
    pub fn insert(&mut self, sig: FunctionSignature) -> bool {
        if self.by_name.contains_key(&sig.name) {
            return false;
        }
        self.by_name.insert(sig.name.clone(), sig);
        true
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::*;

    #[test]
    fn signature_extraction_covers_both_annotation_forms() {
        let def = function(
            "f",
            vec![param("a", "m"), untyped_param("b")],
            returns_tuple(&["K", "K"]),
            vec![],
        );
        let sig = FunctionSignature::of(&def);
        assert_eq!(sig.params[0].unit, Some(Unit::new("m")));
        assert_eq!(sig.params[1].unit, None);
        assert_eq!(
            sig.returns,
            Some(ReturnUnits::Tuple(vec![Unit::new("K"), Unit::new("K")]))
        );
    }

    #[test]
    fn registry_is_append_only() {
        let mut reg = SignatureRegistry::new();
        let sig = FunctionSignature {
            name: "f".into(),
            params: vec![],
            returns: None,
        };
        assert!(reg.insert(sig.clone()));
        assert!(!reg.insert(sig));
        assert_eq!(reg.len(), 1);
    }
}
