//! The unit-conversion authority: resolves unit strings against a table of
//! named aeronautical units and answers compatibility / scale-factor queries.

use super::parsed::ParsedUnit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Canonical spelling of the empty dimension.
pub const DIMENSIONLESS: &str = "dimensionless";

/// A named physical unit, stored as its string spelling (`"m"`, `"kts"`,
/// `"kg/m^3"`). Composite spellings follow the grammar of [`ParsedUnit`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit(pub String);

impl Unit {
    pub fn new(s: impl Into<String>) -> Self {
        Unit(s.into())
    }

    pub fn dimensionless() -> Self {
        Unit(DIMENSIONLESS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Symbolic product of two units, re-canonicalized (`K/m * m` -> `K`).
    pub fn multiply(&self, other: &Unit) -> Result<Unit, UnitError> {
        let mut lhs = parse(self)?;
        let rhs = parse(other)?;
        lhs.multiply(&rhs);
        Ok(Unit(lhs.canonical()))
    }

    /// Symbolic quotient of two units, re-canonicalized.
    pub fn divide(&self, other: &Unit) -> Result<Unit, UnitError> {
        let mut lhs = parse(self)?;
        let rhs = parse(other)?;
        lhs.divide(&rhs);
        Ok(Unit(lhs.canonical()))
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("unknown unit token '{0}'")]
    UnknownUnit(String),
    #[error("malformed unit string '{0}'")]
    Malformed(String),
    #[error("units '{from}' and '{to}' are not convertible")]
    NotConvertible { from: Unit, to: Unit },
}

fn parse(unit: &Unit) -> Result<ParsedUnit, UnitError> {
    ParsedUnit::from_str(unit.as_str()).map_err(|_| UnitError::Malformed(unit.0.clone()))
}

/// Exponents over the base dimensions (length, time, mass, temperature, angle).
type Dims = [i32; 5];

const NO_DIMS: Dims = [0; 5];

/// Resolves unit identifiers to dimension vectors and SI scale factors.
///
/// Pure queries only: `compatible` compares expanded dimension vectors,
/// `scale_factor` is defined exactly when `compatible` holds. The default
/// table covers the units the ISA / airspeed / geodesy formulas need.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    table: HashMap<&'static str, (Dims, f64)>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        const L: Dims = [1, 0, 0, 0, 0]; // length
        const T: Dims = [0, 1, 0, 0, 0]; // time
        const M: Dims = [0, 0, 1, 0, 0]; // mass
        const K: Dims = [0, 0, 0, 1, 0]; // temperature
        const A: Dims = [0, 0, 0, 0, 1]; // angle

        let mut table: HashMap<&'static str, (Dims, f64)> = HashMap::new();

        table.insert("m", (L, 1.0));
        table.insert("cm", (L, 0.01));
        table.insert("km", (L, 1000.0));
        table.insert("ft", (L, 0.3048));
        table.insert("nmi", (L, 1852.0));

        table.insert("s", (T, 1.0));
        table.insert("min", (T, 60.0));
        table.insert("h", (T, 3600.0));

        table.insert("kg", (M, 1.0));
        table.insert("g", (M, 0.001));

        table.insert("K", (K, 1.0));

        table.insert("radian", (A, 1.0));
        table.insert("degree", (A, std::f64::consts::PI / 180.0));

        // Named derived units
        table.insert("kts", ([1, -1, 0, 0, 0], 1852.0 / 3600.0));
        table.insert("N", ([1, -2, 1, 0, 0], 1.0));
        table.insert("Pa", ([-1, -2, 1, 0, 0], 1.0));
        table.insert("hPa", ([-1, -2, 1, 0, 0], 100.0));
        table.insert("J", ([2, -2, 1, 0, 0], 1.0));

        Self { table }
    }

    /// Expands a (possibly composite) unit to its aggregate dimension vector
    /// and SI factor.
    fn resolve(&self, unit: &Unit) -> Result<(Dims, f64), UnitError> {
        let parsed = parse(unit)?;
        let mut dims = NO_DIMS;
        let mut factor = 1.0_f64;
        for (token, exp) in parsed.terms() {
            let &(base_dims, base_factor) = self
                .table
                .get(token)
                .ok_or_else(|| UnitError::UnknownUnit(token.to_string()))?;
            for (d, b) in dims.iter_mut().zip(base_dims.iter()) {
                *d += b * exp;
            }
            factor *= base_factor.powi(exp);
        }
        Ok((dims, factor))
    }

    /// True if a magnitude in `a` can be linearly converted to `b`.
    ///
    /// `dimensionless` is compatible with itself only; this is distinct from
    /// an *unknown* unit, which never reaches the registry.
    pub fn compatible(&self, a: &Unit, b: &Unit) -> Result<bool, UnitError> {
        let (dims_a, _) = self.resolve(a)?;
        let (dims_b, _) = self.resolve(b)?;
        Ok(dims_a == dims_b)
    }

    /// Multiplicative factor `x` such that `value_in_to = value_in_from * x`.
    ///
    /// Defined only when `compatible(from, to)` holds.
    pub fn scale_factor(&self, from: &Unit, to: &Unit) -> Result<f64, UnitError> {
        let (dims_from, factor_from) = self.resolve(from)?;
        let (dims_to, factor_to) = self.resolve(to)?;
        if dims_from != dims_to {
            return Err(UnitError::NotConvertible {
                from: from.clone(),
                to: to.clone(),
            });
        }
        Ok(factor_from / factor_to)
    }
}
