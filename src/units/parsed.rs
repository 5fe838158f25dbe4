//! Composite-unit algebra: parses unit strings like `kg/m^3` or `m^2/s^2*K`
//! into a map of base tokens to exponents, supports multiplication, division
//! and canonical re-formatting.
//!
//! Grammar: `<product>` or `<product>/<product>`, where a product is a
//! `*`-separated list of factors `token` or `token^int`. A single `/` splits
//! numerator from denominator; the whole denominator is a product, so
//! `J/kg*K` reads as J·kg⁻¹·K⁻¹.

use std::collections::HashMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    terms: HashMap<String, i32>,
}

impl ParsedUnit {
    pub fn from_str(s: &str) -> Result<Self, ()> {
        let s = s.trim();
        if s.is_empty() {
            return Err(());
        }
        if s == "dimensionless" || s == "1" {
            return Ok(Self::default());
        }

        let mut terms = HashMap::new();
        let mut parts = s.split('/');

        if let Some(num) = parts.next() {
            Self::parse_product(num, 1, &mut terms)?;
        }
        if let Some(den) = parts.next() {
            Self::parse_product(den, -1, &mut terms)?;
        }
        if parts.next().is_some() {
            return Err(()); // Multiple slashes
        }

        Ok(Self { terms })
    }

    fn parse_product(s: &str, sign: i32, terms: &mut HashMap<String, i32>) -> Result<(), ()> {
        let s = s.trim();
        if s.is_empty() || s == "1" {
            return Ok(());
        }
        for factor in s.split('*') {
            let mut parts = factor.split('^');
            let base = parts.next().ok_or(())?.trim();
            if base.is_empty() {
                return Err(());
            }
            let exp = parts.next().unwrap_or("1").trim().parse::<i32>().map_err(|_| ())?;
            *terms.entry(base.to_string()).or_insert(0) += exp * sign;
        }
        Ok(())
    }

    /// True if no base token carries a non-zero exponent.
    pub fn is_dimensionless(&self) -> bool {
        self.terms.values().all(|&e| e == 0)
    }

    /// Iterates over the non-zero `(token, exponent)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (&str, i32)> {
        self.terms
            .iter()
            .filter(|&(_, &e)| e != 0)
            .map(|(k, &e)| (k.as_str(), e))
    }

    pub fn multiply(&mut self, other: &Self) {
        for (k, v) in &other.terms {
            *self.terms.entry(k.clone()).or_insert(0) += v;
        }
    }

    pub fn divide(&mut self, other: &Self) {
        for (k, v) in &other.terms {
            *self.terms.entry(k.clone()).or_insert(0) -= v;
        }
    }

    /// Formats back into the canonical string form. Dimensionless collapses
    /// to `"dimensionless"`, the numerator/denominator tokens are sorted
    /// alphabetically so equal units always render identically.
    pub fn canonical(&self) -> String {
        let (num, den): (Vec<_>, Vec<_>) = self
            .terms
            .iter()
            .filter(|&(_, &v)| v != 0)
            .partition(|&(_, &v)| v > 0);

        let fmt = |terms: Vec<(&String, &i32)>| -> String {
            if terms.is_empty() {
                return "1".to_string();
            }
            let mut t = terms;
            t.sort_by_key(|a| a.0);
            t.into_iter()
                .map(|(k, v)| {
                    if v.abs() == 1 {
                        k.clone()
                    } else {
                        format!("{}^{}", k, v.abs())
                    }
                })
                .collect::<Vec<_>>()
                .join("*")
        };

        let n_str = fmt(num);
        let d_str = fmt(den);

        if d_str == "1" {
            if n_str == "1" {
                "dimensionless".to_string()
            } else {
                n_str
            }
        } else {
            format!("{}/{}", n_str, d_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("m", "m")]
    #[case("kts", "kts")]
    #[case("m*s", "m*s")] // Alphabetical order is canonical
    #[case("s*m", "m*s")] // Canonical reordering
    #[case("m/s", "m/s")]
    #[case("m/s^2", "m/s^2")]
    #[case("kg/m^3", "kg/m^3")]
    #[case("m^2/s^2*K", "m^2/K*s^2")]
    #[case("J/kg*K", "J/K*kg")]
    #[case("m*m", "m^2")] // Aggregation
    #[case("m^2/m", "m")] // Cancellation
    #[case("m/m", "dimensionless")] // Full cancellation
    #[case("K/m*m", "K/m^2")]
    #[case("1/s", "1/s")]
    #[case("m^1", "m")]
    #[case("dimensionless", "dimensionless")]
    fn parse_and_canonicalize(#[case] input: &str, #[case] expected: &str) {
        let parsed = ParsedUnit::from_str(input).unwrap();
        assert_eq!(parsed.canonical(), expected, "input: {}", input);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("kg//m")] // Double slash
    #[case("m^x")] // Non-numeric exponent
    fn parse_invalid(#[case] input: &str) {
        assert!(ParsedUnit::from_str(input).is_err(), "should fail: '{}'", input);
    }

    #[test]
    fn multiply_composes_exponents() {
        // (K/m) * m = K
        let mut grad = ParsedUnit::from_str("K/m").unwrap();
        let length = ParsedUnit::from_str("m").unwrap();
        grad.multiply(&length);
        assert_eq!(grad.canonical(), "K");
    }

    #[test]
    fn divide_composes_exponents() {
        // (m/s) / s = m/s^2
        let mut speed = ParsedUnit::from_str("m/s").unwrap();
        let time = ParsedUnit::from_str("s").unwrap();
        speed.divide(&time);
        assert_eq!(speed.canonical(), "m/s^2");
    }
}
