//! Units of measure: the composite-unit algebra and the conversion registry.
pub mod parsed;
pub mod registry;

pub use parsed::ParsedUnit;
pub use registry::{Unit, UnitError, UnitRegistry, DIMENSIONLESS};
