//! Ready-made formula library: ISA atmosphere, airspeed conversions and
//! great-circle geodesy, all installed into a [`Workspace`].

pub mod aero;
pub mod geodesy;
pub mod isa;

use crate::check::{CheckError, Workspace};

/// A workspace with the full formula library installed: `isa.*` constants,
/// the atmosphere functions, the airspeed conversions and the geodesy
/// builtins.
pub fn standard_workspace() -> Result<Workspace, Vec<CheckError>> {
    let mut ws = Workspace::new();
    isa::install(&mut ws)?;
    aero::install(&mut ws)?;
    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_full_library_installs_cleanly() {
        let ws = standard_workspace().unwrap();
        for f in [
            "temperature",
            "pressure",
            "density",
            "atmosphere",
            "sound_speed",
            "tas2mach",
            "mach2tas",
            "eas2tas",
            "tas2eas",
            "cas2tas",
            "tas2cas",
            "mach2cas",
            "cas2mach",
        ] {
            assert!(ws.is_transformed(f), "{} missing", f);
        }
        // Modeled builtins carry signatures without a rewritten body.
        for f in ["distance", "bearing", "destination", "greatcircle"] {
            assert!(ws.signatures().contains(f), "{} missing", f);
        }
    }
}
