//! Airspeed conversions (true / equivalent / calibrated airspeed, Mach),
//! expressed as checked formulas over the ISA model.
//!
//! Inputs follow aviation convention: speeds in knots, altitudes in feet.
//! The atmosphere functions declare metric parameters, so every call below
//! crosses a unit boundary the transformer has to bridge.

use crate::check::{CheckError, Workspace};
use crate::syntax::build::*;
use crate::syntax::FunctionDef;

/// Transforms the conversion formulas. Requires [`super::isa::install`]
/// to have run first.
pub fn install(ws: &mut Workspace) -> Result<(), Vec<CheckError>> {
    ws.transform(&tas2mach())?;
    ws.transform(&mach2tas())?;
    ws.transform(&eas2tas())?;
    ws.transform(&tas2eas())?;
    ws.transform(&cas2tas())?;
    ws.transform(&tas2cas())?;
    ws.transform(&mach2cas())?;
    ws.transform(&cas2mach())?;
    Ok(())
}

/// `tas2mach(tas: kts, h: ft) -> dimensionless`.
pub fn tas2mach() -> FunctionDef {
    function(
        "tas2mach",
        vec![param("tas", "kts"), param("h", "ft")],
        returns("dimensionless"),
        vec![
            declare("a", "kts", call("sound_speed", vec![name("h")])),
            declare("mach", "dimensionless", name("tas") / name("a")),
            ret(name("mach")),
        ],
    )
}

/// `mach2tas(mach: dimensionless, h: ft) -> kts`.
pub fn mach2tas() -> FunctionDef {
    function(
        "mach2tas",
        vec![param("mach", "dimensionless"), param("h", "ft")],
        returns("kts"),
        vec![
            declare("a", "kts", call("sound_speed", vec![name("h")])),
            declare("tas", "kts", name("mach") * name("a")),
            ret(name("tas")),
        ],
    )
}

/// `eas2tas(eas: kts, h: ft) -> kts`, density-ratio correction.
pub fn eas2tas() -> FunctionDef {
    function(
        "eas2tas",
        vec![param("eas", "kts"), param("h", "ft")],
        returns("kts"),
        vec![
            declare("rho", "kg/m^3", call("density", vec![name("h")])),
            declare(
                "tas",
                "kts",
                name("eas") * call("sqrt", vec![attr("isa", "RHO_0") / name("rho")]),
            ),
            ret(name("tas")),
        ],
    )
}

/// `tas2eas(tas: kts, h: ft) -> kts`.
pub fn tas2eas() -> FunctionDef {
    function(
        "tas2eas",
        vec![param("tas", "kts"), param("h", "ft")],
        returns("kts"),
        vec![
            declare("rho", "kg/m^3", call("density", vec![name("h")])),
            declare(
                "eas",
                "kts",
                name("tas") * call("sqrt", vec![name("rho") / attr("isa", "RHO_0")]),
            ),
            ret(name("eas")),
        ],
    )
}

/// `cas2tas(cas: kts, h: ft) -> kts`: compressible dynamic pressure at sea
/// level, re-expanded at altitude.
pub fn cas2tas() -> FunctionDef {
    function(
        "cas2tas",
        vec![param("cas", "kts"), param("h", "ft")],
        returns("kts"),
        vec![
            destructure(&["p", "rho", "temp"], call("atmosphere", vec![name("h")])),
            declare(
                "qdyn",
                "Pa",
                attr("isa", "P_0")
                    * ((num(1.0)
                        + attr("isa", "RHO_0") * name("cas") * name("cas")
                            / (num(7.0) * attr("isa", "P_0")))
                    .pow(num(3.5))
                        - num(1.0)),
            ),
            declare(
                "tas_sq",
                "m^2/s^2",
                num(7.0) * name("p") / name("rho")
                    * ((num(1.0) + name("qdyn") / name("p")).pow(num(2.0) / num(7.0)) - num(1.0)),
            ),
            declare("tas_abs", "m/s", call("sqrt", vec![name("tas_sq")])),
            declare(
                "tas_signed",
                "m/s",
                call(
                    "where_select",
                    vec![name("cas").lt(num(0.0)), -name("tas_abs"), name("tas_abs")],
                ),
            ),
            declare("tas", "kts", name("tas_signed")),
            ret(name("tas")),
        ],
    )
}

/// `tas2cas(tas: kts, h: ft) -> kts`, inverse of [`cas2tas`].
pub fn tas2cas() -> FunctionDef {
    function(
        "tas2cas",
        vec![param("tas", "kts"), param("h", "ft")],
        returns("kts"),
        vec![
            destructure(&["p", "rho", "temp"], call("atmosphere", vec![name("h")])),
            declare("tas_si", "m/s", name("tas")),
            declare(
                "qdyn",
                "Pa",
                name("p")
                    * ((num(1.0)
                        + name("rho") * name("tas_si") * name("tas_si") / (num(7.0) * name("p")))
                    .pow(num(3.5))
                        - num(1.0)),
            ),
            declare(
                "cas_sq",
                "m^2/s^2",
                num(7.0) * attr("isa", "P_0") / attr("isa", "RHO_0")
                    * ((name("qdyn") / attr("isa", "P_0") + num(1.0)).pow(num(2.0) / num(7.0))
                        - num(1.0)),
            ),
            declare("cas_abs", "m/s", call("sqrt", vec![name("cas_sq")])),
            declare(
                "cas_signed",
                "m/s",
                call(
                    "where_select",
                    vec![
                        name("tas_si").lt(num(0.0)),
                        -name("cas_abs"),
                        name("cas_abs"),
                    ],
                ),
            ),
            declare("cas", "kts", name("cas_signed")),
            ret(name("cas")),
        ],
    )
}

/// `mach2cas(mach: dimensionless, h: ft) -> kts`.
pub fn mach2cas() -> FunctionDef {
    function(
        "mach2cas",
        vec![param("mach", "dimensionless"), param("h", "ft")],
        returns("kts"),
        vec![
            declare("tas", "kts", call("mach2tas", vec![name("mach"), name("h")])),
            declare("cas", "kts", call("tas2cas", vec![name("tas"), name("h")])),
            ret(name("cas")),
        ],
    )
}

/// `cas2mach(cas: kts, h: ft) -> dimensionless`.
pub fn cas2mach() -> FunctionDef {
    function(
        "cas2mach",
        vec![param("cas", "kts"), param("h", "ft")],
        returns("dimensionless"),
        vec![
            declare("tas", "kts", call("cas2tas", vec![name("cas"), name("h")])),
            declare(
                "mach",
                "dimensionless",
                call("tas2mach", vec![name("tas"), name("h")]),
            ),
            ret(name("mach")),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Value;
    use crate::formulas::standard_workspace;
    use approx::assert_relative_eq;

    fn call2(ws: &Workspace, f: &str, a: f64, b: f64) -> f64 {
        ws.call(f, &[Value::Scalar(a), Value::Scalar(b)])
            .unwrap()
            .as_scalar()
            .unwrap()
    }

    #[test]
    fn mach_number_at_altitude() {
        let ws = standard_workspace().unwrap();
        assert_relative_eq!(
            call2(&ws, "tas2mach", 300.0, 30_000.0),
            0.509,
            max_relative = 2e-3
        );
        assert_relative_eq!(
            call2(&ws, "mach2tas", 0.8, 35_000.0),
            461.1,
            max_relative = 2e-3
        );
    }

    #[test]
    fn equivalent_airspeed_round_trip() {
        let ws = standard_workspace().unwrap();
        let tas = call2(&ws, "eas2tas", 250.0, 30_000.0);
        assert_relative_eq!(tas, 408.7, max_relative = 2e-3);
        assert_relative_eq!(
            call2(&ws, "tas2eas", tas, 30_000.0),
            250.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn calibrated_airspeed_round_trip() {
        let ws = standard_workspace().unwrap();
        let tas = call2(&ws, "cas2tas", 250.0, 30_000.0);
        assert_relative_eq!(tas, 393.7, max_relative = 2e-3);
        assert_relative_eq!(
            call2(&ws, "tas2cas", tas, 30_000.0),
            250.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn mach_and_cas_agree_through_both_paths() {
        let ws = standard_workspace().unwrap();
        let mach = call2(&ws, "cas2mach", 250.0, 30_000.0);
        assert_relative_eq!(
            call2(&ws, "mach2cas", mach, 30_000.0),
            250.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn negative_calibrated_airspeed_keeps_its_sign() {
        let ws = standard_workspace().unwrap();
        let tas = call2(&ws, "cas2tas", -250.0, 30_000.0);
        assert_relative_eq!(tas, -393.7, max_relative = 2e-3);
    }

    #[test]
    fn airspeed_series_broadcast() {
        let ws = standard_workspace().unwrap();
        let out = ws
            .call(
                "tas2mach",
                &[Value::Series(vec![300.0, 400.0]), Value::Scalar(30_000.0)],
            )
            .unwrap();
        match out {
            Value::Series(v) => {
                assert_relative_eq!(v[0], 0.509, max_relative = 2e-3);
                assert_relative_eq!(v[1], 0.679, max_relative = 2e-3);
            }
            other => panic!("expected a series, got {:?}", other),
        }
    }
}
