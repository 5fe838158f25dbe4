//! International Standard Atmosphere, expressed as checked formulas.
//!
//! The bodies below are deliberately written with mixed and composite units
//! (`K/m` lapse rate, `Pa` pressures, `m^2/s^2*K` gas constant): the
//! transformer verifies their coherence and inserts whatever scale factors
//! the arithmetic needs. Valid through the troposphere and the lower
//! stratosphere (constant-temperature layer).

use crate::check::{CheckError, Workspace};
use crate::syntax::build::*;
use crate::syntax::FunctionDef;

/// Registers the `isa.*` constants and transforms the atmosphere formulas.
pub fn install(ws: &mut Workspace) -> Result<(), Vec<CheckError>> {
    register_constants(ws).map_err(|e| vec![e])?;
    ws.transform(&temperature())?;
    ws.transform(&pressure())?;
    ws.transform(&density())?;
    ws.transform(&atmosphere())?;
    ws.transform(&sound_speed())?;
    Ok(())
}

fn register_constants(ws: &mut Workspace) -> Result<(), CheckError> {
    ws.register_constant("isa", "GAMMA", 1.40, "dimensionless")?;
    ws.register_constant("isa", "P_0", 101_325.0, "Pa")?;
    ws.register_constant("isa", "R", 287.052_87, "m^2/s^2*K")?;
    ws.register_constant("isa", "RHO_0", 1.225, "kg/m^3")?;
    ws.register_constant("isa", "SPECIFIC_GAS_CONSTANT", 287.052_87, "J/kg*K")?;
    ws.register_constant("isa", "T_SL", 288.15, "K")?;
    ws.register_constant("isa", "STRATOSPHERE_TEMP", 216.65, "K")?;
    ws.register_constant("isa", "G_0", 9.806_65, "m/s^2")?;
    ws.register_constant("isa", "BETA_T", -0.0065, "K/m")?;
    ws.register_constant("isa", "TROPOPAUSE_PRESS", 22_632.040_1, "Pa")?;
    ws.register_constant("isa", "H_TROP", 11_000.0, "m")?;
    // Scale height of the isothermal layer, R * T_strat / g0.
    ws.register_constant("isa", "SCALE_H", 6_341.552_2, "m")?;
    Ok(())
}

/// `temperature(h: m) -> K`, clipped at the stratosphere floor.
pub fn temperature() -> FunctionDef {
    function(
        "temperature",
        vec![param("h", "m")],
        returns("K"),
        vec![
            declare(
                "temp",
                "K",
                call(
                    "maximum",
                    vec![
                        attr("isa", "T_SL") + attr("isa", "BETA_T") * name("h"),
                        attr("isa", "STRATOSPHERE_TEMP"),
                    ],
                ),
            ),
            ret(name("temp")),
        ],
    )
}

/// `pressure(h: m) -> Pa`: barometric formula in the troposphere, an
/// exponential decay above the tropopause.
pub fn pressure() -> FunctionDef {
    function(
        "pressure",
        vec![param("h", "m")],
        returns("Pa"),
        vec![
            declare("temp", "K", call("temperature", vec![name("h")])),
            declare("h0", "m", num(0.0)),
            declare("temp_0", "K", call("temperature", vec![name("h0")])),
            declare(
                "press_trop",
                "Pa",
                attr("isa", "P_0")
                    * (name("temp") / name("temp_0"))
                        .pow(-(attr("isa", "G_0") / (attr("isa", "BETA_T") * attr("isa", "R")))),
            ),
            declare(
                "press_strat",
                "Pa",
                attr("isa", "TROPOPAUSE_PRESS")
                    * call(
                        "exp",
                        vec![-((name("h") - attr("isa", "H_TROP")) / attr("isa", "SCALE_H"))],
                    ),
            ),
            declare(
                "press",
                "Pa",
                call(
                    "where_select",
                    vec![
                        name("h").lt(attr("isa", "H_TROP")),
                        name("press_trop"),
                        name("press_strat"),
                    ],
                ),
            ),
            ret(name("press")),
        ],
    )
}

/// `density(h: m) -> kg/m^3` via the ideal gas law.
pub fn density() -> FunctionDef {
    function(
        "density",
        vec![param("h", "m")],
        returns("kg/m^3"),
        vec![
            declare("p", "Pa", call("pressure", vec![name("h")])),
            declare("temp", "K", call("temperature", vec![name("h")])),
            declare("rho", "kg/m^3", name("p") / (attr("isa", "R") * name("temp"))),
            ret(name("rho")),
        ],
    )
}

/// `atmosphere(h: m) -> (Pa, kg/m^3, K)`.
pub fn atmosphere() -> FunctionDef {
    function(
        "atmosphere",
        vec![param("h", "m")],
        returns_tuple(&["Pa", "kg/m^3", "K"]),
        vec![
            declare("p", "Pa", call("pressure", vec![name("h")])),
            declare("rho", "kg/m^3", call("density", vec![name("h")])),
            declare("temp", "K", call("temperature", vec![name("h")])),
            ret(tuple(vec![name("p"), name("rho"), name("temp")])),
        ],
    )
}

/// `sound_speed(h: m) -> m/s`, `sqrt(gamma * R * T)`.
pub fn sound_speed() -> FunctionDef {
    function(
        "sound_speed",
        vec![param("h", "m")],
        returns("m/s"),
        vec![
            declare("temp", "K", call("temperature", vec![name("h")])),
            declare(
                "a",
                "m/s",
                call(
                    "sqrt",
                    vec![attr("isa", "GAMMA") * attr("isa", "R") * name("temp")],
                ),
            ),
            ret(name("a")),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Value;
    use approx::assert_relative_eq;

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        install(&mut ws).unwrap();
        ws
    }

    fn scalar_call(ws: &Workspace, f: &str, arg: f64) -> f64 {
        ws.call(f, &[Value::Scalar(arg)]).unwrap().as_scalar().unwrap()
    }

    #[test]
    fn temperature_follows_the_lapse_rate() {
        let ws = workspace();
        assert_relative_eq!(scalar_call(&ws, "temperature", 0.0), 288.15, max_relative = 1e-6);
        assert_relative_eq!(
            scalar_call(&ws, "temperature", 1000.0),
            281.65,
            max_relative = 1e-4
        );
        // Clipped below the stratosphere floor.
        assert_relative_eq!(
            scalar_call(&ws, "temperature", 20_000.0),
            216.65,
            max_relative = 1e-6
        );
    }

    #[test]
    fn pressure_matches_the_barometric_formula() {
        let ws = workspace();
        assert_relative_eq!(
            scalar_call(&ws, "pressure", 0.0),
            101_325.0,
            max_relative = 1e-6
        );
        assert_relative_eq!(
            scalar_call(&ws, "pressure", 5000.0),
            54_020.0,
            max_relative = 1e-3
        );
        // Isothermal layer above the tropopause.
        assert_relative_eq!(
            scalar_call(&ws, "pressure", 12_000.0),
            19_330.0,
            max_relative = 1e-3
        );
    }

    #[test]
    fn sea_level_density_and_sound_speed() {
        let ws = workspace();
        assert_relative_eq!(scalar_call(&ws, "density", 0.0), 1.225, max_relative = 1e-4);
        assert_relative_eq!(
            scalar_call(&ws, "sound_speed", 0.0),
            340.29,
            max_relative = 1e-3
        );
    }

    #[test]
    fn atmosphere_bundles_the_three_profiles() {
        let ws = workspace();
        let out = ws.call("atmosphere", &[Value::Scalar(0.0)]).unwrap();
        match out {
            Value::Tuple(elems) => {
                assert_relative_eq!(
                    elems[0].as_scalar().unwrap(),
                    101_325.0,
                    max_relative = 1e-6
                );
                assert_relative_eq!(elems[1].as_scalar().unwrap(), 1.225, max_relative = 1e-4);
                assert_relative_eq!(elems[2].as_scalar().unwrap(), 288.15, max_relative = 1e-6);
            }
            other => panic!("expected a tuple, got {:?}", other),
        }
    }

    #[test]
    fn altitude_series_broadcast_through_the_model() {
        let ws = workspace();
        let out = ws
            .call("temperature", &[Value::Series(vec![0.0, 1000.0, 20_000.0])])
            .unwrap();
        match out {
            Value::Series(v) => {
                assert_relative_eq!(v[0], 288.15, max_relative = 1e-6);
                assert_relative_eq!(v[1], 281.65, max_relative = 1e-4);
                assert_relative_eq!(v[2], 216.65, max_relative = 1e-6);
            }
            other => panic!("expected a series, got {:?}", other),
        }
    }
}
