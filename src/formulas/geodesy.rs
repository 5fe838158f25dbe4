//! Great-circle geodesy on the mean-radius sphere: distance, initial
//! bearing, destination point and intermediate points.
//!
//! These are native builtins rather than checked formulas, but unlike the
//! math primitives they register full unit signatures: coordinates and
//! bearings in degrees, distances in metres. Checked functions that call
//! them get argument conversion and a known result unit.

use crate::check::{FunctionSignature, ParamSignature, ReturnUnits, Workspace};
use crate::compute::{EvalError, Value};
use crate::units::Unit;

/// IUGG mean earth radius.
const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

const COORD_PARAMS: [(&str, &str); 4] = [
    ("lat1", "degree"),
    ("lon1", "degree"),
    ("lat2", "degree"),
    ("lon2", "degree"),
];

pub fn install(ws: &mut Workspace) {
    ws.builtins.insert("distance", distance);
    ws.builtins.insert("bearing", bearing);
    ws.builtins.insert("destination", destination);
    ws.builtins.insert("greatcircle", greatcircle);

    let deg = Unit::new("degree");
    ws.signatures.insert(signature(
        "distance",
        &COORD_PARAMS,
        ReturnUnits::Single(Unit::new("m")),
    ));
    ws.signatures.insert(signature(
        "bearing",
        &COORD_PARAMS,
        ReturnUnits::Single(deg.clone()),
    ));
    ws.signatures.insert(signature(
        "destination",
        &[
            ("lat", "degree"),
            ("lon", "degree"),
            ("bearing", "degree"),
            ("distance", "m"),
        ],
        ReturnUnits::Tuple(vec![deg.clone(), deg.clone(), deg.clone()]),
    ));
    ws.signatures.insert(signature(
        "greatcircle",
        &[
            ("lat1", "degree"),
            ("lon1", "degree"),
            ("lat2", "degree"),
            ("lon2", "degree"),
            ("npts", "dimensionless"),
        ],
        ReturnUnits::Tuple(vec![deg.clone(), deg]),
    ));
}

fn signature(name: &str, params: &[(&str, &str)], returns: ReturnUnits) -> FunctionSignature {
    FunctionSignature {
        name: name.to_string(),
        params: params
            .iter()
            .map(|(n, u)| ParamSignature {
                name: n.to_string(),
                unit: Some(Unit::new(*u)),
            })
            .collect(),
        returns: Some(returns),
    }
}

/// Scalar/series validation shared by the broadcasting builtins: four
/// numeric operands, no tuples, no empty series.
fn check_operands(name: &str, args: &[Value], expected: usize) -> Result<usize, EvalError> {
    if args.len() != expected {
        return Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    if args.iter().any(|v| matches!(v, Value::Tuple(_))) {
        return Err(EvalError::Shape(format!(
            "tuple used as an operand of '{}'",
            name
        )));
    }
    if args.iter().any(|v| v.is_empty()) {
        return Err(EvalError::Shape(format!(
            "empty series used as an operand of '{}'",
            name
        )));
    }
    Ok(args.iter().map(Value::len).max().unwrap_or(1))
}

/// Element-wise application over four operands with scalar/series
/// broadcasting, mirroring how the interpreter broadcasts arithmetic.
fn elementwise(
    name: &str,
    args: &[Value],
    f: impl Fn(f64, f64, f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let len = check_operands(name, args, 4)?;
    if args.iter().all(|v| matches!(v, Value::Scalar(_))) {
        return Ok(Value::Scalar(f(
            args[0].get_at(0),
            args[1].get_at(0),
            args[2].get_at(0),
            args[3].get_at(0),
        )));
    }
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(f(
            args[0].get_at(i),
            args[1].get_at(i),
            args[2].get_at(i),
            args[3].get_at(i),
        ));
    }
    Ok(Value::Series(out))
}

fn distance(args: &[Value]) -> Result<Value, EvalError> {
    elementwise("distance", args, haversine_m)
}

fn bearing(args: &[Value]) -> Result<Value, EvalError> {
    elementwise("bearing", args, initial_bearing_deg)
}

/// `destination(lat, lon, bearing, distance) -> (lat, lon, back-bearing)`:
/// the point reached by moving along the given bearing for the given
/// distance, plus the bearing from there back to the origin.
fn destination(args: &[Value]) -> Result<Value, EvalError> {
    let len = check_operands("destination", args, 4)?;
    if args.iter().all(|v| matches!(v, Value::Scalar(_))) {
        let (lat, lon, back) = destination_point(
            args[0].get_at(0),
            args[1].get_at(0),
            args[2].get_at(0),
            args[3].get_at(0),
        );
        return Ok(Value::Tuple(vec![
            Value::Scalar(lat),
            Value::Scalar(lon),
            Value::Scalar(back),
        ]));
    }
    let mut lats = Vec::with_capacity(len);
    let mut lons = Vec::with_capacity(len);
    let mut backs = Vec::with_capacity(len);
    for i in 0..len {
        let (lat, lon, back) = destination_point(
            args[0].get_at(i),
            args[1].get_at(i),
            args[2].get_at(i),
            args[3].get_at(i),
        );
        lats.push(lat);
        lons.push(lon);
        backs.push(back);
    }
    Ok(Value::Tuple(vec![
        Value::Series(lats),
        Value::Series(lons),
        Value::Series(backs),
    ]))
}

/// `greatcircle(lat1, lon1, lat2, lon2, npts) -> (lats, lons)`: `npts`
/// evenly spaced intermediate points along the great circle, endpoints
/// excluded. Scalar coordinates only; undefined for coincident or
/// antipodal endpoints.
fn greatcircle(args: &[Value]) -> Result<Value, EvalError> {
    check_operands("greatcircle", args, 5)?;
    let lat1 = args[0].as_scalar()?;
    let lon1 = args[1].as_scalar()?;
    let lat2 = args[2].as_scalar()?;
    let lon2 = args[3].as_scalar()?;
    let npts = args[4].as_scalar()?.max(0.0) as usize;

    let delta = haversine_m(lat1, lon1, lat2, lon2) / MEAN_EARTH_RADIUS_M;
    if delta.sin().abs() < 1e-12 {
        return Err(EvalError::Shape(
            "great circle undefined for coincident or antipodal endpoints".to_string(),
        ));
    }

    let (la1, lo1) = (lat1.to_radians(), lon1.to_radians());
    let (la2, lo2) = (lat2.to_radians(), lon2.to_radians());
    let mut lats = Vec::with_capacity(npts);
    let mut lons = Vec::with_capacity(npts);
    for i in 1..=npts {
        let f = i as f64 / (npts as f64 + 1.0);
        // Spherical linear interpolation between the endpoint vectors.
        let a = ((1.0 - f) * delta).sin() / delta.sin();
        let b = (f * delta).sin() / delta.sin();
        let x = a * la1.cos() * lo1.cos() + b * la2.cos() * lo2.cos();
        let y = a * la1.cos() * lo1.sin() + b * la2.cos() * lo2.sin();
        let z = a * la1.sin() + b * la2.sin();
        lats.push(z.atan2(x.hypot(y)).to_degrees());
        lons.push(y.atan2(x).to_degrees());
    }
    Ok(Value::Tuple(vec![Value::Series(lats), Value::Series(lons)]))
}

fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (la1, la2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + la1.cos() * la2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_M * a.sqrt().asin()
}

fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (la1, la2) = (lat1.to_radians(), lat2.to_radians());
    let dlon = (lon2 - lon1).to_radians();
    let y = dlon.sin() * la2.cos();
    let x = la1.cos() * la2.sin() - la1.sin() * la2.cos() * dlon.cos();
    y.atan2(x).to_degrees()
}

fn destination_point(lat: f64, lon: f64, bearing: f64, dist_m: f64) -> (f64, f64, f64) {
    let la1 = lat.to_radians();
    let lo1 = lon.to_radians();
    let theta = bearing.to_radians();
    let delta = dist_m / MEAN_EARTH_RADIUS_M;
    let la2 = (la1.sin() * delta.cos() + la1.cos() * delta.sin() * theta.cos()).asin();
    let lo2 = lo1
        + (theta.sin() * delta.sin() * la1.cos()).atan2(delta.cos() - la1.sin() * la2.sin());
    let lat2 = la2.to_degrees();
    // Wrap into [-180, 180).
    let lon2 = (lo2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    let back = initial_bearing_deg(lat2, lon2, lat, lon);
    (lat2, lon2, back)
}
