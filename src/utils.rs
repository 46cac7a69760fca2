//! Numeric helpers shared by the geometry and raster modules.

/// Tolerance used for every comparison of geographic coordinates.
///
/// Coordinates are in degrees; `1e-8` degrees is roughly a millimetre on the
/// ground, well below the resolution of any elevation product.
pub const GEO_EPSILON: f64 = 1e-8;

/// Equatorial radius of the WGS84 ellipsoid, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Compare two floats within [`GEO_EPSILON`].
#[inline]
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    approx_eq_eps(a, b, GEO_EPSILON)
}

/// Compare two floats within an explicit tolerance.
#[inline]
#[must_use]
pub fn approx_eq_eps(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

/// Haversine distance in meters between two (lon, lat) positions given in degrees.
#[must_use]
pub fn great_circle_distance(a_lon: f64, a_lat: f64, b_lon: f64, b_lat: f64) -> f64 {
    let d_lat = (b_lat - a_lat).to_radians();
    let d_lon = (b_lon - a_lon).to_radians();

    let t = (d_lat / 2.0).sin().powi(2)
        + a_lat.to_radians().cos() * b_lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * t.sqrt().atan2((1.0 - t).sqrt());

    EARTH_RADIUS_M * c
}

/// Linearly map `value` from `[from_min, from_max]` onto `[to_min, to_max]`.
///
/// Returns `None` when the source range is empty.
#[inline]
#[must_use]
pub fn remap(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> Option<f64> {
    let span = from_max - from_min;
    if span == 0.0 {
        return None;
    }
    Some(to_min + (value - from_min) / span * (to_max - to_min))
}
