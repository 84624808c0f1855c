//! Great-circle distance between stop coordinates.

/// Degrees to radians.
const DEG_TO_RAD: f64 = 0.017453292519943295;

/// Mean earth diameter in miles (2 × 3959) times feet per mile.
const EARTH_DIAMETER_FEET: f64 = 5280.0 * 7918.0;

/// Haversine distance in feet between two points given in decimal degrees.
pub fn distance_feet(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = 0.5 - ((lat2 - lat1) * DEG_TO_RAD).cos() / 2.0
        + (lat1 * DEG_TO_RAD).cos()
            * (lat2 * DEG_TO_RAD).cos()
            * (1.0 - ((lon2 - lon1) * DEG_TO_RAD).cos())
            / 2.0;
    // rounding can push antipodal points a hair past 1
    EARTH_DIAMETER_FEET * a.clamp(0.0, 1.0).sqrt().asin()
}
