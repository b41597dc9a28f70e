//! Great-circle distance between two points given in decimal degrees.
//!
//! The haversine formula is written in its half-angle cosine form:
//!
//! ```text
//! d = 2R asin( sqrt( 0.5 - cos(dlat)/2 + cos(lat_b) cos(lat_a) (1 - cos(dlon))/2 ) )
//! ```
//!
//! Downstream comparisons depend on this exact arrangement, so it must not
//! be swapped for another great-circle formula.

use crate::constants::EARTH_RADIUS_MILES;
use std::f64::consts::PI;

const DEGREES_TO_RADIANS: f64 = PI / 180.0;

/// Distance in statute miles on a sphere of radius [`EARTH_RADIUS_MILES`]
pub fn great_circle_miles(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    great_circle_distance(lat_a, lon_a, lat_b, lon_b, EARTH_RADIUS_MILES)
}

/// Distance on a sphere of the given radius, in the radius' unit
pub fn great_circle_distance(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64, radius: f64) -> f64 {
    let half_chord = 0.5 - ((lat_a - lat_b) * DEGREES_TO_RADIANS).cos() / 2.0
        + (lat_b * DEGREES_TO_RADIANS).cos()
            * (lat_a * DEGREES_TO_RADIANS).cos()
            * (1.0 - ((lon_a - lon_b) * DEGREES_TO_RADIANS).cos())
            / 2.0;

    // Round-off can push the term just outside [0, 1] for identical or antipodal points
    let clamped = half_chord.clamp(0.0, 1.0);

    2.0 * radius * clamped.sqrt().asin()
}
