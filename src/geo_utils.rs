//! Geographic utilities shared by all detectors.
//!
//! - Great-circle distance between fixes
//! - Local equirectangular projection to an east/north meter plane
//! - Bearings, angle wrapping and vector-to-direction conversion

use geo::{Distance, Haversine, Point};
use std::f64::consts::{PI, TAU};

use crate::FixPoint;

/// Mean earth radius in meters (same value geo uses for haversine).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Below this magnitude a vector has no meaningful direction.
pub const VECTOR_EPSILON: f64 = 1e-9;

/// Great-circle distance between two fixes in meters.
pub fn haversine_distance(a: &FixPoint, b: &FixPoint) -> f64 {
    Haversine::distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

/// Total great-circle length of a fix sequence in meters.
pub fn track_length(fixes: &[FixPoint]) -> f64 {
    fixes
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Equirectangular projection around a fixed origin.
///
/// Accurate to well under a meter at the few-hundred-meter scale of a
/// thermal, which is all the detectors need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin_lat: f64,
    origin_lon: f64,
    cos_lat: f64,
}

impl LocalProjection {
    pub fn new(origin_lat: f64, origin_lon: f64) -> Self {
        Self {
            origin_lat,
            origin_lon,
            cos_lat: origin_lat.to_radians().cos(),
        }
    }

    /// Projection centered on a fix.
    pub fn around(fix: &FixPoint) -> Self {
        Self::new(fix.lat, fix.lon)
    }

    /// Project a lat/lon pair to (east, north) meters.
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = (lon - self.origin_lon).to_radians() * self.cos_lat * EARTH_RADIUS_M;
        let y = (lat - self.origin_lat).to_radians() * EARTH_RADIUS_M;
        (x, y)
    }

    pub fn project_fix(&self, fix: &FixPoint) -> (f64, f64) {
        self.project(fix.lat, fix.lon)
    }

    /// Inverse of [`project`](Self::project): (east, north) meters to (lat, lon).
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lat = self.origin_lat + (y / EARTH_RADIUS_M).to_degrees();
        let lon = if self.cos_lat.abs() < VECTOR_EPSILON {
            self.origin_lon
        } else {
            self.origin_lon + (x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees()
        };
        (lat, lon)
    }
}

/// Initial great-circle bearing from `a` to `b` in degrees (0 = N, 90 = E).
pub fn bearing_deg(a: &FixPoint, b: &FixPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_deg(y.atan2(x).to_degrees())
}

/// Convert an (east, north) vector to (magnitude, direction in degrees).
///
/// Direction is where the vector points, 0 = N, 90 = E. A zero-length
/// vector yields direction 0.
pub fn vector_to_direction(vx: f64, vy: f64) -> (f64, f64) {
    let speed = vx.hypot(vy);
    if speed < VECTOR_EPSILON {
        return (0.0, 0.0);
    }
    (speed, normalize_deg(vx.atan2(vy).to_degrees()))
}

/// Unit (east, north) vector for a compass direction in degrees.
pub fn direction_to_unit(dir_deg: f64) -> (f64, f64) {
    let rad = dir_deg.to_radians();
    (rad.sin(), rad.cos())
}

/// Normalize degrees into [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Wrap radians into (-PI, PI].
pub fn wrap_pi(angle: f64) -> f64 {
    let mut a = (angle + PI).rem_euclid(TAU) - PI;
    if a <= -PI {
        a += TAU;
    }
    a
}

/// Shortest signed rotation from angle `from` to angle `to`, radians.
pub fn angle_delta(from: f64, to: f64) -> f64 {
    wrap_pi(to - from)
}
