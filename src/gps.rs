//! GPS distance and speed filtering between consecutive fixes.
//!
//! Two variants exist: [`filtered_distance`] accumulates track distance and
//! suppresses jitter, while [`gps_speed`] is permissive and only rejects values
//! that cannot be real motion.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Speeds above this are never real motion, whatever the sport.
pub const MAX_PLAUSIBLE_SPEED_MPS: f64 = 100.0;

/// Largest believable displacement within half a second.
const SUB_HALF_SECOND_MAX_JUMP_M: f64 = 50.0;

/// Thresholds for accumulating distance from GPS fixes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceFilterOptions {
    /// Deltas below this are treated as jitter (meters)
    pub min_move_m: f64,
    /// Deltas implying a higher speed are rejected (m/s)
    pub max_speed_mps: f64,
    /// Deltas above this within one second are rejected (meters)
    pub max_jump_m: f64,
    /// Include the altitude difference in the distance
    pub use_3d: bool,
}

impl Default for DistanceFilterOptions {
    fn default() -> Self {
        Self {
            min_move_m: 0.5,
            max_speed_mps: 50.0,
            max_jump_m: 100.0,
            use_3d: false,
        }
    }
}

/// One GPS fix with its elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Seconds since activity start
    pub t: f64,
    pub altitude: Option<f64>,
}

impl GpsFix {
    pub fn new(latitude: f64, longitude: f64, t: f64) -> Self {
        Self {
            latitude,
            longitude,
            t,
            altitude: None,
        }
    }

    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude;
        self
    }
}

/// Calculate horizontal distance between two GPS points (Haversine formula)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Distance between two fixes, optionally including the altitude delta.
pub fn fix_distance(a: &GpsFix, b: &GpsFix, use_3d: bool) -> f64 {
    let horizontal = haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude);
    match (use_3d, a.altitude, b.altitude) {
        (true, Some(alt_a), Some(alt_b)) => {
            let vertical = alt_b - alt_a;
            (horizontal * horizontal + vertical * vertical).sqrt()
        }
        _ => horizontal,
    }
}

/// Distance to add to the cumulative total when moving from `prev` to `cur`.
///
/// Returns 0 for rejected deltas: jitter below `min_move_m`, implied speed
/// above `max_speed_mps`, or a jump above `max_jump_m` within one second.
pub fn filtered_distance(prev: &GpsFix, cur: &GpsFix, options: &DistanceFilterOptions) -> f64 {
    let delta = fix_distance(prev, cur, options.use_3d);
    if !delta.is_finite() || delta < options.min_move_m {
        return 0.0;
    }

    let dt = cur.t - prev.t;
    if dt > 0.0 && delta / dt > options.max_speed_mps {
        return 0.0;
    }
    if dt <= 1.0 && delta > options.max_jump_m {
        return 0.0;
    }

    delta
}

/// Instantaneous speed (m/s) between two fixes for pace purposes.
///
/// Small movements count as real motion here; only implausible speeds and
/// sub-half-second jumps are rejected.
pub fn gps_speed(prev: &GpsFix, cur: &GpsFix) -> Option<f64> {
    let dt = cur.t - prev.t;
    if dt <= 0.0 {
        return None;
    }

    let delta = haversine_distance(prev.latitude, prev.longitude, cur.latitude, cur.longitude);
    if !delta.is_finite() {
        return None;
    }
    if dt < 0.5 && delta > SUB_HALF_SECOND_MAX_JUMP_M {
        return None;
    }

    let speed = delta / dt;
    if speed > MAX_PLAUSIBLE_SPEED_MPS {
        return None;
    }
    Some(speed)
}
