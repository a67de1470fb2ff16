//! Raw point normalization.
//!
//! Turns decoded [`RawPoint`]s into [`ActivityRecord`]s with elapsed time `t`
//! and cumulative distance `d`, both starting at 0 and never decreasing.

use super::RawPoint;
use crate::activity::ActivityRecord;
use crate::gps::{filtered_distance, DistanceFilterOptions, GpsFix};

/// Sampling interval assumed until two explicit timestamps are seen.
const DEFAULT_INTERVAL_S: f64 = 1.0;

/// Elapsed seconds for every point.
///
/// Explicit timestamps are measured from the first one. Points without a
/// timestamp continue from the previous point using the last observed sampling
/// interval. Without any timestamp at all the sequence index is used.
fn elapsed_times(points: &[RawPoint]) -> Vec<f64> {
    let Some((first_idx, base)) = points
        .iter()
        .enumerate()
        .find_map(|(i, p)| p.time.map(|t| (i, t)))
    else {
        return (0..points.len()).map(|i| i as f64).collect();
    };

    let mut times = Vec::with_capacity(points.len());
    let mut interval = DEFAULT_INTERVAL_S;
    let mut prev_explicit: Option<f64> = None;

    for (i, point) in points.iter().enumerate() {
        let prev_t = times.last().copied();
        let t = match point.time {
            Some(time) => {
                let offset = (time - base).num_milliseconds() as f64 / 1000.0 + first_idx as f64;
                if let Some(prev) = prev_explicit {
                    let dt = offset - prev;
                    if dt > 0.0 {
                        interval = dt;
                    }
                }
                prev_explicit = Some(offset);
                offset
            }
            None => match prev_t {
                Some(prev) => prev + interval,
                None => i as f64,
            },
        };
        // out-of-order timestamps must not move time backwards
        times.push(prev_t.map_or(t, |prev| t.max(prev)).max(0.0));
    }

    times
}

fn valid_fix(point: &RawPoint, t: f64) -> Option<GpsFix> {
    let (lat, lon) = point.valid_position()?;
    Some(GpsFix::new(lat, lon, t).with_altitude(point.altitude))
}

/// Cumulative distance for every point.
///
/// A device-reported distance wins whenever the file carries one; it is
/// rebased on the first reported value and carried forward across points that
/// lack it. Otherwise distance accumulates through the GPS filter.
fn cumulative_distances(
    points: &[RawPoint],
    times: &[f64],
    options: &DistanceFilterOptions,
) -> Vec<f64> {
    if let Some(baseline) = points
        .iter()
        .find_map(|p| p.distance.filter(|d| d.is_finite()))
    {
        let mut current = 0.0_f64;
        return points
            .iter()
            .map(|p| {
                if let Some(device) = p.distance.filter(|d| d.is_finite()) {
                    current = current.max(device - baseline);
                }
                current
            })
            .collect();
    }

    let mut total = 0.0;
    let mut rejected = 0usize;
    let mut prev_fix: Option<GpsFix> = None;
    let mut distances = Vec::with_capacity(points.len());

    for (point, &t) in points.iter().zip(times) {
        if let Some(fix) = valid_fix(point, t) {
            if let Some(prev) = prev_fix {
                let delta = filtered_distance(&prev, &fix, options);
                if delta == 0.0 {
                    rejected += 1;
                }
                total += delta;
            }
            prev_fix = Some(fix);
        }
        distances.push(total);
    }

    tracing::debug!(
        points = points.len(),
        rejected,
        distance_m = total,
        "Accumulated GPS distance"
    );
    distances
}

/// Convert raw points to canonical records.
pub fn normalize_points(
    points: &[RawPoint],
    options: &DistanceFilterOptions,
) -> Vec<ActivityRecord> {
    let times = elapsed_times(points);
    let distances = cumulative_distances(points, &times, options);

    points
        .iter()
        .zip(times.into_iter().zip(distances))
        .map(|(point, (t, d))| ActivityRecord {
            t,
            d,
            latitude: point.latitude,
            longitude: point.longitude,
            heart_rate: point.heart_rate,
            power: point.power,
            cadence: point.cadence,
            speed: point.speed,
            temperature: point.temperature,
            altitude: point.altitude,
            extra: point.extra.clone(),
            ..Default::default()
        })
        .collect()
}
