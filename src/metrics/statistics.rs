//! Activity statistics over processed records.
//!
//! Sparse data never fails: missing channels simply produce absent entries.

use super::power::{compute_power_metrics, PowerMetrics};
use super::splits::{best_splits, BestSplit};
use crate::activity::{present_fields, ActivityRecord, Field, Metric};
use crate::processing::{pace_series, PaceSmoothingSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Segments slower than this do not count as moving (m/s).
pub const MOVING_SPEED_THRESHOLD_MPS: f64 = 0.5;

/// Pace series longer than this use percentiles for min/max when GPS-derived.
const PACE_PERCENTILE_MIN_SAMPLES: usize = 10;

/// Count, extremes and mean of one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl FieldStats {
    /// Summarize the given values; `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        (count > 0).then(|| Self {
            count,
            min,
            max,
            avg: sum / count as f64,
        })
    }
}

/// Pace summary in min/km. `min` is the fastest pace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    /// Total time over total distance
    pub avg: Option<f64>,
    /// Whether min/max are 5th/95th percentiles of a GPS-derived series
    pub percentile_bounds: bool,
}

/// Statistics of one processed activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStatistics {
    /// Elapsed time between first and last record, in seconds
    pub duration_s: f64,
    /// Distance between first and last record, in meters
    pub distance_m: f64,
    /// Time spent faster than the moving threshold, in seconds
    pub moving_time_s: f64,
    /// Sum of altitude increases; absent without altitude data
    pub elevation_gain_m: Option<f64>,
    /// Sum of altitude decreases (positive); absent without altitude data
    pub elevation_loss_m: Option<f64>,
    /// Per-field statistics keyed by field name
    pub fields: BTreeMap<String, FieldStats>,
    pub pace: Option<PaceStats>,
    pub best_splits: Vec<BestSplit>,
    pub power: Option<PowerMetrics>,
}

impl ActivityStatistics {
    /// Statistics of one field.
    pub fn field(&self, field: &Field) -> Option<&FieldStats> {
        self.fields.get(field.key())
    }

    /// Statistics of one canonical metric.
    pub fn metric(&self, metric: Metric) -> Option<&FieldStats> {
        self.fields.get(metric.key())
    }
}

fn span(records: &[ActivityRecord], value: impl Fn(&ActivityRecord) -> f64) -> f64 {
    match (records.first(), records.last()) {
        (Some(first), Some(last)) if records.len() >= 2 => (value(last) - value(first)).max(0.0),
        _ => 0.0,
    }
}

/// Total ascent and descent over consecutive altitude samples.
pub fn elevation_change(records: &[ActivityRecord]) -> Option<(f64, f64)> {
    let mut altitudes = records.iter().filter_map(|r| r.altitude);
    let mut previous = altitudes.next()?;
    let (mut gain, mut loss) = (0.0, 0.0);
    for altitude in altitudes {
        let delta = altitude - previous;
        if delta > 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
        previous = altitude;
    }
    Some((gain, loss))
}

/// Time spent moving faster than [`MOVING_SPEED_THRESHOLD_MPS`].
pub fn moving_time(records: &[ActivityRecord]) -> f64 {
    records
        .windows(2)
        .filter_map(|pair| {
            let dt = pair[1].t - pair[0].t;
            let dd = pair[1].d - pair[0].d;
            (dt > 0.0 && dd / dt > MOVING_SPEED_THRESHOLD_MPS).then_some(dt)
        })
        .sum()
}

/// Linear-interpolated percentile of sorted values, `p` in [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Pace statistics recomputed from the records' speeds, smoothing
/// GPS-derived speed the same way the processing pipeline does.
pub fn pace_statistics(
    records: &[ActivityRecord],
    smoothing: &PaceSmoothingSettings,
) -> Option<PaceStats> {
    let series = pace_series(records, smoothing);
    let mut paces: Vec<f64> = series.pace.iter().flatten().copied().collect();
    if paces.is_empty() {
        return None;
    }
    paces.sort_by(|a, b| a.total_cmp(b));

    let percentile_bounds =
        series.is_gps_dominated() && paces.len() > PACE_PERCENTILE_MIN_SAMPLES;
    let (min, max) = if percentile_bounds {
        (percentile(&paces, 5.0)?, percentile(&paces, 95.0)?)
    } else {
        (paces[0], paces[paces.len() - 1])
    };

    let duration = span(records, |r| r.t);
    let distance = span(records, |r| r.d);
    let avg = (duration > 0.0 && distance > 0.0).then(|| (duration / 60.0) / (distance / 1000.0));

    Some(PaceStats {
        count: paces.len(),
        min,
        max,
        avg,
        percentile_bounds,
    })
}

/// Compute every statistic of a processed activity with default pace smoothing.
pub fn compute_statistics(records: &[ActivityRecord]) -> ActivityStatistics {
    compute_statistics_with(records, &PaceSmoothingSettings::default())
}

/// Compute every statistic of a processed activity.
pub fn compute_statistics_with(
    records: &[ActivityRecord],
    pace_smoothing: &PaceSmoothingSettings,
) -> ActivityStatistics {
    let (elevation_gain_m, elevation_loss_m) = match elevation_change(records) {
        Some((gain, loss)) => (Some(gain), Some(loss)),
        None => (None, None),
    };

    let fields = present_fields(records)
        .into_iter()
        .filter(|field| *field != Field::Metric(Metric::Pace))
        .filter_map(|field| {
            FieldStats::from_values(records.iter().filter_map(|r| r.value(&field)))
                .map(|stats| (field.key().to_string(), stats))
        })
        .collect();

    let statistics = ActivityStatistics {
        duration_s: span(records, |r| r.t),
        distance_m: span(records, |r| r.d),
        moving_time_s: moving_time(records),
        elevation_gain_m,
        elevation_loss_m,
        fields,
        pace: pace_statistics(records, pace_smoothing),
        best_splits: best_splits(records),
        power: compute_power_metrics(records),
    };

    tracing::debug!(
        records = records.len(),
        duration_s = statistics.duration_s,
        distance_m = statistics.distance_m,
        "Computed activity statistics"
    );
    statistics
}
