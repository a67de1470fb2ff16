//! Pivot zones: time spent per value bucket.
//!
//! Buckets are weighted by elapsed time, not sample count: the segment between
//! record `i` and `i + 1` counts toward the bucket of record `i`'s value.

use crate::activity::{ActivityRecord, Field};
use crate::metrics::percentile;
use serde::{Deserialize, Serialize};

/// Minimum bucket count for cross-activity distributions.
pub const MIN_DISTRIBUTION_BINS: usize = 5;

/// How bucket boundaries are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStrategy {
    /// Buckets of equal width between min and max
    #[default]
    EqualRange,
    /// Buckets holding roughly equal numbers of samples
    Quantile,
}

/// Pivot zone settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotZoneSettings {
    /// Number of buckets
    pub count: usize,
    pub strategy: ZoneStrategy,
}

impl Default for PivotZoneSettings {
    fn default() -> Self {
        Self {
            count: 5,
            strategy: ZoneStrategy::EqualRange,
        }
    }
}

/// Time spent with a value inside `[lower, upper)`; the last bucket includes
/// its upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBucket {
    pub lower: f64,
    pub upper: f64,
    pub seconds: f64,
}

/// Bucket boundaries shared by several activities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedZones {
    pub edges: Vec<f64>,
    /// Per-activity buckets, in input order
    pub activities: Vec<Vec<ZoneBucket>>,
}

/// Extremes of the finite values.
fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().filter(|v| v.is_finite()).fold(None, |range, &v| match range {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// `count + 1` boundaries over `values`.
pub fn zone_edges(values: &[f64], count: usize, strategy: ZoneStrategy) -> Vec<f64> {
    let count = count.max(1);
    let Some((min, max)) = value_range(values) else {
        return Vec::new();
    };

    match strategy {
        ZoneStrategy::EqualRange => {
            let width = (max - min) / count as f64;
            let mut edges: Vec<f64> = (0..count).map(|i| min + width * i as f64).collect();
            edges.push(max);
            edges
        }
        ZoneStrategy::Quantile => {
            let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let mut edges: Vec<f64> = (0..=count)
                .filter_map(|i| percentile(&sorted, i as f64 * 100.0 / count as f64))
                .collect();
            // repeated values can produce equal quantiles; keep edges ordered
            for i in 1..edges.len() {
                if edges[i] < edges[i - 1] {
                    edges[i] = edges[i - 1];
                }
            }
            edges
        }
    }
}

/// Index of the bucket holding `value`, if it lies within the edges.
pub fn bucket_index(value: f64, edges: &[f64]) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if edges.len() < 2 || !(first..=last).contains(&value) {
        return None;
    }
    let buckets = edges.len() - 1;
    Some(
        (0..buckets)
            .find(|&i| value < edges[i + 1])
            .unwrap_or(buckets - 1),
    )
}

/// Time spent in each bucket defined by `edges`.
pub fn time_in_buckets(records: &[ActivityRecord], field: &Field, edges: &[f64]) -> Vec<ZoneBucket> {
    let mut buckets: Vec<ZoneBucket> = edges
        .windows(2)
        .map(|pair| ZoneBucket {
            lower: pair[0],
            upper: pair[1],
            seconds: 0.0,
        })
        .collect();

    for pair in records.windows(2) {
        let dt = pair[1].t - pair[0].t;
        if dt <= 0.0 {
            continue;
        }
        if let Some(index) = pair[0].value(field).and_then(|v| bucket_index(v, edges)) {
            buckets[index].seconds += dt;
        }
    }
    buckets
}

/// Pivot zones of one field of one activity.
pub fn pivot_zones(
    records: &[ActivityRecord],
    field: &Field,
    settings: &PivotZoneSettings,
) -> Vec<ZoneBucket> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.value(field)).collect();
    let edges = zone_edges(&values, settings.count, settings.strategy);
    time_in_buckets(records, field, &edges)
}

/// Round a raw bucket size up to 1, 2, 5 or 10 times a power of ten.
pub fn nice_bucket_size(range: f64, bins: usize) -> f64 {
    let raw = range / bins.max(1) as f64;
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .find(|step| normalized <= *step)
        .unwrap_or(10.0);
    step * magnitude
}

/// One edge set covering every activity, on round-number boundaries.
pub fn shared_zone_edges(activities: &[&[ActivityRecord]], field: &Field, bins: usize) -> Vec<f64> {
    let values: Vec<f64> = activities
        .iter()
        .flat_map(|records| records.iter().filter_map(|r| r.value(field)))
        .collect();
    let Some((min, max)) = value_range(&values) else {
        return Vec::new();
    };
    if max == min || !(max - min).is_finite() {
        return vec![min, max];
    }

    let size = nice_bucket_size(max - min, bins.max(MIN_DISTRIBUTION_BINS));
    let first = (min / size).floor() * size;
    let count = (((max - first) / size).ceil() as usize).max(1);
    (0..=count).map(|i| first + size * i as f64).collect()
}

/// Time-in-bucket per activity against one shared edge set.
pub fn shared_pivot_zones(
    activities: &[&[ActivityRecord]],
    field: &Field,
    bins: usize,
) -> SharedZones {
    let edges = shared_zone_edges(activities, field, bins);
    let per_activity = activities
        .iter()
        .map(|records| time_in_buckets(records, field, &edges))
        .collect();
    SharedZones {
        edges,
        activities: per_activity,
    }
}
