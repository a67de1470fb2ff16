//! Best-effort splits: fastest time over canonical distances.

use crate::activity::ActivityRecord;
use serde::{Deserialize, Serialize};

/// Canonical split distances as (label, meters).
pub const SPLIT_DISTANCES: [(&str, f64); 9] = [
    ("100 m", 100.0),
    ("1 km", 1000.0),
    ("1 mile", 1609.344),
    ("5 km", 5000.0),
    ("10 km", 10_000.0),
    ("Half marathon", 21_097.5),
    ("Marathon", 42_195.0),
    ("50 km", 50_000.0),
    ("100 km", 100_000.0),
];

/// Fastest time over one canonical distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSplit {
    pub label: String,
    pub distance_m: f64,
    pub time_s: f64,
}

/// Minimum elapsed time to cover `distance_m` starting at any record.
///
/// The end of the span is interpolated between the two records that straddle
/// it, so results do not depend on where samples happen to fall.
pub fn best_split_time(records: &[ActivityRecord], distance_m: f64) -> Option<f64> {
    if records.len() < 2 || distance_m <= 0.0 {
        return None;
    }

    let mut best: Option<f64> = None;
    let mut j = 1;
    for i in 0..records.len() - 1 {
        let start = &records[i];
        let target = start.d + distance_m;
        j = j.max(i + 1);
        while j < records.len() && records[j].d < target {
            j += 1;
        }
        if j == records.len() {
            break;
        }

        let before = &records[j - 1];
        let after = &records[j];
        let span = after.d - before.d;
        let end_t = if span > 0.0 {
            before.t + (target - before.d) / span * (after.t - before.t)
        } else {
            after.t
        };
        let elapsed = end_t - start.t;
        if elapsed > 0.0 {
            best = Some(best.map_or(elapsed, |b: f64| b.min(elapsed)));
        }
    }
    best
}

/// Best splits for every canonical distance not longer than the activity.
pub fn best_splits(records: &[ActivityRecord]) -> Vec<BestSplit> {
    let total = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (last.d - first.d).max(0.0),
        _ => return Vec::new(),
    };

    SPLIT_DISTANCES
        .iter()
        .filter(|(_, distance)| *distance <= total)
        .filter_map(|(label, distance)| {
            best_split_time(records, *distance).map(|time_s| BestSplit {
                label: label.to_string(),
                distance_m: *distance,
                time_s,
            })
        })
        .collect()
}
