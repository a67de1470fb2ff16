//! Display-oriented transforms over processed records: chart series,
//! cumulative accumulation, pivot zones and windowing.

pub mod cache;
pub mod cumulative;
pub mod window;
pub mod zones;

pub use cache::TransformCache;
pub use cumulative::{accumulate, CumulativeMode};
pub use window::{
    axis_extent, axis_value, global_extent, window_records, window_with_extent, AxisExtent,
    WindowRange, XAxis,
};
pub use zones::{
    bucket_index, nice_bucket_size, pivot_zones, shared_pivot_zones, shared_zone_edges,
    time_in_buckets, zone_edges, PivotZoneSettings, SharedZones, ZoneBucket, ZoneStrategy,
};

use crate::activity::{column, ActivityRecord, Field};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
}

/// `(x, y)` pairs of one field under an axis, with accumulation applied.
/// Records where the field (after accumulation) or the axis value is absent
/// produce no point.
pub fn build_series(
    records: &[ActivityRecord],
    field: &Field,
    axis: XAxis,
    mode: CumulativeMode,
    start_time: Option<DateTime<Utc>>,
) -> Vec<SeriesPoint> {
    let values = accumulate(&column(records, field), mode);
    records
        .iter()
        .zip(values)
        .filter_map(|(record, y)| {
            let x = axis_value(record, axis, start_time)?;
            Some(SeriesPoint { x, y: y? })
        })
        .collect()
}
