//! Windowing of record timelines by a percentage range of an axis.

use crate::activity::{Activity, ActivityRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Horizontal axis of a chart or window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XAxis {
    /// Elapsed seconds
    #[default]
    Time,
    /// Cumulative meters
    Distance,
    /// Wall-clock time as Unix epoch milliseconds
    LocalTime,
}

/// Axis value of a record. Local time needs the activity start time.
pub fn axis_value(
    record: &ActivityRecord,
    axis: XAxis,
    start_time: Option<DateTime<Utc>>,
) -> Option<f64> {
    match axis {
        XAxis::Time => Some(record.t),
        XAxis::Distance => Some(record.d),
        XAxis::LocalTime => {
            start_time.map(|start| start.timestamp_millis() as f64 + record.t * 1000.0)
        }
    }
}

/// Minimum and maximum axis value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisExtent {
    pub min: f64,
    pub max: f64,
}

impl AxisExtent {
    /// Extent covering both.
    pub fn merge(self, other: AxisExtent) -> AxisExtent {
        AxisExtent {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Value range for a percentage range. 0 % and 100 % map exactly onto the
    /// extent so boundary records are never lost to rounding.
    pub fn value_range(&self, window: &WindowRange) -> (f64, f64) {
        let span = self.max - self.min;
        let lo = if window.start_percent <= 0.0 {
            self.min
        } else {
            self.min + span * window.start_percent / 100.0
        };
        let hi = if window.end_percent >= 100.0 {
            self.max
        } else {
            self.min + span * window.end_percent / 100.0
        };
        (lo, hi)
    }
}

/// A sub-range of an axis in percent of its extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowRange {
    pub start_percent: f64,
    pub end_percent: f64,
}

impl WindowRange {
    pub fn new(start_percent: f64, end_percent: f64) -> Self {
        Self {
            start_percent,
            end_percent,
        }
    }

    /// Whether the window covers the whole axis.
    pub fn is_full(&self) -> bool {
        self.start_percent <= 0.0 && self.end_percent >= 100.0
    }
}

impl Default for WindowRange {
    fn default() -> Self {
        Self::new(0.0, 100.0)
    }
}

/// Extent of one record timeline. Fewer than two records, or equal min and
/// max, yield no extent.
pub fn axis_extent(
    records: &[ActivityRecord],
    axis: XAxis,
    start_time: Option<DateTime<Utc>>,
) -> Option<AxisExtent> {
    if records.len() < 2 {
        return None;
    }
    let extent = records
        .iter()
        .filter_map(|r| axis_value(r, axis, start_time))
        .fold(None, |extent: Option<AxisExtent>, v| {
            let point = AxisExtent { min: v, max: v };
            Some(extent.map_or(point, |e| e.merge(point)))
        })?;
    (extent.max > extent.min).then_some(extent)
}

/// Extent over several activities.
pub fn global_extent(activities: &[&Activity], axis: XAxis) -> Option<AxisExtent> {
    activities
        .iter()
        .filter_map(|a| axis_extent(a.records(), axis, a.start_time))
        .reduce(AxisExtent::merge)
}

/// Records whose axis value lies inside the window of `extent`, boundaries
/// included.
pub fn window_with_extent(
    records: &[ActivityRecord],
    axis: XAxis,
    start_time: Option<DateTime<Utc>>,
    extent: &AxisExtent,
    window: &WindowRange,
) -> Vec<ActivityRecord> {
    let (lo, hi) = extent.value_range(window);
    records
        .iter()
        .filter(|r| axis_value(r, axis, start_time).is_some_and(|x| x >= lo && x <= hi))
        .cloned()
        .collect()
}

/// Trim records to a window of their own extent. Without an extent the records
/// are returned unchanged.
pub fn window_records(
    records: &[ActivityRecord],
    axis: XAxis,
    start_time: Option<DateTime<Utc>>,
    window: &WindowRange,
) -> Vec<ActivityRecord> {
    match axis_extent(records, axis, start_time) {
        Some(extent) => window_with_extent(records, axis, start_time, &extent, window),
        None => records.to_vec(),
    }
}
