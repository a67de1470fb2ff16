//! Derived metrics: pace, grade and vertical speed.
//!
//! A derived value is left absent whenever its denominator is zero; it is
//! never defaulted to 0.

use super::smoothing::{moving_average, DEFAULT_WINDOW};
use crate::activity::ActivityRecord;
use crate::gps::{gps_speed, GpsFix};
use serde::{Deserialize, Serialize};

/// Extra smoothing applied to GPS-derived speed and pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PaceSmoothingSettings {
    pub enabled: bool,
    /// Window in GPS-derived samples
    pub window: usize,
}

impl Default for PaceSmoothingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Where the speed behind a pace value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSource {
    /// Speed recorded by the device
    Embedded,
    /// Speed between two consecutive GPS fixes
    Gps,
    /// Cumulative distance over elapsed time
    Cumulative,
}

/// Pace of every record along with the speed it was computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaceSeries {
    /// Pace in min/km
    pub pace: Vec<Option<f64>>,
    /// Speed in m/s
    pub speed: Vec<Option<f64>>,
    pub sources: Vec<Option<SpeedSource>>,
}

impl PaceSeries {
    /// Number of pace values backed by GPS-derived speed.
    pub fn gps_count(&self) -> usize {
        self.pace
            .iter()
            .zip(&self.sources)
            .filter(|(p, s)| p.is_some() && **s == Some(SpeedSource::Gps))
            .count()
    }

    /// Whether most pace values are GPS-derived.
    pub fn is_gps_dominated(&self) -> bool {
        let total = self.pace.iter().filter(|p| p.is_some()).count();
        total > 0 && self.gps_count() * 2 > total
    }
}

/// Convert a speed in m/s to a pace in min/km.
pub fn speed_to_pace(speed: f64) -> Option<f64> {
    (speed.is_finite() && speed > 0.0).then(|| 1000.0 / (speed * 60.0))
}

fn record_fix(record: &ActivityRecord) -> Option<GpsFix> {
    let (lat, lon) = record.position()?;
    Some(GpsFix::new(lat, lon, record.t).with_altitude(record.altitude))
}

/// Speed of record `i` by preference: embedded, GPS, then cumulative.
fn record_speed(records: &[ActivityRecord], i: usize) -> Option<(f64, SpeedSource)> {
    let current = &records[i];
    if let Some(speed) = current.speed.filter(|s| s.is_finite() && *s > 0.0) {
        return Some((speed, SpeedSource::Embedded));
    }

    let previous = i.checked_sub(1).map(|p| &records[p])?;
    if let Some(speed) = record_fix(previous)
        .zip(record_fix(current))
        .and_then(|(a, b)| gps_speed(&a, &b))
    {
        return Some((speed, SpeedSource::Gps));
    }

    let dt = current.t - previous.t;
    let dd = current.d - previous.d;
    (dt > 0.0 && dd > 0.0).then(|| (dd / dt, SpeedSource::Cumulative))
}

/// Smooth `values` at exactly the given indices, leaving every other index alone.
fn smooth_at(values: &mut [Option<f64>], indices: &[usize], window: usize) {
    let subset: Vec<Option<f64>> = indices.iter().map(|&i| values[i]).collect();
    for (&i, smoothed) in indices.iter().zip(moving_average(&subset, window)) {
        values[i] = smoothed;
    }
}

/// Compute pace for every record.
///
/// When pace smoothing is enabled, GPS-derived speed and the resulting pace
/// both get a moving average restricted to the GPS-derived indices.
pub fn pace_series(records: &[ActivityRecord], smoothing: &PaceSmoothingSettings) -> PaceSeries {
    let mut speed = Vec::with_capacity(records.len());
    let mut sources = Vec::with_capacity(records.len());
    for i in 0..records.len() {
        let derived = record_speed(records, i);
        speed.push(derived.map(|(s, _)| s));
        sources.push(derived.map(|(_, source)| source));
    }

    let gps_indices: Vec<usize> = sources
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == Some(SpeedSource::Gps))
        .map(|(i, _)| i)
        .collect();

    let smooth_gps = smoothing.enabled && !gps_indices.is_empty();
    if smooth_gps {
        smooth_at(&mut speed, &gps_indices, smoothing.window);
    }

    let mut pace: Vec<Option<f64>> = speed.iter().map(|s| s.and_then(speed_to_pace)).collect();
    if smooth_gps {
        smooth_at(&mut pace, &gps_indices, smoothing.window);
    }

    PaceSeries {
        pace,
        speed,
        sources,
    }
}

/// Write derived pace into every record.
pub fn derive_pace(
    records: &[ActivityRecord],
    smoothing: &PaceSmoothingSettings,
) -> Vec<ActivityRecord> {
    let series = pace_series(records, smoothing);
    records
        .iter()
        .zip(series.pace)
        .map(|(record, pace)| ActivityRecord {
            pace,
            ..record.clone()
        })
        .collect()
}

/// Grade in percent between two records.
pub fn grade(prev: &ActivityRecord, cur: &ActivityRecord) -> Option<f64> {
    let dd = cur.d - prev.d;
    let (a, b) = prev.altitude.zip(cur.altitude)?;
    (dd > 0.0).then(|| (b - a) / dd * 100.0)
}

/// Vertical speed in m/h between two records.
pub fn vertical_speed(prev: &ActivityRecord, cur: &ActivityRecord) -> Option<f64> {
    let dt = cur.t - prev.t;
    let (a, b) = prev.altitude.zip(cur.altitude)?;
    (dt > 0.0).then(|| (b - a) / (dt / 3600.0))
}

/// Recompute grade and vertical speed for every record. The first record has
/// no predecessor and gets neither.
pub fn derive_grade_and_vertical_speed(records: &[ActivityRecord]) -> Vec<ActivityRecord> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let previous = i.checked_sub(1).map(|p| &records[p]);
            ActivityRecord {
                grade: previous.and_then(|p| grade(p, record)),
                vertical_speed: previous.and_then(|p| vertical_speed(p, record)),
                ..record.clone()
            }
        })
        .collect()
}
