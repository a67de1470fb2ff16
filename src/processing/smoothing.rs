//! Moving-average and exponential smoothing of optional series.

use crate::activity::{column, with_column, ActivityRecord, Field};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default smoothing window in samples.
pub const DEFAULT_WINDOW: usize = 5;

/// Rolling average over the most recent samples.
#[derive(Debug)]
pub struct RollingAverage {
    /// Buffer of recent values
    buffer: VecDeque<f64>,
    /// Window size in samples
    window_size: usize,
    /// Running sum for efficient calculation
    sum: f64,
}

impl RollingAverage {
    /// Create a new rolling average with the given window size.
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            buffer: VecDeque::with_capacity(window_size),
            window_size,
            sum: 0.0,
        }
    }

    /// Add a new value and return the current average.
    pub fn add(&mut self, value: f64) -> Option<f64> {
        self.buffer.push_back(value);
        self.sum += value;

        if self.buffer.len() > self.window_size {
            if let Some(old) = self.buffer.pop_front() {
                self.sum -= old;
            }
        }

        self.average()
    }

    /// Get the current average without adding a value.
    pub fn average(&self) -> Option<f64> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.sum / self.buffer.len() as f64)
        }
    }
}

/// Trailing moving average over the last `window` valid samples.
///
/// Gaps stay absent in the output; the window contents are held across them.
pub fn moving_average(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return values.to_vec();
    }
    let mut avg = RollingAverage::new(window);
    values
        .iter()
        .map(|v| v.and_then(|v| avg.add(v)))
        .collect()
}

/// Exponential moving average with `alpha = 2 / (window + 1)`.
///
/// The first valid value after a gap seeds a fresh average.
pub fn exponential_moving_average(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return values.to_vec();
    }
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut ema: Option<f64> = None;

    values
        .iter()
        .map(|value| match value {
            Some(v) => {
                let next = match ema {
                    Some(prev) => alpha * v + (1.0 - alpha) * prev,
                    None => *v,
                };
                ema = Some(next);
                ema
            }
            None => {
                ema = None;
                None
            }
        })
        .collect()
}

/// Metric smoothing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    #[default]
    Off,
    MovingAverage,
    Ema,
}

/// Generic metric smoothing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    pub mode: SmoothingMode,
    /// Window in samples
    pub window: usize,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            mode: SmoothingMode::Off,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Smooth one series according to `settings`.
pub fn smooth_series(values: &[Option<f64>], settings: &SmoothingSettings) -> Vec<Option<f64>> {
    match settings.mode {
        SmoothingMode::Off => values.to_vec(),
        SmoothingMode::MovingAverage => moving_average(values, settings.window),
        SmoothingMode::Ema => exponential_moving_average(values, settings.window),
    }
}

/// Smooth each of `fields` independently.
pub fn smooth_fields(
    records: &[ActivityRecord],
    fields: &[Field],
    settings: &SmoothingSettings,
) -> Vec<ActivityRecord> {
    if settings.mode == SmoothingMode::Off {
        return records.to_vec();
    }

    fields.iter().fold(records.to_vec(), |current, field| {
        let smoothed = smooth_series(&column(&current, field), settings);
        with_column(&current, field, &smoothed)
    })
}

/// GPS coordinate smoothing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsSmoothingSettings {
    pub enabled: bool,
    /// Window in fixes
    pub window: usize,
}

impl Default for GpsSmoothingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Moving-average latitude and longitude independently. Records without a fix
/// keep their gap.
pub fn smooth_coordinates(
    records: &[ActivityRecord],
    settings: &GpsSmoothingSettings,
) -> Vec<ActivityRecord> {
    if !settings.enabled {
        return records.to_vec();
    }

    let latitudes = moving_average(
        &records.iter().map(|r| r.latitude).collect::<Vec<_>>(),
        settings.window,
    );
    let longitudes = moving_average(
        &records.iter().map(|r| r.longitude).collect::<Vec<_>>(),
        settings.window,
    );

    records
        .iter()
        .zip(latitudes.into_iter().zip(longitudes))
        .map(|(record, (latitude, longitude))| ActivityRecord {
            latitude,
            longitude,
            ..record.clone()
        })
        .collect()
}
