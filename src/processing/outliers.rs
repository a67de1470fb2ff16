//! Percent-change outlier handling.
//!
//! Consecutive valid values are compared; a change above the threshold is
//! either dropped (leaving a gap) or clamped to the threshold.

use crate::activity::{column, with_column, ActivityRecord, Field};
use serde::{Deserialize, Serialize};

/// Threshold used when none, or a non-finite one, is configured.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 50.0;

/// Smallest accepted threshold. At zero a clamp returns the previous value unchanged.
pub const MIN_THRESHOLD_PERCENT: f64 = 1.0;

/// What to do with a value whose change exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMode {
    /// Leave values untouched
    #[default]
    Off,
    /// Remove the offending value
    Drop,
    /// Pull the offending value back to the threshold
    Clamp,
}

/// Outlier handling settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierSettings {
    pub mode: OutlierMode,
    /// Maximum allowed change between consecutive values, in percent
    pub threshold_percent: f64,
}

impl Default for OutlierSettings {
    fn default() -> Self {
        Self {
            mode: OutlierMode::Off,
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl OutlierSettings {
    /// Copy with the threshold forced into the usable range.
    pub fn sanitized(self) -> Self {
        let threshold_percent = if self.threshold_percent.is_finite() {
            self.threshold_percent.max(MIN_THRESHOLD_PERCENT)
        } else {
            DEFAULT_THRESHOLD_PERCENT
        };
        Self {
            threshold_percent,
            ..self
        }
    }
}

/// Stateful filter walking one series.
#[derive(Debug)]
pub struct OutlierFilter {
    settings: OutlierSettings,
    /// Anchor for the next comparison
    previous: Option<f64>,
}

impl OutlierFilter {
    pub fn new(settings: OutlierSettings) -> Self {
        Self {
            settings: settings.sanitized(),
            previous: None,
        }
    }

    /// Filter one value. Absent values pass through and leave the anchor as is.
    pub fn filter(&mut self, value: Option<f64>) -> Option<f64> {
        let value = value?;
        if self.settings.mode == OutlierMode::Off {
            return Some(value);
        }

        let Some(previous) = self.previous else {
            self.previous = Some(value);
            return Some(value);
        };

        let delta = value - previous;
        let denom = previous.abs().max(value.abs()).max(1.0);
        let change = delta.abs() / denom * 100.0;
        if change <= self.settings.threshold_percent {
            self.previous = Some(value);
            return Some(value);
        }

        match self.settings.mode {
            OutlierMode::Drop => {
                // the next value has nothing to compare against
                self.previous = None;
                None
            }
            OutlierMode::Clamp => {
                let clamped =
                    previous + delta.signum() * self.settings.threshold_percent / 100.0 * denom;
                self.previous = Some(clamped);
                Some(clamped)
            }
            OutlierMode::Off => Some(value),
        }
    }
}

/// Apply outlier handling to one series.
pub fn filter_outliers(values: &[Option<f64>], settings: &OutlierSettings) -> Vec<Option<f64>> {
    let mut filter = OutlierFilter::new(*settings);
    values.iter().map(|v| filter.filter(*v)).collect()
}

/// Apply outlier handling to each of `fields` independently.
pub fn remove_outliers(
    records: &[ActivityRecord],
    fields: &[Field],
    settings: &OutlierSettings,
) -> Vec<ActivityRecord> {
    if settings.mode == OutlierMode::Off {
        return records.to_vec();
    }

    fields.iter().fold(records.to_vec(), |current, field| {
        let filtered = filter_outliers(&column(&current, field), settings);
        with_column(&current, field, &filtered)
    })
}
