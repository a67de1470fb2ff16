//! Record processing pipeline.
//!
//! Every stage is a free function taking records and settings and returning a
//! new record array. [`process_records`] composes them in a fixed order; later
//! stages rely on the cleanup done by earlier ones:
//!
//! 1. outlier handling on measured and vendor fields
//! 2. invalid-record removal
//! 3. GPS coordinate smoothing
//! 4. pace derivation
//! 5. outlier handling on pace
//! 6. metric smoothing (pace included)
//! 7. amplitude scaling
//! 8. grade and vertical speed
//! 9. time offset

pub mod cleanup;
pub mod derived;
pub mod outliers;
pub mod smoothing;

pub use cleanup::{apply_time_offset, remove_invalid_records, scale_records};
pub use derived::{
    derive_grade_and_vertical_speed, derive_pace, pace_series, speed_to_pace,
    PaceSeries, PaceSmoothingSettings, SpeedSource,
};
pub use outliers::{filter_outliers, remove_outliers, OutlierMode, OutlierSettings};
pub use smoothing::{
    exponential_moving_average, moving_average, smooth_coordinates, smooth_fields,
    smooth_series, GpsSmoothingSettings, SmoothingMode, SmoothingSettings,
};

use crate::activity::{ActivityRecord, Field, Metric};
use serde::{Deserialize, Serialize};

/// Settings for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub outliers: OutlierSettings,
    pub gps_smoothing: GpsSmoothingSettings,
    pub pace_smoothing: PaceSmoothingSettings,
    pub smoothing: SmoothingSettings,
}

/// Run the full pipeline over normalized records.
pub fn process_records(
    records: &[ActivityRecord],
    settings: &ProcessingSettings,
    time_offset: f64,
    scale: f64,
) -> Vec<ActivityRecord> {
    let measured = cleanup::metric_fields(records, false);
    let records = remove_outliers(records, &measured, &settings.outliers);
    let records = remove_invalid_records(&records);
    let records = smooth_coordinates(&records, &settings.gps_smoothing);
    let records = derive_pace(&records, &settings.pace_smoothing);
    let records = remove_outliers(&records, &[Field::Metric(Metric::Pace)], &settings.outliers);

    let smoothed = cleanup::metric_fields(&records, true);
    let records = smooth_fields(&records, &smoothed, &settings.smoothing);
    let records = scale_records(&records, scale);
    let records = derive_grade_and_vertical_speed(&records);
    let records = apply_time_offset(&records, time_offset);

    tracing::debug!(
        records = records.len(),
        fields = smoothed.len(),
        "Processed activity records"
    );
    records
}
