//! Record-level cleanup and display adjustments.

use crate::activity::{ActivityRecord, Field, Metric};

/// Whether a record has usable time, distance and (if present) position.
pub fn is_valid_record(record: &ActivityRecord) -> bool {
    if !record.t.is_finite() || !record.d.is_finite() {
        return false;
    }
    let latitude_ok = record
        .latitude
        .map_or(true, |lat| lat.is_finite() && (-90.0..=90.0).contains(&lat));
    let longitude_ok = record
        .longitude
        .map_or(true, |lon| lon.is_finite() && (-180.0..=180.0).contains(&lon));
    latitude_ok && longitude_ok
}

/// Drop records with unusable time, distance or position.
pub fn remove_invalid_records(records: &[ActivityRecord]) -> Vec<ActivityRecord> {
    let kept: Vec<ActivityRecord> = records
        .iter()
        .filter(|r| is_valid_record(r))
        .cloned()
        .collect();
    if kept.len() < records.len() {
        tracing::debug!(
            removed = records.len() - kept.len(),
            "Removed invalid records"
        );
    }
    kept
}

/// Multiply every metric and vendor field by `scale`. Time, distance and
/// position are left alone.
pub fn scale_records(records: &[ActivityRecord], scale: f64) -> Vec<ActivityRecord> {
    if scale == 1.0 {
        return records.to_vec();
    }

    records
        .iter()
        .map(|record| {
            let mut scaled = record.clone();
            for metric in Metric::ALL {
                scaled.set_metric(metric, record.metric(metric).map(|v| v * scale));
            }
            for value in scaled.extra.values_mut() {
                *value *= scale;
            }
            scaled
        })
        .collect()
}

/// Shift elapsed time by a signed offset, never below 0.
pub fn apply_time_offset(records: &[ActivityRecord], offset: f64) -> Vec<ActivityRecord> {
    records
        .iter()
        .map(|record| ActivityRecord {
            t: (record.t + offset).max(0.0),
            ..record.clone()
        })
        .collect()
}

/// Fields a metric pass walks: canonical metrics (minus the ones derived
/// after it) and every vendor field.
pub(crate) fn metric_fields(records: &[ActivityRecord], include_pace: bool) -> Vec<Field> {
    crate::activity::present_fields(records)
        .into_iter()
        .filter(|field| match field {
            Field::Metric(Metric::Pace) => include_pace,
            Field::Metric(metric) => !metric.is_derived(),
            Field::Extra(_) => true,
        })
        .collect()
}
