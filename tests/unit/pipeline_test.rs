//! Unit tests for the processing pipeline applied through activities

use crate::common;
use ridetrace::activity::{Activity, ActivityRecord};
use ridetrace::import::{parse_file, ParseResult};
use ridetrace::processing::{
    pace_series, OutlierMode, OutlierSettings, PaceSmoothingSettings, ProcessingSettings,
    SmoothingMode, SmoothingSettings, SpeedSource,
};

fn heart_rates(values: &[f64]) -> Activity {
    let records = values
        .iter()
        .enumerate()
        .map(|(i, hr)| ActivityRecord {
            heart_rate: Some(*hr),
            ..ActivityRecord::new(i as f64, i as f64 * 3.0)
        })
        .collect();
    Activity::from_parse(
        "hr",
        ParseResult {
            records,
            ..Default::default()
        },
    )
}

fn outliers(mode: OutlierMode) -> ProcessingSettings {
    ProcessingSettings {
        outliers: OutlierSettings {
            mode,
            threshold_percent: 50.0,
        },
        ..Default::default()
    }
}

#[test]
fn test_reprocess_keeps_raw_records() {
    let mut activity = heart_rates(&[100.0, 400.0, 105.0]);
    let raw = activity.raw_records.clone();

    activity.reprocess(&outliers(OutlierMode::Drop));
    assert_eq!(activity.records()[1].heart_rate, None);
    assert_eq!(activity.raw_records, raw);
    assert_eq!(activity.revision(), 1);

    // Turning the filter off restores the spike from the raw records
    activity.reprocess(&ProcessingSettings::default());
    assert_eq!(activity.records()[1].heart_rate, Some(400.0));
    assert_eq!(activity.revision(), 2);
}

#[test]
fn test_drop_and_clamp_modes() {
    let mut dropped = heart_rates(&[100.0, 400.0, 105.0]);
    dropped.reprocess(&outliers(OutlierMode::Drop));
    let values: Vec<Option<f64>> = dropped.records().iter().map(|r| r.heart_rate).collect();
    assert_eq!(values, vec![Some(100.0), None, Some(105.0)]);

    let mut clamped = heart_rates(&[100.0, 400.0, 105.0]);
    clamped.reprocess(&outliers(OutlierMode::Clamp));
    let clamped_value = clamped.records()[1].heart_rate.unwrap();
    assert!(clamped_value > 100.0 && clamped_value < 400.0);
}

#[test]
fn test_display_offset_and_scale() {
    let mut activity = heart_rates(&[100.0, 110.0, 120.0]).with_display(-1.0, 0.5);
    activity.reprocess(&ProcessingSettings::default());

    let times: Vec<f64> = activity.records().iter().map(|r| r.t).collect();
    assert_eq!(times, vec![0.0, 0.0, 1.0]);
    assert_eq!(activity.records()[2].heart_rate, Some(60.0));
    // distance is never scaled
    assert_eq!(activity.records()[2].d, 6.0);
}

#[test]
fn test_smoothing_applies_to_processed_records() {
    let mut activity = heart_rates(&[100.0, 120.0, 140.0, 160.0]);
    activity.reprocess(&ProcessingSettings {
        smoothing: SmoothingSettings {
            mode: SmoothingMode::MovingAverage,
            window: 2,
        },
        ..Default::default()
    });

    assert_eq!(activity.records()[0].heart_rate, Some(100.0));
    assert_eq!(activity.records()[1].heart_rate, Some(110.0));
    assert_eq!(activity.records()[3].heart_rate, Some(150.0));
}

#[test]
fn test_gpx_pace_comes_from_gps() {
    let samples = common::ride(20);
    let parsed = parse_file("ride.gpx", None, common::gpx(&samples).as_bytes(), &Default::default())
        .unwrap();

    let series = pace_series(&parsed.records, &PaceSmoothingSettings::default());
    assert_eq!(series.sources[0], None);
    assert!(series.sources[1..].iter().all(|s| *s == Some(SpeedSource::Gps)));
    assert!(series.is_gps_dominated());

    // 5 m/s is 3:20 min/km
    for pace in series.pace.iter().skip(1) {
        assert!((pace.unwrap() - 10.0 / 3.0).abs() < 0.01);
    }
}

#[test]
fn test_tcx_pace_uses_embedded_speed() {
    let samples = common::ride(20);
    let parsed = parse_file("ride.tcx", None, common::tcx(&samples).as_bytes(), &Default::default())
        .unwrap();

    let series = pace_series(&parsed.records, &PaceSmoothingSettings::default());
    assert!(series.sources.iter().all(|s| *s == Some(SpeedSource::Embedded)));
    assert!(!series.is_gps_dominated());
    assert_eq!(series.gps_count(), 0);
}
