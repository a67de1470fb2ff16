//! Integration tests: the same ride recorded as GPX, TCX and FIT
//!
//! Every format goes through import, the default pipeline and the statistics
//! engine; the summaries must agree.

use crate::common;
use ridetrace::activity::Metric;
use ridetrace::{import_batch, ActivityStatistics, FileInput, ProcessingSettings};

fn import_all(seconds: usize) -> Vec<(String, ActivityStatistics, ridetrace::Activity)> {
    let samples = common::ride(seconds);
    let files = vec![
        FileInput::new("ride.gpx", common::gpx(&samples).into_bytes()),
        FileInput::new("ride.tcx", common::tcx(&samples).into_bytes()),
        FileInput::new("ride.fit", common::fit(&samples, common::GARMIN)),
    ];

    let batch = import_batch(&files, &Default::default(), &ProcessingSettings::default());
    assert!(batch.failures.is_empty(), "{:?}", batch.failures);
    assert_eq!(batch.activities.len(), 3);

    files
        .iter()
        .zip(batch.activities)
        .map(|(file, activity)| {
            let stats = ridetrace::compute_statistics(activity.records());
            (file.name.clone(), stats, activity)
        })
        .collect()
}

#[test]
fn test_duration_and_distance_agree() {
    for (name, stats, _) in import_all(300) {
        assert!((stats.duration_s - 300.0).abs() <= 1.0, "{name}: {}", stats.duration_s);
        assert!((stats.distance_m - 1500.0).abs() <= 10.0, "{name}: {}", stats.distance_m);
        assert!((stats.moving_time_s - 300.0).abs() <= 1.0, "{name}");
    }
}

#[test]
fn test_metric_averages_agree() {
    let all = import_all(300);
    let (_, reference, _) = &all[0];

    for (name, stats, _) in &all[1..] {
        for metric in [Metric::HeartRate, Metric::Cadence, Metric::Power, Metric::Altitude] {
            let expected = reference.metric(metric).unwrap().avg;
            let actual = stats.metric(metric).unwrap().avg;
            assert!((expected - actual).abs() < 1.0, "{name} {metric}: {actual} vs {expected}");
        }

        let gain = stats.elevation_gain_m.unwrap();
        assert!((gain - 60.0).abs() < 0.5, "{name}: {gain}");
    }
}

#[test]
fn test_average_pace_agrees() {
    for (name, stats, _) in import_all(300) {
        let avg = stats.pace.unwrap().avg.unwrap();
        assert!((avg - 10.0 / 3.0).abs() < 0.05, "{name}: {avg}");
    }
}

#[test]
fn test_metadata_survives_import() {
    let all = import_all(60);

    for (name, _, activity) in &all {
        assert_eq!(activity.start_time, Some(common::start_time()), "{name}");
        assert_eq!(activity.records().len(), 61, "{name}");
    }

    let (_, _, gpx) = &all[0];
    assert_eq!(gpx.name, "Fixture Ride");
    assert!(gpx.laps.is_empty());

    let (_, _, tcx) = &all[1];
    assert_eq!(tcx.sport.as_deref(), Some("Biking"));
    assert_eq!(tcx.calories, Some(50.0));
    assert_eq!(tcx.laps.len(), 1);

    let (_, _, fit) = &all[2];
    assert_eq!(fit.name, "ride");
    assert_eq!(fit.calories, Some(50.0));
    assert_eq!(fit.laps.len(), 1);
    assert_eq!(fit.laps[0].last_index, 60);
}

#[test]
fn test_activities_get_distinct_colors() {
    let all = import_all(10);
    assert_ne!(all[0].2.color, all[1].2.color);
    assert_ne!(all[1].2.color, all[2].2.color);
}
