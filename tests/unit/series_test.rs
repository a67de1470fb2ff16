//! Unit tests for series transforms: accumulation, zones, windows and caching

use crate::common;
use ridetrace::activity::{Activity, ActivityRecord, Field, Metric};
use ridetrace::import::parse_file;
use ridetrace::series::{
    accumulate, build_series, global_extent, pivot_zones, shared_pivot_zones, window_with_extent,
    CumulativeMode, PivotZoneSettings, TransformCache, WindowRange, XAxis, ZoneStrategy,
};
use ridetrace::ProcessingSettings;

fn tcx_activity(seconds: usize) -> Activity {
    let samples = common::ride(seconds);
    let parsed = parse_file("ride.tcx", None, common::tcx(&samples).as_bytes(), &Default::default())
        .unwrap();
    let mut activity = Activity::from_parse("ride", parsed);
    activity.reprocess(&ProcessingSettings::default());
    activity
}

#[test]
fn test_positive_delta_sum_is_total_ascent() {
    let activity = tcx_activity(100);
    let ascent = accumulate(
        &activity
            .records()
            .iter()
            .map(|r| r.altitude)
            .collect::<Vec<_>>(),
        CumulativeMode::PositiveDeltaSum,
    );
    assert_eq!(ascent[0], Some(0.0));
    assert!((ascent[100].unwrap() - 20.0).abs() < 1e-6);
    assert!(ascent.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn test_series_on_distance_axis() {
    let activity = tcx_activity(10);
    let series = build_series(
        activity.records(),
        &Metric::Power.into(),
        XAxis::Distance,
        CumulativeMode::Off,
        activity.start_time,
    );
    assert_eq!(series.len(), 11);
    assert_eq!(series[2].x, 10.0);
    assert_eq!(series[2].y, 210.0);
}

#[test]
fn test_local_time_axis_uses_start_time() {
    let activity = tcx_activity(10);
    let series = build_series(
        activity.records(),
        &Metric::HeartRate.into(),
        XAxis::LocalTime,
        CumulativeMode::Off,
        activity.start_time,
    );
    let start_ms = common::start_time().timestamp_millis() as f64;
    assert_eq!(series[0].x, start_ms);
    assert_eq!(series[10].x, start_ms + 10_000.0);
}

#[test]
fn test_pivot_zones_cover_activity_time() {
    let activity = tcx_activity(300);
    let zones = pivot_zones(
        activity.records(),
        &Metric::HeartRate.into(),
        &PivotZoneSettings::default(),
    );

    assert_eq!(zones.len(), 5);
    assert_eq!(zones[0].lower, 120.0);
    assert_eq!(zones[4].upper, 139.0);
    let total: f64 = zones.iter().map(|z| z.seconds).sum();
    assert!((total - 300.0).abs() < 1e-9);
}

#[test]
fn test_quantile_zones_balance_time() {
    let activity = tcx_activity(300);
    let settings = PivotZoneSettings {
        count: 4,
        strategy: ZoneStrategy::Quantile,
    };
    let zones = pivot_zones(activity.records(), &Metric::Power.into(), &settings);

    assert_eq!(zones.len(), 4);
    assert!(zones.windows(2).all(|w| w[0].upper <= w[1].upper));
    assert!(zones.iter().all(|z| z.seconds > 0.0));
}

#[test]
fn test_shared_zones_use_round_edges() {
    let a = tcx_activity(60);
    let mut b = tcx_activity(60).with_display(0.0, 1.5);
    b.reprocess(&ProcessingSettings::default());

    let field = Field::from(Metric::Power);
    let shared = shared_pivot_zones(&[a.records(), b.records()], &field, 5);

    // 200..367.5 W over at least 5 bins snaps to 50 W buckets
    assert_eq!(shared.edges.first(), Some(&200.0));
    assert!(shared.edges.windows(2).all(|w| (w[1] - w[0] - 50.0).abs() < 1e-9));
    assert!(*shared.edges.last().unwrap() >= 367.5);
    assert_eq!(shared.activities.len(), 2);
    // the unscaled ride never reaches the upper buckets
    let last = shared.activities[0].last().unwrap();
    assert_eq!(last.seconds, 0.0);
}

#[test]
fn test_global_window_across_activities() {
    let long = tcx_activity(100);
    let short = tcx_activity(50);
    let extent = global_extent(&[&long, &short], XAxis::Time).unwrap();
    assert_eq!((extent.min, extent.max), (0.0, 100.0));

    let window = WindowRange::new(40.0, 60.0);
    let trimmed = window_with_extent(short.records(), XAxis::Time, short.start_time, &extent, &window);
    let times: Vec<f64> = trimmed.iter().map(|r| r.t).collect();
    assert_eq!(times, vec![40.0, 41.0, 42.0, 43.0, 44.0, 45.0, 46.0, 47.0, 48.0, 49.0, 50.0]);
}

#[test]
fn test_cache_is_keyed_per_activity() {
    let mut cache = TransformCache::new(16);
    let a = tcx_activity(20);
    let b = tcx_activity(20);
    let field = Field::from(Metric::HeartRate);

    let first = cache.series(&a, &field, XAxis::Time, CumulativeMode::Sum);
    let second = cache.series(&b, &field, XAxis::Time, CumulativeMode::Sum);
    assert_eq!(first, second);
    assert_eq!(cache.len(), 2);

    cache.series(&a, &field, XAxis::Time, CumulativeMode::Sum);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_vendor_field_series() {
    let records: Vec<ActivityRecord> = (0..3)
        .map(|i| {
            let mut record = ActivityRecord::new(i as f64, 0.0);
            record.extra.insert("satellites".to_string(), 7.0 + i as f64);
            record
        })
        .collect();
    let series = build_series(
        &records,
        &Field::parse("satellites"),
        XAxis::Time,
        CumulativeMode::Sum,
        None,
    );
    let ys: Vec<f64> = series.iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![7.0, 15.0, 24.0]);
}
