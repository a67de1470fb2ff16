//! Integration tests for multi-file import

use crate::common;
use ridetrace::import::{ImportError, ImportFailure};
use ridetrace::series::{shared_pivot_zones, TransformCache};
use ridetrace::{import_batch, Field, FileInput, Metric, ProcessingSettings};

#[test]
fn test_partial_failure_keeps_good_files() {
    let samples = common::ride(30);
    let files = vec![
        FileInput::new("good.gpx", common::gpx(&samples).into_bytes()),
        FileInput::new("broken.fit", b"definitely not a FIT file".to_vec()),
        FileInput::new("notes.txt", b"hello".to_vec()),
        FileInput::new("also_good.fit", common::fit(&samples, common::DEVELOPMENT)),
    ];

    let batch = import_batch(&files, &Default::default(), &ProcessingSettings::default());

    assert!(batch.is_partial());
    assert_eq!(batch.activities.len(), 2);
    assert_eq!(batch.failures.len(), 2);

    let names: Vec<&str> = batch.failures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["broken.fit", "notes.txt"]);
    assert!(matches!(
        batch.failures[0],
        ImportFailure {
            error: ImportError::MalformedInput(_),
            ..
        }
    ));
    assert!(matches!(
        batch.failures[1].error,
        ImportError::UnsupportedFormat(_)
    ));
}

#[test]
fn test_all_failures_is_not_partial() {
    let files = vec![FileInput::new("empty.gpx", Vec::new())];
    let batch = import_batch(&files, &Default::default(), &ProcessingSettings::default());

    assert!(batch.activities.is_empty());
    assert_eq!(batch.failures.len(), 1);
    assert!(!batch.is_partial());
}

#[test]
fn test_media_type_identifies_extensionless_upload() {
    let samples = common::ride(10);
    let files = vec![
        FileInput::new("upload-1", common::gpx(&samples).into_bytes())
            .with_media_type("application/gpx+xml"),
        FileInput::new("upload-2", common::tcx(&samples).into_bytes()),
    ];

    let batch = import_batch(&files, &Default::default(), &ProcessingSettings::default());
    assert!(batch.failures.is_empty());
    assert_eq!(batch.activities.len(), 2);
}

#[test]
fn test_batch_feeds_shared_zones_and_cache() {
    let samples = common::ride(120);
    let files = vec![
        FileInput::new("a.tcx", common::tcx(&samples).into_bytes()),
        FileInput::new("b.fit", common::fit(&samples, common::GARMIN)),
    ];
    let batch = import_batch(&files, &Default::default(), &ProcessingSettings::default());
    let field = Field::from(Metric::HeartRate);

    let records: Vec<&[_]> = batch
        .activities
        .iter()
        .map(|a| a.records())
        .collect();
    let shared = shared_pivot_zones(&records, &field, 5);
    assert_eq!(shared.activities.len(), 2);
    assert_eq!(shared.activities[0], shared.activities[1]);

    let mut cache = TransformCache::default();
    for activity in &batch.activities {
        let zones = cache.pivot_zones(activity, &field, &Default::default());
        let total: f64 = zones.iter().map(|z| z.seconds).sum();
        assert!((total - 120.0).abs() < 1e-9);
    }
    assert_eq!(cache.len(), 2);
}
