//! Unit tests for FIT file parsing

use crate::common::{self, base_type, FitBuilder};
use ridetrace::import::fit::parse_fit;
use ridetrace::import::{detect_format_from, parse_file, FileFormat, ImportError};

#[test]
fn test_parse_fit_records() {
    let samples = common::ride(30);
    let decoded = parse_fit(&common::fit(&samples, common::GARMIN)).unwrap();

    assert_eq!(decoded.points.len(), 31);
    let point = &decoded.points[10];
    assert_eq!(point.time, Some(samples[10].time));
    assert_eq!(point.heart_rate, Some(130.0));
    assert_eq!(point.cadence, Some(85.0));
    assert_eq!(point.power, Some(200.0));
    assert_eq!(point.distance, Some(50.0));
    assert!((point.speed.unwrap() - 5.0).abs() < 1e-9);
    assert!((point.altitude.unwrap() - 102.0).abs() < 1e-6);
}

#[test]
fn test_semicircles_become_degrees() {
    let samples = common::ride(3);
    let decoded = parse_fit(&common::fit(&samples, common::DEVELOPMENT)).unwrap();

    for (point, sample) in decoded.points.iter().zip(&samples) {
        // One semicircle is about 8.4e-8 degrees
        assert!((point.latitude.unwrap() - sample.latitude).abs() < 1e-7);
        assert!((point.longitude.unwrap() - sample.longitude).abs() < 1e-7);
    }
}

#[test]
fn test_session_and_lap_metadata() {
    let samples = common::ride(60);
    let decoded = parse_fit(&common::fit(&samples, common::GARMIN)).unwrap();

    assert_eq!(decoded.calories, Some(50.0));
    assert!(decoded.sport.as_deref().unwrap().contains("cycling"));
    assert_eq!(decoded.start_time, Some(common::start_time()));

    assert_eq!(decoded.laps.len(), 1);
    let lap = &decoded.laps[0];
    assert_eq!((lap.first_index, lap.last_index), (0, 60));
    assert_eq!(lap.total_time_s, Some(60.0));
    assert_eq!(lap.distance_m, Some(300.0));
}

#[test]
fn test_records_without_timestamps_are_rejected() {
    let mut fit = FitBuilder::new();
    fit.define(0, 20, &[(3, 1, base_type::UINT8)]);
    fit.message(0, &[140]).message(0, &[141]);

    assert!(matches!(
        parse_fit(&fit.finish()),
        Err(ImportError::MalformedInput(_))
    ));
}

#[test]
fn test_corrupted_crc_is_malformed() {
    let samples = common::ride(3);
    let mut bytes = common::fit(&samples, common::GARMIN);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    assert!(matches!(
        parse_fit(&bytes),
        Err(ImportError::MalformedInput(_))
    ));
}

#[test]
fn test_fit_detected_from_content() {
    let samples = common::ride(3);
    let bytes = common::fit(&samples, common::GARMIN);

    assert_eq!(detect_format_from("blob", None, &bytes).unwrap(), FileFormat::Fit);
    let parsed = parse_file("blob", None, &bytes, &Default::default()).unwrap();
    assert_eq!(parsed.records.len(), 4);
    assert_eq!(parsed.records[3].d, 15.0);
}
