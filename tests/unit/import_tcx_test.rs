//! Unit tests for TCX file parsing

use crate::common;
use ridetrace::import::tcx::parse_tcx;
use ridetrace::import::{parse_file, ImportError};

const TWO_LAP_TCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
  <Activities>
    <Activity Sport="Running">
      <Id>2024-03-10T09:00:00Z</Id>
      <Lap StartTime="2024-03-10T09:00:00Z">
        <TotalTimeSeconds>2</TotalTimeSeconds>
        <DistanceMeters>6</DistanceMeters>
        <Calories>10</Calories>
        <AverageHeartRateBpm><Value>141</Value></AverageHeartRateBpm>
        <Track>
          <Trackpoint><Time>2024-03-10T09:00:00Z</Time><DistanceMeters>100</DistanceMeters><HeartRateBpm><Value>140</Value></HeartRateBpm></Trackpoint>
          <Trackpoint><Time>2024-03-10T09:00:01Z</Time><DistanceMeters>103</DistanceMeters><HeartRateBpm><Value>141</Value></HeartRateBpm></Trackpoint>
          <Trackpoint><Time>2024-03-10T09:00:02Z</Time><DistanceMeters>106</DistanceMeters><HeartRateBpm><Value>142</Value></HeartRateBpm></Trackpoint>
        </Track>
      </Lap>
      <Lap StartTime="2024-03-10T09:00:03Z">
        <Calories>5</Calories>
        <Track>
          <Trackpoint><Time>2024-03-10T09:00:03Z</Time><HeartRateBpm><Value>143</Value></HeartRateBpm></Trackpoint>
          <Trackpoint><Time>2024-03-10T09:00:04Z</Time><DistanceMeters>112</DistanceMeters></Trackpoint>
        </Track>
      </Lap>
    </Activity>
  </Activities>
</TrainingCenterDatabase>"#;

#[test]
fn test_parse_tcx_metadata_and_laps() {
    let decoded = parse_tcx(TWO_LAP_TCX.as_bytes()).unwrap();

    assert_eq!(decoded.sport.as_deref(), Some("Running"));
    assert_eq!(decoded.points.len(), 5);
    assert_eq!(decoded.calories, Some(15.0));

    assert_eq!(decoded.laps.len(), 2);
    let first = &decoded.laps[0];
    assert_eq!((first.first_index, first.last_index), (0, 2));
    assert_eq!(first.total_time_s, Some(2.0));
    assert_eq!(first.distance_m, Some(6.0));
    assert_eq!(first.avg_heart_rate, Some(141.0));
    let second = &decoded.laps[1];
    assert_eq!((second.first_index, second.last_index), (3, 4));
}

#[test]
fn test_device_distance_is_rebased_and_carried() {
    let parsed = parse_file("run.tcx", None, TWO_LAP_TCX.as_bytes(), &Default::default()).unwrap();
    let distances: Vec<f64> = parsed.records.iter().map(|r| r.d).collect();

    // First reported distance becomes zero; the gap at index 3 carries 6 m
    assert_eq!(distances, vec![0.0, 3.0, 6.0, 6.0, 12.0]);
    assert_eq!(parsed.records[3].heart_rate, Some(143.0));
    assert_eq!(parsed.records[4].heart_rate, None);
}

#[test]
fn test_parse_tcx_extension_fields() {
    let samples = common::ride(5);
    let decoded = parse_tcx(common::tcx(&samples).as_bytes()).unwrap();

    assert_eq!(decoded.name.as_deref(), Some("Fixture Ride"));
    assert_eq!(decoded.start_time, Some(common::start_time()));
    let point = &decoded.points[3];
    assert_eq!(point.speed, Some(5.0));
    assert_eq!(point.power, Some(215.0));
    assert_eq!(point.heart_rate, Some(123.0));
    assert_eq!(point.cadence, Some(88.0));
    assert_eq!(point.distance, Some(15.0));
}

#[test]
fn test_tcx_without_trackpoints_is_malformed() {
    let tcx = r#"<TrainingCenterDatabase><Activities><Activity Sport="Biking">
        <Id>2024-03-10T09:00:00Z</Id></Activity></Activities></TrainingCenterDatabase>"#;
    assert!(matches!(
        parse_tcx(tcx.as_bytes()),
        Err(ImportError::MalformedInput(_))
    ));
}

#[test]
fn test_media_type_selects_tcx() {
    let parsed = parse_file(
        "upload",
        Some("application/vnd.garmin.tcx+xml"),
        TWO_LAP_TCX.as_bytes(),
        &Default::default(),
    )
    .unwrap();
    assert_eq!(parsed.records.len(), 5);
}
