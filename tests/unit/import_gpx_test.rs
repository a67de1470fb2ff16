//! Unit tests for GPX file parsing

use crate::common;
use ridetrace::import::gpx::parse_gpx;
use ridetrace::import::{parse_file, ImportError};
use ridetrace::DistanceFilterOptions;

const ROUTE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <metadata>
    <name>Metadata Name</name>
  </metadata>
  <rte>
    <name>Route Name</name>
    <rtept lat="45.5" lon="-122.5">
      <ele>100</ele>
    </rtept>
    <rtept lat="45.5001" lon="-122.5">
      <ele>110</ele>
    </rtept>
  </rte>
</gpx>"#;

const WAYPOINTS_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <wpt lat="45.5" lon="-122.5">
    <ele>100</ele>
    <name>Point 1</name>
  </wpt>
</gpx>"#;

#[test]
fn test_parse_gpx_track_with_extensions() {
    let samples = common::ride(10);
    let decoded = parse_gpx(common::gpx(&samples).as_bytes()).unwrap();

    assert_eq!(decoded.points.len(), 11);
    assert_eq!(decoded.name.as_deref(), Some("Fixture Ride"));
    assert_eq!(decoded.sport.as_deref(), Some("cycling"));

    let first = &decoded.points[0];
    assert_eq!(first.time, Some(common::start_time()));
    assert_eq!(first.heart_rate, Some(120.0));
    assert_eq!(first.cadence, Some(85.0));
    assert_eq!(first.power, Some(200.0));
    assert_eq!(first.altitude, Some(100.0));
    assert!(first.distance.is_none());
}

#[test]
fn test_parse_route_without_times() {
    let parsed = parse_file("route.gpx", None, ROUTE_GPX.as_bytes(), &Default::default()).unwrap();

    assert_eq!(parsed.name.as_deref(), Some("Route Name"));
    assert_eq!(parsed.records.len(), 2);
    // No timestamps: elapsed time falls back to the point index
    assert_eq!(parsed.records[0].t, 0.0);
    assert_eq!(parsed.records[1].t, 1.0);
    // 0.0001° of latitude is about 11.1 m
    assert!((parsed.records[1].d - 11.12).abs() < 0.05);
}

#[test]
fn test_waypoints_only_is_malformed() {
    assert!(matches!(
        parse_gpx(WAYPOINTS_GPX.as_bytes()),
        Err(ImportError::MalformedInput(_))
    ));
}

#[test]
fn test_start_time_comes_from_first_timed_point() {
    let gpx = r#"<gpx version="1.1">
  <metadata><time>2024-06-02T12:00:00Z</time></metadata>
  <trk><trkseg>
    <trkpt lat="45.0" lon="7.0"><time>2024-06-01T06:00:00Z</time></trkpt>
    <trkpt lat="45.0001" lon="7.0"><time>2024-06-01T06:00:01Z</time></trkpt>
  </trkseg></trk>
</gpx>"#;
    let parsed = parse_file("export.gpx", None, gpx.as_bytes(), &Default::default()).unwrap();
    assert_eq!(
        parsed.start_time.map(|t| t.to_rfc3339()).as_deref(),
        Some("2024-06-01T06:00:00+00:00")
    );
}

#[test]
fn test_out_of_range_track_is_malformed() {
    let gpx = r#"<gpx version="1.1"><trk><trkseg>
    <trkpt lat="999" lon="999"><time>2024-06-01T06:00:00Z</time></trkpt>
    <trkpt lat="999" lon="999"><time>2024-06-01T06:00:01Z</time></trkpt>
  </trkseg></trk></gpx>"#;
    assert!(matches!(
        parse_file("bad.gpx", None, gpx.as_bytes(), &Default::default()),
        Err(ImportError::MalformedInput(_))
    ));
}

#[test]
fn test_invalid_xml_is_malformed() {
    let result = parse_gpx(b"<gpx><trk><trkseg><trkpt lat=\"1\" lon=\"2\"></trk>");
    assert!(matches!(result, Err(ImportError::MalformedInput(_))));
}

#[test]
fn test_gps_derived_distance_starts_at_zero() {
    let samples = common::ride(60);
    let parsed = parse_file(
        "ride.gpx",
        None,
        common::gpx(&samples).as_bytes(),
        &DistanceFilterOptions::default(),
    )
    .unwrap();

    assert_eq!(parsed.records[0].d, 0.0);
    assert!((parsed.records[60].d - 300.0).abs() < 0.5);
    assert!(parsed.records.windows(2).all(|w| w[1].d >= w[0].d));
}
