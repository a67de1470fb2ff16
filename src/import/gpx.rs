//! GPX file parser.
//!
//! Walks the document as an event stream so that arbitrary extension elements
//! (`gpxtpx:hr`, `power`, `ns3:atemp`, ...) reach the field mapper instead of
//! being discarded.

use super::xml::{attribute, decode_text, local_name, parse_number, parse_time, reader};
use super::{
    ActivityParser, DecodedActivity, FieldMapper, FileFormat, GpxFieldMapper, ImportError, RawPoint,
};
use quick_xml::events::{BytesStart, Event};

/// Parser for GPX 1.0/1.1 files.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpxParser;

impl ActivityParser for GpxParser {
    fn format(&self) -> FileFormat {
        FileFormat::Gpx
    }

    fn decode(&self, content: &[u8]) -> Result<DecodedActivity, ImportError> {
        parse_gpx(content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointKind {
    Track,
    Route,
}

/// Point seeded from the `lat`/`lon` attributes. A pair with either half
/// missing or unparseable leaves the point without a position.
fn point_from_element(element: &BytesStart<'_>) -> RawPoint {
    let latitude = attribute(element, b"lat").as_deref().and_then(parse_number);
    let longitude = attribute(element, b"lon").as_deref().and_then(parse_number);
    let (latitude, longitude) = match latitude.zip(longitude) {
        Some((lat, lon)) => (Some(lat), Some(lon)),
        None => (None, None),
    };
    RawPoint {
        latitude,
        longitude,
        ..Default::default()
    }
}

fn point_kind(name: &str) -> Option<PointKind> {
    match name {
        "trkpt" => Some(PointKind::Track),
        "rtept" => Some(PointKind::Route),
        _ => None,
    }
}

/// Decode GPX content into raw points. Track points are preferred; route
/// points are used only when the file has no track.
pub fn parse_gpx(content: &[u8]) -> Result<DecodedActivity, ImportError> {
    let text = decode_text(content, "GPX")?;
    let mut reader = reader(text);
    let mapper = GpxFieldMapper;

    let mut decoded = DecodedActivity::default();
    let mut track_points = Vec::new();
    let mut route_points = Vec::new();
    let mut metadata_name: Option<String> = None;
    let mut metadata_time = None;
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<(PointKind, RawPoint)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(e.local_name().as_ref());
                if let Some(kind) = point_kind(&name) {
                    current = Some((kind, point_from_element(&e)));
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(e.local_name().as_ref());
                match point_kind(&name) {
                    Some(PointKind::Track) => track_points.push(point_from_element(&e)),
                    Some(PointKind::Route) => route_points.push(point_from_element(&e)),
                    None => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.local_name().as_ref());
                path.pop();
                if point_kind(&name).is_some() {
                    match current.take() {
                        Some((PointKind::Track, point)) => track_points.push(point),
                        Some((PointKind::Route, point)) => route_points.push(point),
                        None => {}
                    }
                }
            }
            Ok(Event::Text(t)) => {
                let value = t
                    .unescape()
                    .map_err(|e| ImportError::MalformedInput(format!("GPX parse error: {}", e)))?;
                let Some(leaf) = path.last() else { continue };
                let parent = path.len().checked_sub(2).map(|i| path[i].as_str());

                if let Some((_, point)) = current.as_mut() {
                    if leaf == "time" {
                        point.time = parse_time(&value);
                    } else if let Some(number) = parse_number(&value) {
                        mapper.apply(leaf, number, point);
                    }
                    continue;
                }

                match (parent, leaf.as_str()) {
                    (Some("metadata"), "time") => metadata_time = parse_time(&value),
                    (Some("metadata"), "name") => metadata_name = Some(value.into_owned()),
                    (Some("trk"), "name") | (Some("rte"), "name") if decoded.name.is_none() => {
                        decoded.name = Some(value.into_owned())
                    }
                    (Some("trk"), "type") if decoded.sport.is_none() => {
                        decoded.sport = Some(value.into_owned())
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ImportError::MalformedInput(format!(
                    "GPX parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    decoded.points = if track_points.is_empty() {
        route_points
    } else {
        track_points
    };
    decoded.name = decoded.name.or(metadata_name);
    // metadata time is often the export time, not the start of the ride
    decoded.start_time = decoded
        .points
        .iter()
        .find_map(|p| p.time)
        .or(metadata_time);

    if !decoded.points.iter().any(|p| p.valid_position().is_some()) {
        return Err(ImportError::MalformedInput(
            "No valid track points found in GPX file".to_string(),
        ));
    }

    Ok(decoded)
}
