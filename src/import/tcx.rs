//! TCX file parser.
//!
//! Reads trackpoints (position, altitude, distance, heart rate, cadence and the
//! `TPX` extension with speed/power), per-lap summaries and activity metadata.

use super::xml::{attribute, decode_text, local_name, parse_number, parse_time, reader};
use super::{
    ActivityParser, DecodedActivity, FieldMapper, FileFormat, ImportError, RawPoint,
    TcxFieldMapper,
};
use crate::activity::Lap;
use quick_xml::events::Event;

/// Parser for Garmin Training Center XML files.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcxParser;

impl ActivityParser for TcxParser {
    fn format(&self) -> FileFormat {
        FileFormat::Tcx
    }

    fn decode(&self, content: &[u8]) -> Result<DecodedActivity, ImportError> {
        parse_tcx(content)
    }
}

/// Lap being read; indices refer to the decoded point list.
struct OpenLap {
    lap: Lap,
}

impl OpenLap {
    fn new(first_index: usize, start: Option<String>) -> Self {
        let mut lap = Lap::new(first_index, first_index);
        lap.start_time = start.as_deref().and_then(parse_time);
        Self { lap }
    }

    /// Apply a summary value found directly under `<Lap>` (or its extensions).
    fn apply(&mut self, parent: Option<&str>, leaf: &str, value: &str) {
        let lap = &mut self.lap;
        match (parent, leaf) {
            (Some("AverageHeartRateBpm"), "Value") => lap.avg_heart_rate = parse_number(value),
            (Some("MaximumHeartRateBpm"), "Value") => lap.max_heart_rate = parse_number(value),
            (_, "TotalTimeSeconds") => lap.total_time_s = parse_number(value),
            (_, "DistanceMeters") => lap.distance_m = parse_number(value),
            (_, "Calories") => lap.calories = parse_number(value),
            (_, "MaximumSpeed") => lap.max_speed = parse_number(value),
            (_, "AvgSpeed") => lap.avg_speed = parse_number(value),
            (_, "Cadence") | (_, "AvgRunCadence") => {
                if lap.avg_cadence.is_none() {
                    lap.avg_cadence = parse_number(value);
                }
            }
            (_, "Intensity") => lap.intensity = Some(value.to_string()),
            (_, "TriggerMethod") => lap.trigger = Some(value.to_string()),
            _ => {}
        }
    }

    /// Close the lap; laps without trackpoints carry no record range.
    fn finish(mut self, point_count: usize) -> (Option<Lap>, Option<f64>) {
        let calories = self.lap.calories;
        if point_count <= self.lap.first_index {
            return (None, calories);
        }
        self.lap.last_index = point_count - 1;
        (Some(self.lap), calories)
    }
}

/// Decode TCX content into raw points, laps and activity metadata.
pub fn parse_tcx(content: &[u8]) -> Result<DecodedActivity, ImportError> {
    let text = decode_text(content, "TCX")?;
    let mut reader = reader(text);
    let mapper = TcxFieldMapper;

    let mut decoded = DecodedActivity::default();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<RawPoint> = None;
    let mut open_lap: Option<OpenLap> = None;
    let mut total_calories: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(e.local_name().as_ref());
                match name.as_str() {
                    "Activity" if decoded.sport.is_none() => {
                        decoded.sport = attribute(&e, b"Sport");
                    }
                    "Lap" => {
                        open_lap = Some(OpenLap::new(
                            decoded.points.len(),
                            attribute(&e, b"StartTime"),
                        ));
                    }
                    "Trackpoint" => current = Some(RawPoint::default()),
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.local_name().as_ref());
                path.pop();
                match name.as_str() {
                    "Trackpoint" => {
                        if let Some(point) = current.take() {
                            decoded.points.push(point);
                        }
                    }
                    "Lap" => {
                        if let Some(lap) = open_lap.take() {
                            let (lap, calories) = lap.finish(decoded.points.len());
                            if let Some(calories) = calories {
                                *total_calories.get_or_insert(0.0) += calories;
                            }
                            decoded.laps.extend(lap);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                let value = t
                    .unescape()
                    .map_err(|e| ImportError::MalformedInput(format!("TCX parse error: {}", e)))?;
                let Some(leaf) = path.last() else { continue };
                let parent = path.len().checked_sub(2).map(|i| path[i].as_str());

                if let Some(point) = current.as_mut() {
                    match (parent, leaf.as_str()) {
                        (_, "Time") => point.time = parse_time(&value),
                        (_, "LatitudeDegrees") => point.latitude = parse_number(&value),
                        (_, "LongitudeDegrees") => point.longitude = parse_number(&value),
                        (Some(parent), "Value") => {
                            if let Some(number) = parse_number(&value) {
                                mapper.apply(parent, number, point);
                            }
                        }
                        (_, leaf) => {
                            if let Some(number) = parse_number(&value) {
                                mapper.apply(leaf, number, point);
                            }
                        }
                    }
                    continue;
                }

                if let Some(lap) = open_lap.as_mut() {
                    lap.apply(parent, leaf, &value);
                    continue;
                }

                match (parent, leaf.as_str()) {
                    (Some("Activity"), "Id") if decoded.start_time.is_none() => {
                        decoded.start_time = parse_time(&value)
                    }
                    (Some("Activity"), "Notes") | (Some("Course"), "Name") => {
                        if decoded.name.is_none() {
                            decoded.name = Some(value.into_owned());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ImportError::MalformedInput(format!(
                    "TCX parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    let usable = |p: &RawPoint| p.time.is_some() || p.valid_position().is_some();
    if !decoded.points.iter().any(usable) {
        return Err(ImportError::MalformedInput(
            "No valid track points found in TCX file".to_string(),
        ));
    }
    decoded.calories = total_calories;

    Ok(decoded)
}
