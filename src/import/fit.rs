//! FIT file parser.
//!
//! Decodes `record` messages into raw points and reads `session`, `lap` and
//! `file_id` messages for calories, sport, laps and the device manufacturer.

use super::{
    ActivityParser, DecodedActivity, FieldMapper, FileFormat, FitFieldMapper,
    GarminFitFieldMapper, ImportError, RawPoint,
};
use crate::activity::Lap;
use chrono::{DateTime, Duration, Utc};
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};

/// Degrees per semicircle (2^31 semicircles = 180°).
const SEMICIRCLE_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// Parser for ANT/Garmin FIT activity files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FitParser;

impl ActivityParser for FitParser {
    fn format(&self) -> FileFormat {
        FileFormat::Fit
    }

    fn decode(&self, content: &[u8]) -> Result<DecodedActivity, ImportError> {
        parse_fit(content)
    }
}

/// Convert a FIT field value to a number when it is numeric.
pub fn fit_value_to_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Float32(v) => *v as f64,
        Value::Float64(v) => *v,
        Value::SInt8(v) => *v as f64,
        Value::UInt8(v) => *v as f64,
        Value::UInt8z(v) => *v as f64,
        Value::Byte(v) => *v as f64,
        Value::SInt16(v) => *v as f64,
        Value::UInt16(v) => *v as f64,
        Value::UInt16z(v) => *v as f64,
        Value::SInt32(v) => *v as f64,
        Value::UInt32(v) => *v as f64,
        Value::UInt32z(v) => *v as f64,
        Value::SInt64(v) => *v as f64,
        Value::UInt64(v) => *v as f64,
        Value::UInt64z(v) => *v as f64,
        Value::Array(values) => return values.iter().find_map(fit_value_to_f64),
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn fit_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(ts.with_timezone(&Utc)),
        _ => None,
    }
}

/// Normalize a candidate position to degrees.
///
/// Values already inside the latitude/longitude ranges are taken as degrees,
/// anything else as semicircles. (0, 0) means "no fix".
pub fn normalize_position(lat: f64, lon: f64) -> Option<(f64, f64)> {
    if lat == 0.0 && lon == 0.0 {
        return None;
    }

    let (lat, lon) = if lat.abs() <= 90.0 && lon.abs() <= 180.0 {
        (lat, lon)
    } else {
        (lat * SEMICIRCLE_TO_DEGREES, lon * SEMICIRCLE_TO_DEGREES)
    };

    let valid = lat.abs() <= 90.0 && lon.abs() <= 180.0 && !(lat == 0.0 && lon == 0.0);
    valid.then_some((lat, lon))
}

fn record_point(message: &FitDataRecord, mapper: &dyn FieldMapper) -> RawPoint {
    let mut point = RawPoint::default();
    let mut lat = None;
    let mut lon = None;

    for field in message.fields() {
        match field.name() {
            "timestamp" => point.time = fit_timestamp(field.value()),
            "position_lat" => lat = fit_value_to_f64(field.value()),
            "position_long" => lon = fit_value_to_f64(field.value()),
            name => {
                if let Some(value) = fit_value_to_f64(field.value()) {
                    mapper.apply(name, value, &mut point);
                }
            }
        }
    }

    if let Some((lat, lon)) = lat.zip(lon).and_then(|(lat, lon)| normalize_position(lat, lon)) {
        point.latitude = Some(lat);
        point.longitude = Some(lon);
    }
    point
}

/// Lap summary as read from a `lap` message, before record indices are known.
struct LapMessage {
    lap: Lap,
    end_time: Option<DateTime<Utc>>,
}

fn lap_message(message: &FitDataRecord) -> LapMessage {
    let mut lap = Lap::new(0, 0);
    let mut end_time = None;
    let mut elapsed = None;

    for field in message.fields() {
        let value = field.value();
        match field.name() {
            "start_time" => lap.start_time = fit_timestamp(value),
            "timestamp" => end_time = fit_timestamp(value),
            "total_elapsed_time" => elapsed = fit_value_to_f64(value),
            "total_timer_time" => lap.total_time_s = fit_value_to_f64(value),
            "total_distance" => lap.distance_m = fit_value_to_f64(value),
            "total_calories" => lap.calories = fit_value_to_f64(value),
            "avg_heart_rate" => lap.avg_heart_rate = fit_value_to_f64(value),
            "max_heart_rate" => lap.max_heart_rate = fit_value_to_f64(value),
            "avg_cadence" | "avg_running_cadence" => {
                lap.avg_cadence = lap.avg_cadence.or(fit_value_to_f64(value))
            }
            "avg_speed" | "enhanced_avg_speed" => lap.avg_speed = fit_value_to_f64(value),
            "max_speed" | "enhanced_max_speed" => lap.max_speed = fit_value_to_f64(value),
            "intensity" => lap.intensity = Some(value.to_string()),
            "lap_trigger" => lap.trigger = Some(value.to_string()),
            _ => {}
        }
    }

    lap.total_time_s = lap.total_time_s.or(elapsed);
    let end_time = end_time.or_else(|| {
        let start = lap.start_time?;
        let secs = elapsed?;
        Some(start + Duration::milliseconds((secs * 1000.0) as i64))
    });

    LapMessage { lap, end_time }
}

/// Resolve a lap's record range from its start/end timestamps.
fn resolve_lap(message: LapMessage, points: &[RawPoint]) -> Option<Lap> {
    let LapMessage { mut lap, end_time } = message;
    let start = lap.start_time?;

    let first = points
        .iter()
        .position(|p| p.time.is_some_and(|t| t >= start))?;
    let last = points.iter().rposition(|p| {
        p.time
            .is_some_and(|t| end_time.map_or(true, |end| t <= end))
    })?;
    if last < first {
        return None;
    }

    lap.first_index = first;
    lap.last_index = last;
    Some(lap)
}

fn is_garmin(messages: &[FitDataRecord]) -> bool {
    messages
        .iter()
        .filter(|m| m.kind() == MesgNum::FileId)
        .flat_map(|m| m.fields())
        .any(|f| f.name() == "manufacturer" && f.value().to_string().eq_ignore_ascii_case("garmin"))
}

/// Decode FIT content into raw points, laps and session metadata.
pub fn parse_fit(content: &[u8]) -> Result<DecodedActivity, ImportError> {
    let messages = fitparser::from_bytes(content)
        .map_err(|e| ImportError::MalformedInput(format!("FIT parse error: {}", e)))?;

    let mapper: Box<dyn FieldMapper> = if is_garmin(&messages) {
        Box::new(GarminFitFieldMapper::default())
    } else {
        Box::new(FitFieldMapper)
    };

    let mut decoded = DecodedActivity::default();
    let mut lap_messages = Vec::new();

    for message in &messages {
        match message.kind() {
            MesgNum::Record => decoded.points.push(record_point(message, mapper.as_ref())),
            MesgNum::Lap => lap_messages.push(lap_message(message)),
            MesgNum::Session => {
                for field in message.fields() {
                    match field.name() {
                        "total_calories" => {
                            decoded.calories = decoded.calories.or(fit_value_to_f64(field.value()))
                        }
                        "sport" if decoded.sport.is_none() => {
                            decoded.sport = Some(field.value().to_string())
                        }
                        "start_time" if decoded.start_time.is_none() => {
                            decoded.start_time = fit_timestamp(field.value())
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    if !decoded.points.iter().any(|p| p.time.is_some()) {
        return Err(ImportError::MalformedInput(
            "No timestamped records found in FIT file".to_string(),
        ));
    }

    let lap_count = lap_messages.len();
    decoded.laps = lap_messages
        .into_iter()
        .filter_map(|lap| resolve_lap(lap, &decoded.points))
        .collect();
    if decoded.laps.len() < lap_count {
        tracing::warn!(
            skipped = lap_count - decoded.laps.len(),
            "Skipped FIT laps without matching records"
        );
    }

    Ok(decoded)
}
