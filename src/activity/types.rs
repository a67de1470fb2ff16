//! Canonical record model for imported activities.
//!
//! Every parser funnels into [`ActivityRecord`]; every later stage (processing,
//! statistics, series transforms) reads and writes the same type.

use crate::import::ParseResult;
use crate::processing::{self, ProcessingSettings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// Canonical metric slots of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Heart rate in bpm
    HeartRate,
    /// Power in watts
    Power,
    /// Cadence in rpm (or steps/min for running)
    Cadence,
    /// Speed in m/s
    Speed,
    /// Temperature in °C
    Temperature,
    /// Altitude in meters
    Altitude,
    /// Pace in min/km (derived)
    Pace,
    /// Grade in percent (derived)
    Grade,
    /// Vertical speed in m/h (derived)
    VerticalSpeed,
}

impl Metric {
    /// All canonical metrics in display order.
    pub const ALL: [Metric; 9] = [
        Metric::HeartRate,
        Metric::Power,
        Metric::Cadence,
        Metric::Speed,
        Metric::Temperature,
        Metric::Altitude,
        Metric::Pace,
        Metric::Grade,
        Metric::VerticalSpeed,
    ];

    /// Metrics that come from a device or sensor rather than the pipeline.
    pub const MEASURED: [Metric; 6] = [
        Metric::HeartRate,
        Metric::Power,
        Metric::Cadence,
        Metric::Speed,
        Metric::Temperature,
        Metric::Altitude,
    ];

    /// Stable key used in configuration, caches and serialized statistics.
    pub fn key(self) -> &'static str {
        match self {
            Metric::HeartRate => "heart_rate",
            Metric::Power => "power",
            Metric::Cadence => "cadence",
            Metric::Speed => "speed",
            Metric::Temperature => "temperature",
            Metric::Altitude => "altitude",
            Metric::Pace => "pace",
            Metric::Grade => "grade",
            Metric::VerticalSpeed => "vertical_speed",
        }
    }

    /// Look up a metric by its key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Whether the pipeline computes this metric itself.
    pub fn is_derived(self) -> bool {
        matches!(self, Metric::Pace | Metric::Grade | Metric::VerticalSpeed)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A numeric field of a record: either a canonical metric or a vendor field
/// preserved under its original (or standardized) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Metric(Metric),
    Extra(String),
}

impl Field {
    /// Parse a field key, preferring canonical metric names.
    pub fn parse(key: &str) -> Self {
        match Metric::from_key(key) {
            Some(metric) => Field::Metric(metric),
            None => Field::Extra(key.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Field::Metric(metric) => metric.key(),
            Field::Extra(name) => name,
        }
    }
}

impl From<Metric> for Field {
    fn from(metric: Metric) -> Self {
        Field::Metric(metric)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One canonical sample of an activity.
///
/// An absent field means "not measured"; zero is a real measurement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Seconds since the first record
    pub t: f64,
    /// Meters since the first record
    pub d: f64,
    /// GPS latitude in degrees
    pub latitude: Option<f64>,
    /// GPS longitude in degrees
    pub longitude: Option<f64>,
    /// Heart rate in bpm
    pub heart_rate: Option<f64>,
    /// Power in watts
    pub power: Option<f64>,
    /// Cadence in rpm
    pub cadence: Option<f64>,
    /// Speed in m/s
    pub speed: Option<f64>,
    /// Temperature in °C
    pub temperature: Option<f64>,
    /// Altitude in meters
    pub altitude: Option<f64>,
    /// Pace in min/km
    pub pace: Option<f64>,
    /// Grade in percent
    pub grade: Option<f64>,
    /// Vertical speed in m/h
    pub vertical_speed: Option<f64>,
    /// Unrecognized numeric fields keyed by field name
    pub extra: BTreeMap<String, f64>,
}

impl ActivityRecord {
    /// Create a record at the given elapsed time and cumulative distance.
    pub fn new(t: f64, d: f64) -> Self {
        Self {
            t,
            d,
            ..Default::default()
        }
    }

    /// Read a canonical metric.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::HeartRate => self.heart_rate,
            Metric::Power => self.power,
            Metric::Cadence => self.cadence,
            Metric::Speed => self.speed,
            Metric::Temperature => self.temperature,
            Metric::Altitude => self.altitude,
            Metric::Pace => self.pace,
            Metric::Grade => self.grade,
            Metric::VerticalSpeed => self.vertical_speed,
        }
    }

    /// Write a canonical metric.
    pub fn set_metric(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::HeartRate => &mut self.heart_rate,
            Metric::Power => &mut self.power,
            Metric::Cadence => &mut self.cadence,
            Metric::Speed => &mut self.speed,
            Metric::Temperature => &mut self.temperature,
            Metric::Altitude => &mut self.altitude,
            Metric::Pace => &mut self.pace,
            Metric::Grade => &mut self.grade,
            Metric::VerticalSpeed => &mut self.vertical_speed,
        };
        *slot = value;
    }

    /// Read any numeric field.
    pub fn value(&self, field: &Field) -> Option<f64> {
        match field {
            Field::Metric(metric) => self.metric(*metric),
            Field::Extra(name) => self.extra.get(name).copied(),
        }
    }

    /// Write any numeric field. `None` removes an extra field.
    pub fn set_value(&mut self, field: &Field, value: Option<f64>) {
        match field {
            Field::Metric(metric) => self.set_metric(*metric, value),
            Field::Extra(name) => match value {
                Some(v) => {
                    self.extra.insert(name.clone(), v);
                }
                None => {
                    self.extra.remove(name);
                }
            },
        }
    }

    /// Latitude/longitude pair when both are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Extract one field of every record as an optional series.
pub fn column(records: &[ActivityRecord], field: &Field) -> Vec<Option<f64>> {
    records.iter().map(|r| r.value(field)).collect()
}

/// Write an optional series back into a copy of the records.
pub fn with_column(
    records: &[ActivityRecord],
    field: &Field,
    values: &[Option<f64>],
) -> Vec<ActivityRecord> {
    records
        .iter()
        .zip(values)
        .map(|(record, value)| {
            let mut record = record.clone();
            record.set_value(field, *value);
            record
        })
        .collect()
}

/// Names of all vendor fields appearing anywhere in the records.
pub fn extra_field_names(records: &[ActivityRecord]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|r| r.extra.keys().cloned())
        .collect()
}

/// Every numeric field present somewhere in the records, canonical metrics first.
pub fn present_fields(records: &[ActivityRecord]) -> Vec<Field> {
    let mut fields: Vec<Field> = Metric::ALL
        .into_iter()
        .filter(|m| records.iter().any(|r| r.metric(*m).is_some()))
        .map(Field::Metric)
        .collect();
    fields.extend(extra_field_names(records).into_iter().map(Field::Extra));
    fields
}

/// A contiguous range of records with the summary a device wrote for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Lap start timestamp
    pub start_time: Option<DateTime<Utc>>,
    /// Index of the first record in the lap
    pub first_index: usize,
    /// Index of the last record in the lap (inclusive)
    pub last_index: usize,
    /// Total lap time in seconds
    pub total_time_s: Option<f64>,
    /// Lap distance in meters
    pub distance_m: Option<f64>,
    /// Calories burned in the lap
    pub calories: Option<f64>,
    /// Average heart rate
    pub avg_heart_rate: Option<f64>,
    /// Maximum heart rate
    pub max_heart_rate: Option<f64>,
    /// Average cadence
    pub avg_cadence: Option<f64>,
    /// Average speed in m/s
    pub avg_speed: Option<f64>,
    /// Maximum speed in m/s
    pub max_speed: Option<f64>,
    /// Intensity tag (e.g. "Active", "Resting")
    pub intensity: Option<String>,
    /// How the lap was triggered (e.g. "Manual", "Distance")
    pub trigger: Option<String>,
}

impl Lap {
    /// Create a lap spanning the given record indices.
    pub fn new(first_index: usize, last_index: usize) -> Self {
        Self {
            start_time: None,
            first_index,
            last_index,
            total_time_s: None,
            distance_m: None,
            calories: None,
            avg_heart_rate: None,
            max_heart_rate: None,
            avg_cadence: None,
            avg_speed: None,
            max_speed: None,
            intensity: None,
            trigger: None,
        }
    }
}

/// RGB color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color assigned to the n-th loaded activity.
    pub fn for_index(index: usize) -> Self {
        ACTIVITY_COLORS[index % ACTIVITY_COLORS.len()]
    }

    /// Hex notation, e.g. `#1f77b4`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        ACTIVITY_COLORS[0]
    }
}

/// Distinct colors handed out to activities in load order.
pub const ACTIVITY_COLORS: [Color; 8] = [
    Color::new(31, 119, 180),
    Color::new(255, 127, 14),
    Color::new(44, 160, 44),
    Color::new(214, 39, 40),
    Color::new(148, 103, 189),
    Color::new(140, 86, 75),
    Color::new(227, 119, 194),
    Color::new(23, 190, 207),
];

/// An imported activity with its display parameters.
///
/// `raw_records` holds the normalized parser output and is never modified;
/// the processed records are rebuilt from it by [`Activity::reprocess`].
/// Every rebuild, and every clone, gets a fresh [`Activity::generation`] so
/// memoized transforms never outlive the records they were computed from.
#[derive(Debug, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Normalized records straight from the parser
    pub raw_records: Vec<ActivityRecord>,
    /// Records after the processing pipeline
    records: Vec<ActivityRecord>,
    /// Signed shift applied to elapsed time, in seconds
    pub time_offset: f64,
    /// Amplitude scale applied to metric values
    pub scale: f64,
    /// Display color
    pub color: Color,
    /// Wall-clock time of the first record
    pub start_time: Option<DateTime<Utc>>,
    /// Total calories reported by the file
    pub calories: Option<f64>,
    /// Sport tag reported by the file
    pub sport: Option<String>,
    /// Laps reported by the file
    pub laps: Vec<Lap>,
    revision: u64,
    #[serde(skip, default = "Uuid::new_v4")]
    generation: Uuid,
}

impl Activity {
    /// Build an activity from a parse result. Processed records start out as
    /// a copy of the raw records until [`Activity::reprocess`] runs.
    pub fn from_parse(name: impl Into<String>, parsed: ParseResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            records: parsed.records.clone(),
            raw_records: parsed.records,
            time_offset: 0.0,
            scale: 1.0,
            color: Color::default(),
            start_time: parsed.start_time,
            calories: parsed.calories,
            sport: parsed.sport,
            laps: parsed.laps,
            revision: 0,
            generation: Uuid::new_v4(),
        }
    }

    /// Set the display color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the time offset and amplitude scale used by the next reprocess.
    pub fn with_display(mut self, time_offset: f64, scale: f64) -> Self {
        self.time_offset = time_offset;
        self.scale = scale;
        self
    }

    /// Processed records.
    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    /// Replace the processed records, e.g. with a windowed subset.
    pub fn set_records(&mut self, records: Vec<ActivityRecord>) {
        self.records = records;
        self.revision += 1;
        self.generation = Uuid::new_v4();
    }

    /// Rebuild processed records from the raw records.
    pub fn reprocess(&mut self, settings: &ProcessingSettings) {
        let records =
            processing::process_records(&self.raw_records, settings, self.time_offset, self.scale);
        self.set_records(records);
    }

    /// Incremented every time the processed records change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Identity of the current processed records; unique across clones.
    pub fn generation(&self) -> Uuid {
        self.generation
    }
}

impl Clone for Activity {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            raw_records: self.raw_records.clone(),
            records: self.records.clone(),
            time_offset: self.time_offset,
            scale: self.scale,
            color: self.color,
            start_time: self.start_time,
            calories: self.calories,
            sport: self.sport.clone(),
            laps: self.laps.clone(),
            revision: self.revision,
            generation: Uuid::new_v4(),
        }
    }
}
