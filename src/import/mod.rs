//! Activity import subsystem for GPS/sensor file parsing.
//!
//! This module decodes GPX, TCX and FIT files into [`RawPoint`]s, translates
//! vendor field names through a per-format [`FieldMapper`], and normalizes the
//! points into the canonical record timeline.

pub mod field_map;
pub mod fit;
pub mod gpx;
pub mod normalize;
pub mod tcx;
mod xml;

pub use field_map::{
    normalize_field_name, FieldMapper, FitFieldMapper, GarminFitFieldMapper, GpxFieldMapper,
    MappedField, Slot, TcxFieldMapper,
};
pub use normalize::normalize_points;

use crate::activity::{Activity, ActivityRecord, Color, Lap};
use crate::gps::DistanceFilterOptions;
use crate::processing::ProcessingSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during activity import
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One decoded sample before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    pub heart_rate: Option<f64>,
    pub cadence: Option<f64>,
    pub power: Option<f64>,
    pub speed: Option<f64>,
    pub temperature: Option<f64>,
    /// Device-reported cumulative distance in meters
    pub distance: Option<f64>,
    /// Fields the mapper did not route into a slot
    pub extra: BTreeMap<String, f64>,
}

impl RawPoint {
    /// Store a value in a canonical slot.
    pub fn set_slot(&mut self, slot: Slot, value: f64) {
        let target = match slot {
            Slot::HeartRate => &mut self.heart_rate,
            Slot::Power => &mut self.power,
            Slot::Cadence => &mut self.cadence,
            Slot::Speed => &mut self.speed,
            Slot::Temperature => &mut self.temperature,
            Slot::Altitude => &mut self.altitude,
            Slot::Distance => &mut self.distance,
        };
        *target = Some(value);
    }

    /// Position when both coordinates are present, finite and in range.
    pub fn valid_position(&self) -> Option<(f64, f64)> {
        let (lat, lon) = self.latitude.zip(self.longitude)?;
        let in_range = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        in_range.then_some((lat, lon))
    }
}

/// Everything a format decoder extracts from a file, before normalization.
#[derive(Debug, Clone, Default)]
pub struct DecodedActivity {
    pub points: Vec<RawPoint>,
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub calories: Option<f64>,
    pub sport: Option<String>,
    pub laps: Vec<Lap>,
}

/// Output of a parser/normalizer pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub records: Vec<ActivityRecord>,
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub calories: Option<f64>,
    pub sport: Option<String>,
    pub laps: Vec<Lap>,
}

impl ParseResult {
    /// Normalize decoded points into records.
    pub fn from_decoded(decoded: DecodedActivity, options: &DistanceFilterOptions) -> Self {
        let records = normalize_points(&decoded.points, options);
        let start_time = decoded
            .start_time
            .or_else(|| decoded.points.iter().find_map(|p| p.time));

        Self {
            records,
            name: decoded.name,
            start_time,
            calories: decoded.calories,
            sport: decoded.sport,
            laps: decoded.laps,
        }
    }
}

/// A decoder for one file encoding.
pub trait ActivityParser {
    /// The format handled by this parser.
    fn format(&self) -> FileFormat;

    /// Decode file content into raw points and metadata.
    fn decode(&self, content: &[u8]) -> Result<DecodedActivity, ImportError>;

    /// Decode and normalize file content.
    fn parse(
        &self,
        content: &[u8],
        options: &DistanceFilterOptions,
    ) -> Result<ParseResult, ImportError> {
        let decoded = self.decode(content)?;
        tracing::debug!(
            format = ?self.format(),
            points = decoded.points.len(),
            laps = decoded.laps.len(),
            "Decoded activity file"
        );
        Ok(ParseResult::from_decoded(decoded, options))
    }
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Gpx,
    Tcx,
    Fit,
}

impl FileFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "gpx" => Some(FileFormat::Gpx),
            "tcx" => Some(FileFormat::Tcx),
            "fit" => Some(FileFormat::Fit),
            _ => None,
        }
    }

    fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        match essence.as_str() {
            "application/gpx+xml" | "application/gpx" => Some(FileFormat::Gpx),
            "application/vnd.garmin.tcx+xml" | "application/tcx+xml" => Some(FileFormat::Tcx),
            "application/vnd.ant.fit" | "application/fit" | "application/x-fit" => {
                Some(FileFormat::Fit)
            }
            _ => None,
        }
    }

    fn sniff(content: &[u8]) -> Option<Self> {
        if content.len() >= 12 && &content[8..12] == b".FIT" {
            return Some(FileFormat::Fit);
        }
        let head = &content[..content.len().min(1024)];
        let head = String::from_utf8_lossy(head);
        if head.contains("<TrainingCenterDatabase") {
            Some(FileFormat::Tcx)
        } else if head.contains("<gpx") {
            Some(FileFormat::Gpx)
        } else {
            None
        }
    }
}

/// Detect file format from extension
pub fn detect_format(path: &Path) -> Result<FileFormat, ImportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ImportError::UnsupportedFormat("No file extension".to_string()))?;

    FileFormat::from_extension(ext)
        .ok_or_else(|| ImportError::UnsupportedFormat(format!("Unsupported format: {}", ext)))
}

/// Detect file format from the file name, then the declared media type, then
/// the content itself.
pub fn detect_format_from(
    name: &str,
    media_type: Option<&str>,
    content: &[u8],
) -> Result<FileFormat, ImportError> {
    if let Ok(format) = detect_format(Path::new(name)) {
        return Ok(format);
    }
    if let Some(format) = media_type.and_then(FileFormat::from_media_type) {
        return Ok(format);
    }
    FileFormat::sniff(content)
        .ok_or_else(|| ImportError::UnsupportedFormat(format!("Cannot identify format of {}", name)))
}

/// Parser for a detected format.
pub fn parser_for(format: FileFormat) -> Box<dyn ActivityParser> {
    match format {
        FileFormat::Gpx => Box::new(gpx::GpxParser),
        FileFormat::Tcx => Box::new(tcx::TcxParser),
        FileFormat::Fit => Box::new(fit::FitParser),
    }
}

/// Detect the format of one file and parse it.
pub fn parse_file(
    name: &str,
    media_type: Option<&str>,
    content: &[u8],
    options: &DistanceFilterOptions,
) -> Result<ParseResult, ImportError> {
    let format = detect_format_from(name, media_type, content)?;
    parser_for(format).parse(content, options)
}

/// A file handed to [`import_batch`], already read into memory.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub media_type: Option<String>,
    pub content: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            content,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Read a file from disk.
    pub fn read(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read(path)?;
        Ok(Self::new(path.display().to_string(), content))
    }
}

/// A file that failed to import.
#[derive(Debug)]
pub struct ImportFailure {
    pub name: String,
    pub error: ImportError,
}

/// Result of importing several files: successes and per-file failures.
#[derive(Debug, Default)]
pub struct BatchImport {
    pub activities: Vec<Activity>,
    pub failures: Vec<ImportFailure>,
}

impl BatchImport {
    /// Whether some files failed while others succeeded.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() && !self.activities.is_empty()
    }
}

/// Import several files independently; a failing file never aborts the rest.
pub fn import_batch(
    files: &[FileInput],
    options: &DistanceFilterOptions,
    settings: &ProcessingSettings,
) -> BatchImport {
    let mut batch = BatchImport::default();

    for file in files {
        match parse_file(&file.name, file.media_type.as_deref(), &file.content, options) {
            Ok(parsed) => {
                let name = parsed
                    .name
                    .clone()
                    .unwrap_or_else(|| display_name(&file.name));
                let color = Color::for_index(batch.activities.len());
                let mut activity = Activity::from_parse(name, parsed).with_color(color);
                activity.reprocess(settings);
                tracing::info!(
                    file = %file.name,
                    records = activity.records().len(),
                    "Imported activity"
                );
                batch.activities.push(activity);
            }
            Err(error) => {
                tracing::warn!(file = %file.name, %error, "Failed to import activity");
                batch.failures.push(ImportFailure {
                    name: file.name.clone(),
                    error,
                });
            }
        }
    }

    batch
}

/// File stem used as activity name when the file carries none.
fn display_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}
