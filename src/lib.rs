//! RideTrace - Endurance activity file analysis
//!
//! Imports GPX, TCX and FIT recordings into one canonical record model, runs
//! them through an ordered cleaning and derivation pipeline, and computes
//! statistics, chart series, pivot zones and windows over the result.

pub mod activity;
pub mod config;
pub mod gps;
pub mod import;
pub mod metrics;
pub mod processing;
pub mod series;

// Re-export commonly used types
pub use activity::{Activity, ActivityRecord, Field, Lap, Metric};
pub use config::AppConfig;
pub use gps::DistanceFilterOptions;
pub use import::{import_batch, parse_file, BatchImport, FileInput, ImportError, ParseResult};
pub use metrics::{compute_statistics, ActivityStatistics};
pub use processing::{process_records, ProcessingSettings};
pub use series::TransformCache;
