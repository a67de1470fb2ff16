//! Application configuration.
//!
//! Settings live in a TOML file; every section has defaults so partial files
//! load. The library never reads the file itself: callers load it once and
//! pass the settings down by value.

use crate::gps::DistanceFilterOptions;
use crate::processing::ProcessingSettings;
use crate::series::{CumulativeMode, PivotZoneSettings, TransformCache};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Accumulation applied to chart series
    pub cumulative: CumulativeMode,
    /// Maximum memoized transforms of each kind
    pub cache_capacity: usize,
    /// Pipeline settings
    pub processing: ProcessingSettings,
    /// GPS distance filter thresholds used while importing
    pub distance_filter: DistanceFilterOptions,
    /// Pivot zone bucketing
    pub pivot_zones: PivotZoneSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            cumulative: CumulativeMode::default(),
            cache_capacity: TransformCache::DEFAULT_CAPACITY.get(),
            processing: ProcessingSettings::default(),
            distance_filter: DistanceFilterOptions::default(),
            pivot_zones: PivotZoneSettings::default(),
        }
    }
}

/// Get the application configuration directory.
pub fn get_config_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "ridetrace", "RideTrace")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

/// Load configuration from `path`, or from the default location. A missing
/// file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(AppConfig::default());
    }

    let content =
        std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let outliers = config.processing.outliers.sanitized();
    if outliers != config.processing.outliers {
        tracing::warn!(
            configured = config.processing.outliers.threshold_percent,
            used = outliers.threshold_percent,
            "Outlier threshold out of range"
        );
        config.processing.outliers = outliers;
    }

    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Save configuration to `path`, creating parent directories as needed.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
