//! Statistics engine: activity summaries, best splits and power metrics.

pub mod power;
pub mod splits;
pub mod statistics;

pub use power::{
    best_average_power, compute_power_metrics, normalized_power, BestPower,
    NormalizedPowerCalculator, PowerMetrics,
};
pub use splits::{best_split_time, best_splits, BestSplit, SPLIT_DISTANCES};
pub use statistics::{
    compute_statistics, compute_statistics_with, elevation_change, moving_time, pace_statistics,
    percentile, ActivityStatistics, FieldStats, PaceStats,
};
