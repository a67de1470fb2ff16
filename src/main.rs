//! RideTrace - command line entry point.
//!
//! Imports one or more activity files, processes them with the configured
//! settings and prints their statistics, zones and chart series.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ridetrace::activity::{Activity, Field};
use ridetrace::config::{load_config, AppConfig};
use ridetrace::import::{import_batch, FileInput, ImportFailure};
use ridetrace::metrics::{compute_statistics_with, ActivityStatistics};
use ridetrace::series::{
    shared_pivot_zones, window_records, SeriesPoint, SharedZones, TransformCache, WindowRange,
    XAxis, ZoneBucket,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "ridetrace",
    version,
    about = "Analyze GPX, TCX and FIT activity recordings"
)]
struct Args {
    /// Activity files to import
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Print pivot zones for this field (e.g. heart_rate, power)
    #[arg(long)]
    zones: Option<String>,

    /// Print the chart series of this field, accumulated as configured
    #[arg(long)]
    series: Option<String>,

    /// Axis used by the window
    #[arg(long, value_enum, default_value_t = AxisArg::Time)]
    axis: AxisArg,

    /// Window start in percent of the axis
    #[arg(long, default_value_t = 0.0)]
    window_start: f64,

    /// Window end in percent of the axis
    #[arg(long, default_value_t = 100.0)]
    window_end: f64,

    /// Time offset applied to every activity, in seconds
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset: f64,

    /// Amplitude scale applied to every activity
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AxisArg {
    Time,
    Distance,
    LocalTime,
}

impl From<AxisArg> for XAxis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::Time => XAxis::Time,
            AxisArg::Distance => XAxis::Distance,
            AxisArg::LocalTime => XAxis::LocalTime,
        }
    }
}

#[derive(Serialize)]
struct ActivityReport {
    name: String,
    sport: Option<String>,
    start_time: Option<chrono::DateTime<chrono::Utc>>,
    calories: Option<f64>,
    laps: usize,
    records: usize,
    statistics: ActivityStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    zones: Option<Vec<ZoneBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<Vec<SeriesPoint>>,
}

#[derive(Serialize)]
struct FailureReport {
    file: String,
    error: String,
}

#[derive(Serialize)]
struct Report {
    activities: Vec<ActivityReport>,
    failures: Vec<FailureReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shared_zones: Option<SharedZones>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    validate_args(&args)?;
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(?config, "Using configuration");

    let mut inputs = Vec::new();
    let mut read_failures = Vec::new();
    for path in &args.files {
        match FileInput::read(path) {
            Ok(input) => inputs.push(input),
            Err(error) => {
                tracing::warn!(file = %path.display(), %error, "Failed to read file");
                read_failures.push(ImportFailure {
                    name: path.display().to_string(),
                    error,
                });
            }
        }
    }

    let mut batch = import_batch(&inputs, &config.distance_filter, &config.processing);
    batch.failures.extend(read_failures);

    if batch.activities.is_empty() {
        for failure in &batch.failures {
            eprintln!("{}: {}", failure.name, failure.error);
        }
        bail!("No activity could be imported");
    }

    let report = build_report(&args, &config, batch.activities, &batch.failures);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    Ok(())
}

fn validate_args(args: &Args) -> Result<()> {
    if !args.scale.is_finite() {
        bail!("Scale must be a finite number, got {}", args.scale);
    }
    if !args.offset.is_finite() {
        bail!("Offset must be a finite number, got {}", args.offset);
    }
    Ok(())
}

fn build_report(
    args: &Args,
    config: &AppConfig,
    mut activities: Vec<Activity>,
    failures: &[ImportFailure],
) -> Report {
    let axis = XAxis::from(args.axis);
    let window = WindowRange::new(args.window_start, args.window_end);
    let zone_field = args.zones.as_deref().map(Field::parse);
    let series_field = args.series.as_deref().map(Field::parse);
    let mut cache = TransformCache::new(config.cache_capacity);

    for activity in &mut activities {
        if args.offset != 0.0 || args.scale != 1.0 {
            activity.time_offset = args.offset;
            activity.scale = args.scale;
            activity.reprocess(&config.processing);
        }
        if !window.is_full() {
            let windowed = window_records(activity.records(), axis, activity.start_time, &window);
            activity.set_records(windowed);
        }
    }

    let shared_zones = zone_field.as_ref().filter(|_| activities.len() > 1).map(|field| {
        let records: Vec<&[_]> = activities.iter().map(|a| a.records()).collect();
        shared_pivot_zones(&records, field, config.pivot_zones.count)
    });

    let reports = activities
        .iter()
        .map(|activity| ActivityReport {
            name: activity.name.clone(),
            sport: activity.sport.clone(),
            start_time: activity.start_time,
            calories: activity.calories,
            laps: activity.laps.len(),
            records: activity.records().len(),
            statistics: compute_statistics_with(
                activity.records(),
                &config.processing.pace_smoothing,
            ),
            zones: zone_field
                .as_ref()
                .map(|field| cache.pivot_zones(activity, field, &config.pivot_zones)),
            series: series_field
                .as_ref()
                .map(|field| cache.series(activity, field, axis, config.cumulative)),
        })
        .collect();

    Report {
        activities: reports,
        failures: failures
            .iter()
            .map(|f| FailureReport {
                file: f.name.clone(),
                error: f.error.to_string(),
            })
            .collect(),
        shared_zones,
    }
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

fn print_text(report: &Report) {
    for activity in &report.activities {
        let stats = &activity.statistics;
        println!("{}", activity.name);
        if let Some(sport) = &activity.sport {
            println!("  sport          {}", sport);
        }
        println!("  records        {}", activity.records);
        println!("  duration       {}", format_duration(stats.duration_s));
        println!("  moving time    {}", format_duration(stats.moving_time_s));
        println!("  distance       {:.2} km", stats.distance_m / 1000.0);
        if let (Some(gain), Some(loss)) = (stats.elevation_gain_m, stats.elevation_loss_m) {
            println!("  elevation      +{:.0} m / -{:.0} m", gain, loss);
        }
        if let Some(pace) = &stats.pace {
            if let Some(avg) = pace.avg {
                println!("  avg pace       {:.2} min/km", avg);
            }
        }
        for (name, field) in &stats.fields {
            println!(
                "  {:<14} avg {:.1}  min {:.1}  max {:.1}",
                name, field.avg, field.min, field.max
            );
        }
        if let Some(power) = &stats.power {
            if let Some(np) = power.normalized_power {
                println!("  NP             {:.0} W", np);
            }
            for best in &power.best_efforts {
                println!("  best {:>3} min   {:.0} W", best.duration_s / 60, best.watts);
            }
        }
        for split in &stats.best_splits {
            println!("  {:<14} {}", split.label, format_duration(split.time_s));
        }
        if let Some(zones) = &activity.zones {
            for bucket in zones {
                println!(
                    "  zone {:>7.1}..{:<7.1} {}",
                    bucket.lower,
                    bucket.upper,
                    format_duration(bucket.seconds)
                );
            }
        }
        if let Some(series) = &activity.series {
            for point in series {
                println!("  {:>10.1} {:.2}", point.x, point.y);
            }
        }
        println!();
    }

    for failure in &report.failures {
        println!("failed: {}: {}", failure.file, failure.error);
    }
}
