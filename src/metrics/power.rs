//! Power-specific metrics: Normalized Power, variability index and best
//! average power over fixed durations.

use crate::activity::ActivityRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Rolling window used by Normalized Power, in seconds.
pub const NP_WINDOW_S: f64 = 30.0;

/// Durations reported as best efforts, in seconds.
pub const BEST_EFFORT_DURATIONS_S: [u32; 5] = [60, 300, 720, 1200, 3600];

/// Best average power held for a duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestPower {
    pub duration_s: u32,
    pub watts: f64,
}

/// Power summary of one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerMetrics {
    /// Normalized Power in watts
    pub normalized_power: Option<f64>,
    /// Mean of all power samples in watts
    pub average_power: f64,
    /// Normalized Power over average power
    pub variability_index: Option<f64>,
    /// Best average power for each duration that fits in the activity
    pub best_efforts: Vec<BestPower>,
}

/// Normalized Power over a time-indexed power stream.
///
/// NP = 4th root of average of (30-second rolling average power)^4
#[derive(Debug)]
pub struct NormalizedPowerCalculator {
    /// Samples inside the rolling window as (time, watts)
    window: VecDeque<(f64, f64)>,
    window_sum: f64,
    /// Time of the first sample
    start: Option<f64>,
    /// Sum of 4th powers
    sum_fourth_power: f64,
    /// Count of rolling averages
    count: u32,
}

impl NormalizedPowerCalculator {
    pub fn new() -> Self {
        Self {
            window: VecDeque::new(),
            window_sum: 0.0,
            start: None,
            sum_fourth_power: 0.0,
            count: 0,
        }
    }

    /// Add a power sample taken at `t` seconds.
    pub fn add(&mut self, t: f64, power: f64) {
        let start = *self.start.get_or_insert(t);

        self.window.push_back((t, power));
        self.window_sum += power;
        while let Some(&(oldest, watts)) = self.window.front() {
            if t - oldest < NP_WINDOW_S {
                break;
            }
            self.window.pop_front();
            self.window_sum -= watts;
        }

        // Only count once a full 30-second window has elapsed
        if t - start >= NP_WINDOW_S && !self.window.is_empty() {
            let avg = self.window_sum / self.window.len() as f64;
            self.sum_fourth_power += avg.powi(4);
            self.count += 1;
        }
    }

    /// Current Normalized Power.
    pub fn normalized_power(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some((self.sum_fourth_power / self.count as f64).powf(0.25))
    }
}

impl Default for NormalizedPowerCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized Power of the records' power samples.
pub fn normalized_power(records: &[ActivityRecord]) -> Option<f64> {
    let mut calc = NormalizedPowerCalculator::new();
    for record in records {
        if let Some(power) = record.power {
            calc.add(record.t, power);
        }
    }
    calc.normalized_power()
}

/// Best average power over any `duration_s`-second span.
///
/// Each power sample holds until the next record; records without power
/// contribute nothing. Returns `None` when the activity is shorter than the
/// duration.
pub fn best_average_power(records: &[ActivityRecord], duration_s: f64) -> Option<f64> {
    if records.len() < 2 || duration_s <= 0.0 {
        return None;
    }
    let last_t = records[records.len() - 1].t;

    // energy[k]: joules accumulated from the first record up to record k
    let mut energy = Vec::with_capacity(records.len());
    let mut total = 0.0;
    energy.push(0.0);
    for pair in records.windows(2) {
        total += pair[0].power.unwrap_or(0.0) * (pair[1].t - pair[0].t).max(0.0);
        energy.push(total);
    }

    let mut best: Option<f64> = None;
    let mut j = 0;
    for i in 0..records.len() {
        let end = records[i].t + duration_s;
        if end > last_t {
            break;
        }
        j = j.max(i);
        while j + 1 < records.len() && records[j + 1].t <= end {
            j += 1;
        }
        let end_energy = energy[j] + records[j].power.unwrap_or(0.0) * (end - records[j].t);
        let avg = (end_energy - energy[i]) / duration_s;
        best = Some(best.map_or(avg, |b: f64| b.max(avg)));
    }
    best
}

/// Power summary, or `None` when the records carry no power at all.
pub fn compute_power_metrics(records: &[ActivityRecord]) -> Option<PowerMetrics> {
    let samples: Vec<f64> = records.iter().filter_map(|r| r.power).collect();
    if samples.is_empty() {
        return None;
    }

    let average_power = samples.iter().sum::<f64>() / samples.len() as f64;
    let normalized_power = normalized_power(records);
    let variability_index = normalized_power
        .filter(|_| average_power > 0.0)
        .map(|np| np / average_power);

    let best_efforts = BEST_EFFORT_DURATIONS_S
        .iter()
        .filter_map(|&duration_s| {
            best_average_power(records, duration_s as f64)
                .map(|watts| BestPower { duration_s, watts })
        })
        .collect();

    Some(PowerMetrics {
        normalized_power,
        average_power,
        variability_index,
        best_efforts,
    })
}
