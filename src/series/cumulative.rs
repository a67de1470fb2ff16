//! Cumulative accumulation of optional series.

use serde::{Deserialize, Serialize};

/// How values are accumulated for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CumulativeMode {
    /// Values pass through unchanged
    #[default]
    Off,
    /// Running total of all values
    Sum,
    /// Running total of increases between consecutive values
    PositiveDeltaSum,
}

/// Accumulate `values` according to `mode`.
///
/// Gaps add nothing and carry the total forward; before the first value the
/// total is 0. A series without any value stays entirely absent.
pub fn accumulate(values: &[Option<f64>], mode: CumulativeMode) -> Vec<Option<f64>> {
    if mode == CumulativeMode::Off || values.iter().all(Option::is_none) {
        return values.to_vec();
    }

    let mut total = 0.0;
    let mut previous: Option<f64> = None;
    values
        .iter()
        .map(|value| {
            if let Some(v) = *value {
                match mode {
                    CumulativeMode::Sum => total += v,
                    CumulativeMode::PositiveDeltaSum => {
                        if let Some(p) = previous {
                            total += (v - p).max(0.0);
                        }
                    }
                    CumulativeMode::Off => {}
                }
                previous = Some(v);
            }
            Some(total)
        })
        .collect()
}
