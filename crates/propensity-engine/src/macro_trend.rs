//! Macro-economic trend analysis over monthly series.
//!
//! A series trend is summarized as the percentage change between the mean
//! of its last three observations and the mean of the three before that.
//! The propensity formula consumes the trend as a multiplier in
//! [0.8, 1.2]; indicator persistence consumes it as a direction label.

use serde::{Deserialize, Serialize};

/// Minimum observations needed to form two three-month windows.
pub const MIN_OBSERVATIONS: usize = 6;

/// Coarse direction of a series, derived from its windowed pct change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    /// Classify a pct change: up above +5%, down below −5%, flat between.
    #[must_use]
    pub fn classify(pct_change: f64) -> Self {
        if pct_change > 0.05 {
            TrendDirection::Up
        } else if pct_change < -0.05 {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Flat => "flat",
        }
    }
}

/// Windowed pct change: mean of the last 3 values vs mean of the 3 before.
///
/// Returns `None` for fewer than [`MIN_OBSERVATIONS`] values (insufficient
/// data, not an error). A zero prior average yields `Some(0.0)` rather than
/// a division blow-up.
#[must_use]
pub fn trend_pct_change(values: &[f64]) -> Option<f64> {
    if values.len() < MIN_OBSERVATIONS {
        return None;
    }
    let n = values.len();
    let recent_avg: f64 = values[n - 3..].iter().sum::<f64>() / 3.0;
    let prior_avg: f64 = values[n - 6..n - 3].iter().sum::<f64>() / 3.0;
    if prior_avg == 0.0 {
        return Some(0.0);
    }
    Some((recent_avg - prior_avg) / prior_avg)
}

/// Map a pct change onto the fixed modifier bands.
///
/// Evaluated top-down with strict inequalities, so exact boundary values
/// fall into the band below deterministically.
#[must_use]
pub fn modifier_for_pct_change(pct_change: f64) -> f64 {
    if pct_change > 0.10 {
        1.2
    } else if pct_change > 0.05 {
        1.1
    } else if pct_change > -0.05 {
        1.0
    } else if pct_change > -0.10 {
        0.9
    } else {
        0.8
    }
}

/// Macro modifier for a monthly series, in [0.8, 1.2].
///
/// Fewer than [`MIN_OBSERVATIONS`] values → 1.0 regardless of content.
#[must_use]
pub fn modifier_for_series(values: &[f64]) -> f64 {
    match trend_pct_change(values) {
        Some(pct) => modifier_for_pct_change(pct),
        None => {
            tracing::warn!(
                observations = values.len(),
                "insufficient data for macro modifier, using 1.0"
            );
            1.0
        }
    }
}

/// Month-over-month pct change for one series point, recorded alongside
/// each stored observation. `None` when the previous value is zero.
#[must_use]
pub fn mom_pct_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous)
}
