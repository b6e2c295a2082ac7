//! Propensity score component weights.

use serde::{Deserialize, Serialize};

/// How far the weight sum may drift from 1.0 before we warn.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// The six component weights of the propensity formula.
///
/// One quirk is load-bearing: the `macro_trend` slot weights the *turnover*
/// component in the formula (the macro trend itself enters as a multiplier,
/// not a weighted term). Existing scores were produced under this mapping,
/// so it is preserved for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub expansion: f64,
    pub distress: f64,
    pub job_velocity: f64,
    pub sentiment: f64,
    pub market_tightness: f64,
    pub macro_trend: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            expansion: 0.25,
            distress: 0.20,
            job_velocity: 0.20,
            sentiment: 0.15,
            market_tightness: 0.10,
            macro_trend: 0.10,
        }
    }
}

impl ScoringWeights {
    /// Sum of all six weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.expansion
            + self.distress
            + self.job_velocity
            + self.sentiment
            + self.market_tightness
            + self.macro_trend
    }

    /// Whether the weights sum to 1.0 within [`WEIGHT_SUM_TOLERANCE`].
    ///
    /// An invalid sum is a warning condition, not a hard error: scores are
    /// still arithmetically well-defined, just no longer on a 0-100 scale.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE
    }

    /// Returns `true` if any weight is negative.
    #[must_use]
    pub fn has_negative(&self) -> bool {
        [
            self.expansion,
            self.distress,
            self.job_velocity,
            self.sentiment,
            self.market_tightness,
            self.macro_trend,
        ]
        .iter()
        .any(|w| *w < 0.0)
    }
}
