//! Shared domain types crossing crate boundaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discrete classification of a final propensity score, driving outreach
/// prioritization. Thresholds: hot ≥ 80, warm ≥ 60, cool ≥ 40, else cold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Cold,
    Cool,
    Warm,
    Hot,
}

impl Tier {
    /// Classify a final score into a tier. First match wins, top down.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score >= 80.0 {
            Tier::Hot
        } else if score >= 60.0 {
            Tier::Warm
        } else if score >= 40.0 {
            Tier::Cool
        } else {
            Tier::Cold
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cool => "cool",
            Tier::Cold => "cold",
        }
    }

    /// Parse a stored tier label. Unknown labels map to `Cold` so a stale
    /// row never escalates outreach priority.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "hot" => Tier::Hot,
            "warm" => Tier::Warm,
            "cool" => Tier::Cool,
            _ => Tier::Cold,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The six component signals plus the macro multiplier, as consumed by the
/// scoring formula. Components are on a 0-100 scale; absent signals default
/// to 0 and an absent macro modifier to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub expansion: f64,
    pub distress: f64,
    pub sentiment: f64,
    pub job_velocity: f64,
    pub turnover: f64,
    pub market_tightness: f64,
    pub macro_modifier: f64,
}

impl Default for SignalScores {
    fn default() -> Self {
        Self {
            expansion: 0.0,
            distress: 0.0,
            sentiment: 0.0,
            job_velocity: 0.0,
            turnover: 0.0,
            market_tightness: 0.0,
            macro_modifier: 1.0,
        }
    }
}

/// Per-component weighted contributions (weight × component value), reported
/// for explainability. Not re-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub expansion: f64,
    pub distress: f64,
    pub job_velocity: f64,
    pub sentiment: f64,
    pub market_tightness: f64,
    pub turnover: f64,
}

/// Outcome of scoring one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub company_id: Uuid,
    pub company_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Weighted sum before the macro multiplier.
    pub base_score: f64,
    pub macro_modifier: f64,
    /// Clamped to [0, 100].
    pub propensity_score: f64,
    pub tier: Tier,
    pub breakdown: ScoreBreakdown,
    pub scored_at: DateTime<Utc>,
}

/// Where a signal value came from. Collectors that fall back to estimated
/// or modeled values tag them so downstream consumers can tell them apart
/// from scraped observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalProvenance {
    Observed,
    Estimated,
}

/// A partial signal update from one collector for one company and date.
///
/// `None` fields mean "no observation", not zero: an upsert must leave the
/// stored value untouched for those columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalUpdate {
    pub record_date: Option<NaiveDate>,
    pub expansion: Option<f64>,
    pub distress: Option<f64>,
    pub sentiment: Option<f64>,
    pub job_velocity: Option<f64>,
    pub turnover: Option<f64>,
    pub market_tightness: Option<f64>,
    pub macro_modifier: Option<f64>,
    pub provenance: Option<SignalProvenance>,
}

/// One collector observation: the raw company identity as the source saw
/// it, optional enrichment attributes, and the partial signal update.
#[derive(Debug, Clone, Default)]
pub struct SignalObservation {
    pub raw_name: String,
    pub zip_code: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub update: SignalUpdate,
}

/// Boundary contract for the raw-data collectors (permit portals, layoff
/// notices, job boards, ...). Collectors live outside the core; the core
/// only consumes their field-mapped observations. A collector that is
/// unreachable on a run returns an error and its contribution is simply
/// absent — downstream defaulting applies.
pub trait SignalCollector {
    /// Stable name used for skip flags and logging.
    fn name(&self) -> &'static str;

    /// Gather this source's observations for the current pass.
    fn collect(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SignalObservation>, CollectorError>> + Send;
}

/// Failure of one external collector. Never fatal to a run.
#[derive(Debug, thiserror::Error)]
#[error("collector '{collector}' failed: {reason}")]
pub struct CollectorError {
    pub collector: &'static str,
    pub reason: String,
}

/// Input shape consumed by the outbound-message generator. The generator
/// itself is an external collaborator; only the boundary is defined here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachRequest {
    pub organization_name: String,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub signal_breakdown: ScoreBreakdown,
}

/// Output shape produced by the outbound-message generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachMessage {
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive_at_threshold() {
        assert_eq!(Tier::classify(80.0), Tier::Hot);
        assert_eq!(Tier::classify(79.999), Tier::Warm);
        assert_eq!(Tier::classify(60.0), Tier::Warm);
        assert_eq!(Tier::classify(40.0), Tier::Cool);
        assert_eq!(Tier::classify(39.999), Tier::Cold);
        assert_eq!(Tier::classify(0.0), Tier::Cold);
        assert_eq!(Tier::classify(100.0), Tier::Hot);
    }

    #[test]
    fn tier_labels_round_trip() {
        for tier in [Tier::Hot, Tier::Warm, Tier::Cool, Tier::Cold] {
            assert_eq!(Tier::from_label(tier.as_str()), tier);
        }
        assert_eq!(Tier::from_label("bogus"), Tier::Cold);
    }

    #[test]
    fn tier_ordering_supports_upgrade_checks() {
        assert!(Tier::Hot > Tier::Warm);
        assert!(Tier::Warm > Tier::Cool);
        assert!(Tier::Cool > Tier::Cold);
    }

    #[test]
    fn default_signals_are_neutral() {
        let signals = SignalScores::default();
        assert_eq!(signals.expansion, 0.0);
        assert_eq!(signals.macro_modifier, 1.0);
    }

    #[test]
    fn outreach_request_serializes_for_the_generator() {
        let request = OutreachRequest {
            organization_name: "Acme Fabrication".to_string(),
            contact_name: Some("Jordan Reyes".to_string()),
            contact_title: Some("Operations Manager".to_string()),
            signal_breakdown: ScoreBreakdown {
                expansion: 21.25,
                distress: 14.0,
                job_velocity: 16.0,
                sentiment: 9.0,
                market_tightness: 7.5,
                turnover: 6.5,
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        let message: OutreachMessage = serde_json::from_str(
            "{\"subject\":\"Intro\",\"body\":\"Hello\"}",
        )
        .unwrap();
        assert!(json.contains("\"organization_name\":\"Acme Fabrication\""));
        assert_eq!(message.subject, "Intro");
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&Tier::Hot).unwrap();
        assert_eq!(json, "\"hot\"");
    }
}
