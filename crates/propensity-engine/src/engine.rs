//! The propensity scoring engine.
//!
//! Reads the latest signal snapshot per company, applies the weighted
//! formula, clamps to [0, 100], classifies a tier, and writes the result
//! back as a snapshot dated today. Batch scoring is failure-isolated: one
//! bad company never aborts the rest.

use std::future::Future;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use propensity_core::{
    AppConfig, ScoreBreakdown, ScoreResult, ScoringWeights, SignalScores, Tier,
};
use propensity_db::{
    get_company, latest_snapshot, list_companies, retry_write, upsert_signal_snapshot,
    CompanyRow, SignalHistoryRow, SignalSnapshotUpdate,
};

use crate::EngineError;

/// Scored companies per tier, reported in every batch summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TierCounts {
    pub hot: usize,
    pub warm: usize,
    pub cool: usize,
    pub cold: usize,
}

impl TierCounts {
    pub fn record(&mut self, tier: Tier) {
        match tier {
            Tier::Hot => self.hot += 1,
            Tier::Warm => self.warm += 1,
            Tier::Cool => self.cool += 1,
            Tier::Cold => self.cold += 1,
        }
    }
}

/// Outcome of a batch scoring pass. `results` is sorted by descending
/// final score; ties keep arrival order. Produced even under partial
/// failure so a run never silently returns nothing when some inputs
/// succeeded.
#[derive(Debug)]
pub struct BatchScoreOutcome {
    pub results: Vec<ScoreResult>,
    pub tiers: TierCounts,
    pub failed: usize,
}

/// The single batch-scoring entry point. Constructed once per run with the
/// loaded weight configuration; holds no store state.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    write_max_retries: u32,
    write_backoff_base_ms: u64,
}

impl ScoringEngine {
    #[must_use]
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights,
            write_max_retries: 3,
            write_backoff_base_ms: 500,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            weights: config.weights,
            write_max_retries: config.db_write_max_retries,
            write_backoff_base_ms: config.db_write_backoff_base_ms,
        }
    }

    #[must_use]
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// The weighted formula, in its fixed evaluation order.
    ///
    /// The turnover component is weighted by the `macro_trend` slot — see
    /// [`ScoringWeights`] for why that mapping is preserved. Returns
    /// (base score, final clamped score, breakdown).
    #[must_use]
    pub fn calculate(&self, signals: &SignalScores) -> (f64, f64, ScoreBreakdown) {
        let w = &self.weights;
        let base = signals.expansion * w.expansion
            + signals.distress * w.distress
            + signals.job_velocity * w.job_velocity
            + signals.sentiment * w.sentiment
            + signals.market_tightness * w.market_tightness
            + signals.turnover * w.macro_trend;
        let final_score = (base * signals.macro_modifier).clamp(0.0, 100.0);
        let breakdown = ScoreBreakdown {
            expansion: signals.expansion * w.expansion,
            distress: signals.distress * w.distress,
            job_velocity: signals.job_velocity * w.job_velocity,
            sentiment: signals.sentiment * w.sentiment,
            market_tightness: signals.market_tightness * w.market_tightness,
            turnover: signals.turnover * w.macro_trend,
        };
        (base, final_score, breakdown)
    }

    /// Score one company from its latest stored snapshot and persist the
    /// result as a snapshot dated today.
    ///
    /// A company with no snapshot history scores from all-default signals
    /// (components 0, modifier 1.0) rather than erroring — a brand-new
    /// company is a cold lead, not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CompanyNotFound`] for an unknown id, or
    /// [`EngineError::Db`] on store failure (reads, or the write-back after
    /// bounded retries).
    pub async fn score_company(
        &self,
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<ScoreResult, EngineError> {
        let company = get_company(pool, company_id)
            .await?
            .ok_or(EngineError::CompanyNotFound(company_id))?;

        let snapshot = latest_snapshot(pool, company_id).await?;
        let signals = signals_from_snapshot(snapshot.as_ref());

        let (base, final_score, breakdown) = self.calculate(&signals);
        let tier = Tier::classify(final_score);

        // Write-back carries the raw components forward alongside the
        // computed score, so the dated row is self-contained.
        let update = SignalSnapshotUpdate {
            expansion_score: Some(signals.expansion),
            distress_score: Some(signals.distress),
            sentiment_score: Some(signals.sentiment),
            job_velocity_score: Some(signals.job_velocity),
            turnover_score: Some(signals.turnover),
            market_tightness_score: Some(signals.market_tightness),
            macro_modifier: Some(signals.macro_modifier),
            propensity_score: Some(final_score),
            score_tier: Some(tier.as_str()),
            provenance: None,
        };
        let today = Utc::now().date_naive();
        retry_write(self.write_max_retries, self.write_backoff_base_ms, || {
            upsert_signal_snapshot(pool, company_id, today, &update)
        })
        .await?;

        tracing::info!(
            company = %company.company_name,
            score = final_score,
            tier = %tier,
            "scored company"
        );

        Ok(ScoreResult {
            company_id,
            company_name: company.company_name,
            city: company.city,
            state: company.state,
            base_score: base,
            macro_modifier: signals.macro_modifier,
            propensity_score: final_score,
            tier,
            breakdown,
            scored_at: Utc::now(),
        })
    }

    /// Score up to `limit` companies in arrival order.
    ///
    /// Per-company failures are logged, counted, and skipped. Results come
    /// back sorted by descending final score; the sort is stable, so equal
    /// scores keep arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] only if the company listing itself
    /// fails — individual scoring failures never abort the batch.
    pub async fn score_all(
        &self,
        pool: &PgPool,
        limit: i64,
    ) -> Result<BatchScoreOutcome, EngineError> {
        if !self.weights.is_valid() {
            tracing::warn!(
                sum = self.weights.sum(),
                "scoring under weights that do not sum to 1.0"
            );
        }

        let companies = list_companies(pool, limit).await?;
        let outcome = score_batch(&companies, |id| self.score_company(pool, id)).await;

        tracing::info!(
            scored = outcome.results.len(),
            failed = outcome.failed,
            hot = outcome.tiers.hot,
            warm = outcome.tiers.warm,
            cool = outcome.tiers.cool,
            cold = outcome.tiers.cold,
            "batch scoring complete"
        );

        Ok(outcome)
    }
}

/// Run one scorer over a batch, isolating per-company failures: an error
/// is logged and counted, never propagated. Results come back sorted by
/// descending final score with stable ties.
async fn score_batch<F, Fut>(companies: &[CompanyRow], mut score_one: F) -> BatchScoreOutcome
where
    F: FnMut(Uuid) -> Fut,
    Fut: Future<Output = Result<ScoreResult, EngineError>>,
{
    let mut results = Vec::with_capacity(companies.len());
    let mut tiers = TierCounts::default();
    let mut failed = 0usize;

    for company in companies {
        match score_one(company.id).await {
            Ok(result) => {
                tiers.record(result.tier);
                results.push(result);
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    company = %company.company_name,
                    error = %e,
                    "failed to score company — continuing batch"
                );
            }
        }
    }

    results.sort_by(|a, b| b.propensity_score.total_cmp(&a.propensity_score));

    BatchScoreOutcome {
        results,
        tiers,
        failed,
    }
}

/// Defaulting boundary: absent snapshot or absent columns become neutral
/// signal values (components 0, modifier 1.0).
fn signals_from_snapshot(snapshot: Option<&SignalHistoryRow>) -> SignalScores {
    let Some(row) = snapshot else {
        return SignalScores::default();
    };
    SignalScores {
        expansion: row.expansion_score.unwrap_or(0.0),
        distress: row.distress_score.unwrap_or(0.0),
        sentiment: row.sentiment_score.unwrap_or(0.0),
        job_velocity: row.job_velocity_score.unwrap_or(0.0),
        turnover: row.turnover_score.unwrap_or(0.0),
        market_tightness: row.market_tightness_score.unwrap_or(0.0),
        macro_modifier: row.macro_modifier.unwrap_or(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringWeights::default())
    }

    #[test]
    fn formula_matches_reference_example() {
        let signals = SignalScores {
            expansion: 85.0,
            distress: 70.0,
            job_velocity: 80.0,
            sentiment: 60.0,
            market_tightness: 75.0,
            turnover: 65.0,
            macro_modifier: 1.1,
        };
        let (base, final_score, breakdown) = engine().calculate(&signals);

        assert!((base - 74.25).abs() < 1e-9, "base was {base}");
        assert!((final_score - 81.675).abs() < 1e-9, "final was {final_score}");
        assert_eq!(Tier::classify(final_score), Tier::Hot);

        assert!((breakdown.expansion - 21.25).abs() < 1e-9);
        assert!((breakdown.distress - 14.0).abs() < 1e-9);
        assert!((breakdown.job_velocity - 16.0).abs() < 1e-9);
        assert!((breakdown.sentiment - 9.0).abs() < 1e-9);
        assert!((breakdown.market_tightness - 7.5).abs() < 1e-9);
        assert!((breakdown.turnover - 6.5).abs() < 1e-9);
    }

    #[test]
    fn turnover_is_weighted_by_the_macro_slot() {
        let weights = ScoringWeights {
            expansion: 0.0,
            distress: 0.0,
            job_velocity: 0.0,
            sentiment: 0.0,
            market_tightness: 0.0,
            macro_trend: 1.0,
        };
        let signals = SignalScores {
            turnover: 42.0,
            ..SignalScores::default()
        };
        let (base, _, breakdown) = ScoringEngine::new(weights).calculate(&signals);
        assert!((base - 42.0).abs() < 1e-9);
        assert!((breakdown.turnover - 42.0).abs() < 1e-9);
    }

    #[test]
    fn final_score_clamps_to_hundred() {
        let signals = SignalScores {
            expansion: 100.0,
            distress: 100.0,
            job_velocity: 100.0,
            sentiment: 100.0,
            market_tightness: 100.0,
            turnover: 100.0,
            macro_modifier: 1.2,
        };
        let (base, final_score, _) = engine().calculate(&signals);
        assert!((base - 100.0).abs() < 1e-9);
        assert_eq!(final_score, 100.0);
    }

    #[test]
    fn final_score_clamps_negative_inputs_to_zero() {
        // Defensive: components are non-negative in practice, but the clamp
        // must hold anyway.
        let signals = SignalScores {
            expansion: -500.0,
            macro_modifier: 1.0,
            ..SignalScores::default()
        };
        let (_, final_score, _) = engine().calculate(&signals);
        assert_eq!(final_score, 0.0);
    }

    #[test]
    fn all_default_signals_score_cold() {
        let (base, final_score, _) = engine().calculate(&SignalScores::default());
        assert_eq!(base, 0.0);
        assert_eq!(final_score, 0.0);
        assert_eq!(Tier::classify(final_score), Tier::Cold);
    }

    #[test]
    fn snapshot_defaulting_fills_absent_fields() {
        let row = SignalHistoryRow {
            company_id: Uuid::new_v4(),
            record_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            expansion_score: Some(85.0),
            distress_score: None,
            sentiment_score: None,
            job_velocity_score: None,
            turnover_score: None,
            market_tightness_score: None,
            macro_modifier: None,
            propensity_score: None,
            score_tier: None,
            provenance: None,
        };
        let signals = signals_from_snapshot(Some(&row));
        assert_eq!(signals.expansion, 85.0);
        assert_eq!(signals.distress, 0.0);
        assert_eq!(signals.macro_modifier, 1.0);
    }

    #[test]
    fn missing_snapshot_defaults_to_neutral() {
        let signals = signals_from_snapshot(None);
        assert_eq!(signals, SignalScores::default());
    }

    fn company(name: &str) -> CompanyRow {
        CompanyRow {
            id: Uuid::new_v4(),
            company_name: name.to_string(),
            normalized_name: name.to_lowercase(),
            zip_code: "29601".to_string(),
            city: None,
            state: None,
            industry: None,
            website: None,
            hunter_email_pattern: None,
            primary_contact_name: None,
            primary_contact_title: None,
            primary_contact_email: None,
            primary_contact_linkedin: None,
            xray_search_date: None,
            created_at: Utc::now(),
        }
    }

    fn result_for(company_id: Uuid, score: f64) -> ScoreResult {
        ScoreResult {
            company_id,
            company_name: "stub".to_string(),
            city: None,
            state: None,
            base_score: score,
            macro_modifier: 1.0,
            propensity_score: score,
            tier: Tier::classify(score),
            breakdown: ScoreBreakdown {
                expansion: 0.0,
                distress: 0.0,
                job_velocity: 0.0,
                sentiment: 0.0,
                market_tightness: 0.0,
                turnover: 0.0,
            },
            scored_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn batch_scoring_continues_past_a_failing_company() {
        let companies = vec![company("First Co"), company("Second Co"), company("Third Co")];
        let first = companies[0].id;
        let bad = companies[1].id;

        let outcome = score_batch(&companies, |id| async move {
            if id == bad {
                Err(EngineError::CompanyNotFound(id))
            } else if id == first {
                Ok(result_for(id, 50.0))
            } else {
                Ok(result_for(id, 90.0))
            }
        })
        .await;

        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.results.len(), 2);
        // Sorted by descending score, not arrival order.
        assert_eq!(outcome.results[0].propensity_score, 90.0);
        assert_eq!(outcome.results[1].propensity_score, 50.0);
        assert_eq!(outcome.tiers.hot, 1);
        assert_eq!(outcome.tiers.cool, 1);
    }

    #[tokio::test]
    async fn an_empty_batch_yields_an_empty_outcome() {
        let outcome = score_batch(&[], |id| async move { Ok(result_for(id, 0.0)) }).await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.failed, 0);
    }

    #[test]
    fn tier_counts_accumulate() {
        let mut counts = TierCounts::default();
        counts.record(Tier::Hot);
        counts.record(Tier::Hot);
        counts.record(Tier::Cold);
        assert_eq!(counts.hot, 2);
        assert_eq!(counts.cold, 1);
        assert_eq!(counts.warm, 0);
    }
}
