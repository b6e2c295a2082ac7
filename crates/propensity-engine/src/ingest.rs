//! Applying collector observations to the store.
//!
//! Identity resolution is the prerequisite barrier: a company row must
//! exist (and be externally visible) before any signal append references
//! its id, so each observation resolves first and upserts second.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use propensity_core::{SignalCollector, SignalObservation, SignalProvenance};
use propensity_db::{
    latest_snapshot, retry_write, upsert_signal_snapshot, NewCompany, NewIndicatorPoint,
    SignalHistoryRow, SignalSnapshotUpdate,
};

use crate::macro_trend::TrendDirection;
use crate::{resolve_company, EngineError};

/// Totals for one ingest pass over a batch of observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Run one collector and return its observations, or an empty batch when
/// the source is unreachable. A dead source contributes nothing this pass;
/// its signals simply stay at their stored values.
pub async fn collect_from<C: SignalCollector>(collector: &C) -> Vec<SignalObservation> {
    match collector.collect().await {
        Ok(observations) => {
            tracing::info!(
                collector = collector.name(),
                count = observations.len(),
                "collector pass complete"
            );
            observations
        }
        Err(e) => {
            tracing::error!(collector = collector.name(), error = %e, "collector failed");
            Vec::new()
        }
    }
}

/// Resolve and apply a batch of collector observations.
///
/// Malformed records (unresolvable identity) and per-record store failures
/// are logged and counted as skipped; they never abort the batch. Snapshot
/// writes go through the bounded retry wrapper.
///
/// # Errors
///
/// This function itself is infallible per-record by design; it only
/// returns `Err` if it cannot run at all (currently never, kept as a
/// `Result` so callers treat ingest uniformly with other batch stages).
pub async fn apply_observations(
    pool: &PgPool,
    observations: &[SignalObservation],
    write_max_retries: u32,
    write_backoff_base_ms: u64,
) -> Result<IngestSummary, EngineError> {
    let mut summary = IngestSummary::default();

    for obs in observations {
        match apply_one(pool, obs, write_max_retries, write_backoff_base_ms).await {
            Ok(()) => summary.applied += 1,
            Err(e) => {
                summary.skipped += 1;
                tracing::warn!(
                    company = %obs.raw_name,
                    zip = %obs.zip_code,
                    error = %e,
                    "skipping malformed or unwritable observation"
                );
            }
        }
    }

    Ok(summary)
}

async fn apply_one(
    pool: &PgPool,
    obs: &SignalObservation,
    write_max_retries: u32,
    write_backoff_base_ms: u64,
) -> Result<(), EngineError> {
    let extra = NewCompany {
        city: obs.city.as_deref(),
        state: obs.state.as_deref(),
        industry: obs.industry.as_deref(),
        website: obs.website.as_deref(),
    };
    let company = resolve_company(pool, &obs.raw_name, &obs.zip_code, &extra).await?;

    let record_date = obs.update.record_date.unwrap_or_else(|| Utc::now().date_naive());
    let provenance = obs.update.provenance.map(|p| match p {
        SignalProvenance::Observed => "observed",
        SignalProvenance::Estimated => "estimated",
    });
    let update = SignalSnapshotUpdate {
        expansion_score: obs.update.expansion,
        distress_score: obs.update.distress,
        sentiment_score: obs.update.sentiment,
        job_velocity_score: obs.update.job_velocity,
        turnover_score: obs.update.turnover,
        market_tightness_score: obs.update.market_tightness,
        macro_modifier: obs.update.macro_modifier,
        propensity_score: None,
        score_tier: None,
        provenance,
    };

    retry_write(write_max_retries, write_backoff_base_ms, || {
        upsert_signal_snapshot(pool, company.id, record_date, &update)
    })
    .await?;
    Ok(())
}

/// Record one monthly indicator observation, deriving its month-over-month
/// change and trend direction from the stored previous point.
///
/// Returns the derived direction, or `None` when there is no usable
/// previous point (first observation, or a zero previous value).
///
/// # Errors
///
/// Returns [`EngineError::Db`] if the previous-point read or the upsert
/// fails.
pub async fn record_indicator_point(
    pool: &PgPool,
    series_id: &str,
    record_date: NaiveDate,
    value: f64,
) -> Result<Option<TrendDirection>, EngineError> {
    let previous = propensity_db::latest_point_before(pool, series_id, record_date).await?;
    let pct_change_mom =
        previous.and_then(|p| crate::macro_trend::mom_pct_change(p.value, value));
    let direction = pct_change_mom.map(TrendDirection::classify);

    propensity_db::upsert_indicator_point(
        pool,
        &NewIndicatorPoint {
            series_id,
            record_date,
            value,
            pct_change_mom,
            trend_direction: direction.map(|d| d.as_str()),
        },
    )
    .await?;

    tracing::info!(
        series = series_id,
        date = %record_date,
        value,
        direction = direction.map_or("n/a", |d| d.as_str()),
        "recorded indicator point"
    );
    Ok(direction)
}

/// Compute the macro modifier from a stored indicator series and stamp it
/// onto today's snapshot for up to `limit` companies.
///
/// The modifier is company-independent; it rides along in each company's
/// snapshot so the scoring read stays a single row. When today's row does
/// not exist yet, the latest row's component values come along with the
/// stamp: a company whose collectors last reported on an earlier date keeps
/// its history instead of scoring from an all-NULL row.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if the series read or company listing
/// fails. Per-company failures are logged and skipped.
pub async fn apply_macro_modifier(
    pool: &PgPool,
    series_id: &str,
    limit: i64,
    write_max_retries: u32,
    write_backoff_base_ms: u64,
) -> Result<(f64, usize), EngineError> {
    // 12 months is plenty for the two three-month windows.
    let values = propensity_db::latest_series_values(pool, series_id, 12).await?;
    let modifier = crate::macro_trend::modifier_for_series(&values);
    tracing::info!(series = series_id, modifier, "computed macro modifier");

    let companies = propensity_db::list_companies(pool, limit).await?;
    let today = Utc::now().date_naive();

    let mut stamped = 0usize;
    for company in &companies {
        let result = stamp_company(
            pool,
            company.id,
            today,
            modifier,
            write_max_retries,
            write_backoff_base_ms,
        )
        .await;
        match result {
            Ok(()) => stamped += 1,
            Err(e) => tracing::warn!(
                company = %company.company_name,
                error = %e,
                "failed to stamp macro modifier — continuing"
            ),
        }
    }

    Ok((modifier, stamped))
}

async fn stamp_company(
    pool: &PgPool,
    company_id: uuid::Uuid,
    today: NaiveDate,
    modifier: f64,
    write_max_retries: u32,
    write_backoff_base_ms: u64,
) -> Result<(), EngineError> {
    let latest = latest_snapshot(pool, company_id).await?;
    let update = modifier_stamp(latest.as_ref(), today, modifier);
    retry_write(write_max_retries, write_backoff_base_ms, || {
        upsert_signal_snapshot(pool, company_id, today, &update)
    })
    .await?;
    Ok(())
}

/// The snapshot write for one modifier stamp. An earlier-dated latest row
/// has its component values carried into today's row alongside the
/// modifier; a row already dated today gets the modifier alone, so the
/// partial upsert leaves its fresher components untouched.
fn modifier_stamp<'a>(
    latest: Option<&'a SignalHistoryRow>,
    today: NaiveDate,
    modifier: f64,
) -> SignalSnapshotUpdate<'a> {
    match latest {
        Some(row) if row.record_date < today => SignalSnapshotUpdate {
            expansion_score: row.expansion_score,
            distress_score: row.distress_score,
            sentiment_score: row.sentiment_score,
            job_velocity_score: row.job_velocity_score,
            turnover_score: row.turnover_score,
            market_tightness_score: row.market_tightness_score,
            macro_modifier: Some(modifier),
            propensity_score: None,
            score_tier: None,
            provenance: row.provenance.as_deref(),
        },
        _ => SignalSnapshotUpdate {
            macro_modifier: Some(modifier),
            ..SignalSnapshotUpdate::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propensity_core::CollectorError;

    struct StubCollector {
        fail: bool,
    }

    impl SignalCollector for StubCollector {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn collect(&self) -> Result<Vec<SignalObservation>, CollectorError> {
            if self.fail {
                return Err(CollectorError {
                    collector: self.name(),
                    reason: "upstream portal unreachable".to_string(),
                });
            }
            Ok(vec![SignalObservation {
                raw_name: "Acme Fabrication Inc.".to_string(),
                zip_code: "29601".to_string(),
                ..SignalObservation::default()
            }])
        }
    }

    #[tokio::test]
    async fn collect_from_passes_observations_through() {
        let observations = collect_from(&StubCollector { fail: false }).await;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].zip_code, "29601");
    }

    #[tokio::test]
    async fn a_failed_collector_yields_an_empty_batch() {
        let observations = collect_from(&StubCollector { fail: true }).await;
        assert!(observations.is_empty());
    }

    fn snapshot_on(date: NaiveDate) -> SignalHistoryRow {
        SignalHistoryRow {
            company_id: uuid::Uuid::new_v4(),
            record_date: date,
            expansion_score: Some(85.0),
            distress_score: Some(70.0),
            sentiment_score: None,
            job_velocity_score: Some(80.0),
            turnover_score: Some(65.0),
            market_tightness_score: Some(75.0),
            macro_modifier: Some(1.0),
            propensity_score: Some(81.7),
            score_tier: Some("hot".to_string()),
            provenance: Some("observed".to_string()),
        }
    }

    #[test]
    fn stamping_carries_an_older_rows_components_forward() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let row = snapshot_on(yesterday);

        let update = modifier_stamp(Some(&row), today, 1.1);
        assert_eq!(update.macro_modifier, Some(1.1));
        assert_eq!(update.expansion_score, Some(85.0));
        assert_eq!(update.turnover_score, Some(65.0));
        assert_eq!(update.sentiment_score, None);
        assert_eq!(update.provenance, Some("observed"));
        // Scores are recomputed by the scoring stage, never carried.
        assert_eq!(update.propensity_score, None);
        assert_eq!(update.score_tier, None);
    }

    #[test]
    fn stamping_a_row_already_dated_today_writes_the_modifier_alone() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let row = snapshot_on(today);

        let update = modifier_stamp(Some(&row), today, 1.2);
        assert_eq!(update.macro_modifier, Some(1.2));
        // All other fields stay None so the upsert keeps today's values.
        assert_eq!(update.expansion_score, None);
        assert_eq!(update.turnover_score, None);
        assert_eq!(update.provenance, None);
    }

    #[test]
    fn stamping_without_history_writes_the_modifier_alone() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let update = modifier_stamp(None, today, 0.9);
        assert_eq!(update.macro_modifier, Some(0.9));
        assert_eq!(update.expansion_score, None);
    }
}
