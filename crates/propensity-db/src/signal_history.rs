//! `signal_history` access: the per-company, per-date signal time series.
//!
//! Rows are unique on (`company_id`, `record_date`). Writes are partial
//! upserts: a collector reporting only one component must not null out the
//! others, so every updatable column goes through `COALESCE(EXCLUDED.col,
//! existing.col)`. Historical dated rows are retained indefinitely; the
//! "current" state of a company is the row with the maximum `record_date`.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignalHistoryRow {
    pub company_id: Uuid,
    pub record_date: NaiveDate,
    pub expansion_score: Option<f64>,
    pub distress_score: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub job_velocity_score: Option<f64>,
    pub turnover_score: Option<f64>,
    pub market_tightness_score: Option<f64>,
    pub macro_modifier: Option<f64>,
    pub propensity_score: Option<f64>,
    pub score_tier: Option<String>,
    pub provenance: Option<String>,
}

/// Fields to write for one (`company_id`, `record_date`). `None` means
/// "leave the stored value alone", not "set to NULL".
#[derive(Debug, Clone, Default)]
pub struct SignalSnapshotUpdate<'a> {
    pub expansion_score: Option<f64>,
    pub distress_score: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub job_velocity_score: Option<f64>,
    pub turnover_score: Option<f64>,
    pub market_tightness_score: Option<f64>,
    pub macro_modifier: Option<f64>,
    pub propensity_score: Option<f64>,
    pub score_tier: Option<&'a str>,
    pub provenance: Option<&'a str>,
}

/// A company joined with the propensity score of its latest snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HotLeadRow {
    pub company_id: Uuid,
    pub company_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub propensity_score: f64,
    pub score_tier: String,
    pub record_date: NaiveDate,
}

/// Upsert one dated snapshot with partial-update semantics.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn upsert_signal_snapshot(
    pool: &PgPool,
    company_id: Uuid,
    record_date: NaiveDate,
    update: &SignalSnapshotUpdate<'_>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO signal_history \
           (company_id, record_date, expansion_score, distress_score, sentiment_score, \
            job_velocity_score, turnover_score, market_tightness_score, macro_modifier, \
            propensity_score, score_tier, provenance) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (company_id, record_date) DO UPDATE SET \
           expansion_score = COALESCE(EXCLUDED.expansion_score, signal_history.expansion_score), \
           distress_score = COALESCE(EXCLUDED.distress_score, signal_history.distress_score), \
           sentiment_score = COALESCE(EXCLUDED.sentiment_score, signal_history.sentiment_score), \
           job_velocity_score = COALESCE(EXCLUDED.job_velocity_score, signal_history.job_velocity_score), \
           turnover_score = COALESCE(EXCLUDED.turnover_score, signal_history.turnover_score), \
           market_tightness_score = COALESCE(EXCLUDED.market_tightness_score, signal_history.market_tightness_score), \
           macro_modifier = COALESCE(EXCLUDED.macro_modifier, signal_history.macro_modifier), \
           propensity_score = COALESCE(EXCLUDED.propensity_score, signal_history.propensity_score), \
           score_tier = COALESCE(EXCLUDED.score_tier, signal_history.score_tier), \
           provenance = COALESCE(EXCLUDED.provenance, signal_history.provenance), \
           updated_at = NOW()",
    )
    .bind(company_id)
    .bind(record_date)
    .bind(update.expansion_score)
    .bind(update.distress_score)
    .bind(update.sentiment_score)
    .bind(update.job_velocity_score)
    .bind(update.turnover_score)
    .bind(update.market_tightness_score)
    .bind(update.macro_modifier)
    .bind(update.propensity_score)
    .bind(update.score_tier)
    .bind(update.provenance)
    .execute(pool)
    .await?;
    Ok(())
}

/// The row with the maximum `record_date` for a company, if any.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn latest_snapshot(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Option<SignalHistoryRow>, DbError> {
    Ok(sqlx::query_as::<_, SignalHistoryRow>(
        "SELECT company_id, record_date, expansion_score, distress_score, sentiment_score, \
                job_velocity_score, turnover_score, market_tightness_score, macro_modifier, \
                propensity_score, score_tier, provenance \
         FROM signal_history \
         WHERE company_id = $1 \
         ORDER BY record_date DESC LIMIT 1",
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await?)
}

/// Companies whose latest snapshot has `propensity_score >= min_score`,
/// ordered by descending score.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn list_hot_leads(
    pool: &PgPool,
    min_score: f64,
    limit: i64,
) -> Result<Vec<HotLeadRow>, DbError> {
    Ok(sqlx::query_as::<_, HotLeadRow>(
        "SELECT c.id AS company_id, c.company_name, c.city, c.state, \
                s.propensity_score, s.score_tier, s.record_date \
         FROM company_master c \
         JOIN LATERAL ( \
             SELECT propensity_score, score_tier, record_date \
             FROM signal_history sh \
             WHERE sh.company_id = c.id AND sh.propensity_score IS NOT NULL \
             ORDER BY sh.record_date DESC LIMIT 1 \
         ) s ON TRUE \
         WHERE s.propensity_score >= $1 \
         ORDER BY s.propensity_score DESC, c.created_at \
         LIMIT $2",
    )
    .bind(min_score)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}
