//! `economic_indicators` access: monthly macro series points.
//!
//! Unique on (`series_id`, `record_date`). Each point carries the raw value
//! plus the month-over-month change and trend direction computed at ingest
//! time, so the series is auditable without recomputation.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EconomicIndicatorRow {
    pub series_id: String,
    pub record_date: NaiveDate,
    pub value: f64,
    pub pct_change_mom: Option<f64>,
    pub trend_direction: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewIndicatorPoint<'a> {
    pub series_id: &'a str,
    pub record_date: NaiveDate,
    pub value: f64,
    pub pct_change_mom: Option<f64>,
    pub trend_direction: Option<&'a str>,
}

/// Upsert one series observation. Last writer wins on conflict.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn upsert_indicator_point(
    pool: &PgPool,
    point: &NewIndicatorPoint<'_>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO economic_indicators \
           (series_id, record_date, value, pct_change_mom, trend_direction) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (series_id, record_date) DO UPDATE SET \
           value = EXCLUDED.value, \
           pct_change_mom = EXCLUDED.pct_change_mom, \
           trend_direction = EXCLUDED.trend_direction",
    )
    .bind(point.series_id)
    .bind(point.record_date)
    .bind(point.value)
    .bind(point.pct_change_mom)
    .bind(point.trend_direction)
    .execute(pool)
    .await?;
    Ok(())
}

/// The most recent point of a series strictly before `before`, used to
/// compute the month-over-month change for a new point.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn latest_point_before(
    pool: &PgPool,
    series_id: &str,
    before: NaiveDate,
) -> Result<Option<EconomicIndicatorRow>, DbError> {
    Ok(sqlx::query_as::<_, EconomicIndicatorRow>(
        "SELECT series_id, record_date, value, pct_change_mom, trend_direction \
         FROM economic_indicators \
         WHERE series_id = $1 AND record_date < $2 \
         ORDER BY record_date DESC LIMIT 1",
    )
    .bind(series_id)
    .bind(before)
    .fetch_optional(pool)
    .await?)
}

/// The most recent `limit` values of a series, returned oldest-first so the
/// macro trend window (last 3 vs prior 3) reads naturally.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn latest_series_values(
    pool: &PgPool,
    series_id: &str,
    limit: i64,
) -> Result<Vec<f64>, DbError> {
    let mut values = sqlx::query_scalar::<_, f64>(
        "SELECT value FROM economic_indicators \
         WHERE series_id = $1 \
         ORDER BY record_date DESC LIMIT $2",
    )
    .bind(series_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    values.reverse();
    Ok(values)
}
