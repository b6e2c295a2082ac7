//! Primary-contact columns on `company_master`.
//!
//! A company holds at most one primary contact. The triage layer decides
//! whether a new candidate may replace the stored one (strictly-greater
//! relevance); this module only persists the outcome and stamps the search
//! date so already-searched companies can be skipped.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::companies::CompanyRow;
use crate::DbError;

#[derive(Debug, Clone)]
pub struct ContactUpdate<'a> {
    pub name: &'a str,
    pub title: &'a str,
    pub email: Option<&'a str>,
    pub linkedin: Option<&'a str>,
}

/// Overwrite the primary contact and stamp the search date.
///
/// # Errors
///
/// Returns `DbError::NotFound` if the company does not exist, or `DbError`
/// on query failure.
pub async fn set_primary_contact(
    pool: &PgPool,
    company_id: Uuid,
    contact: &ContactUpdate<'_>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE company_master SET \
           primary_contact_name = $2, \
           primary_contact_title = $3, \
           primary_contact_email = $4, \
           primary_contact_linkedin = $5, \
           xray_search_date = $6 \
         WHERE id = $1",
    )
    .bind(company_id)
    .bind(contact.name)
    .bind(contact.title)
    .bind(contact.email)
    .bind(contact.linkedin)
    .bind(Utc::now().date_naive())
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

const TARGET_COLUMNS: &str = "c.id, c.company_name, c.normalized_name, c.zip_code, c.city, \
     c.state, c.industry, c.website, c.hunter_email_pattern, c.primary_contact_name, \
     c.primary_contact_title, c.primary_contact_email, c.primary_contact_linkedin, \
     c.xray_search_date, c.created_at";

/// Companies whose latest snapshot is in `tier`, that have no primary
/// contact and have never been searched. Ordered by descending score so the
/// strongest leads are enriched first.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn list_unsearched_companies(
    pool: &PgPool,
    tier: &str,
    limit: i64,
) -> Result<Vec<CompanyRow>, DbError> {
    Ok(sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {TARGET_COLUMNS} FROM company_master c \
         JOIN LATERAL ( \
             SELECT score_tier, propensity_score FROM signal_history sh \
             WHERE sh.company_id = c.id AND sh.score_tier IS NOT NULL \
             ORDER BY sh.record_date DESC LIMIT 1 \
         ) s ON TRUE \
         WHERE s.score_tier = $1 \
           AND c.primary_contact_name IS NULL \
           AND c.xray_search_date IS NULL \
         ORDER BY s.propensity_score DESC, c.created_at \
         LIMIT $2"
    ))
    .bind(tier)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// Companies in `tier` that already hold a primary contact. The triage
/// layer re-scores the stored title and decides which of these are worth an
/// upgrade attempt.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn list_contacted_companies(
    pool: &PgPool,
    tier: &str,
    limit: i64,
) -> Result<Vec<CompanyRow>, DbError> {
    Ok(sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {TARGET_COLUMNS} FROM company_master c \
         JOIN LATERAL ( \
             SELECT score_tier, propensity_score FROM signal_history sh \
             WHERE sh.company_id = c.id AND sh.score_tier IS NOT NULL \
             ORDER BY sh.record_date DESC LIMIT 1 \
         ) s ON TRUE \
         WHERE s.score_tier = $1 \
           AND c.primary_contact_name IS NOT NULL \
         ORDER BY s.propensity_score DESC, c.created_at \
         LIMIT $2"
    ))
    .bind(tier)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// Stamp `xray_search_date` without touching contact fields. Called on
/// every search attempt — match or not — so a later pass can skip
/// companies that were already searched and yielded nothing.
///
/// # Errors
///
/// Returns `DbError::NotFound` if the company does not exist, or `DbError`
/// on query failure.
pub async fn touch_xray_search_date(pool: &PgPool, company_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE company_master SET xray_search_date = $2 WHERE id = $1")
        .bind(company_id)
        .bind(Utc::now().date_naive())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
