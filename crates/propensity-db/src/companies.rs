//! `company_master` access: the canonical deduplicated company table.
//!
//! The dedup key is (`normalized_name`, `zip_code`), enforced by a unique
//! constraint. [`find_or_create_company`] is the only write path that
//! creates rows, and it is race-safe: concurrent collectors resolving the
//! same company cannot produce duplicates.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub company_name: String,
    pub normalized_name: String,
    pub zip_code: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub hunter_email_pattern: Option<String>,
    pub primary_contact_name: Option<String>,
    pub primary_contact_title: Option<String>,
    pub primary_contact_email: Option<String>,
    pub primary_contact_linkedin: Option<String>,
    pub xray_search_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Optional attributes supplied at creation time. On a lookup hit these
/// never overwrite stored values; the resolver may add the absent ones via
/// [`fill_company_attributes`].
#[derive(Debug, Clone, Default)]
pub struct NewCompany<'a> {
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub industry: Option<&'a str>,
    pub website: Option<&'a str>,
}

const COMPANY_COLUMNS: &str = "id, company_name, normalized_name, zip_code, city, state, \
     industry, website, hunter_email_pattern, primary_contact_name, primary_contact_title, \
     primary_contact_email, primary_contact_linkedin, xray_search_date, created_at";

/// Atomic find-or-create keyed on (`normalized_name`, `zip_code`).
///
/// The insert uses `ON CONFLICT DO NOTHING` and then re-selects, so two
/// callers racing on the same key both land on the single surviving row.
/// On a hit the stored row is returned unchanged — `extra` attributes never
/// overwrite an existing company.
///
/// # Errors
///
/// Returns `DbError` on query failure, or `DbError::NotFound` if the row
/// vanishes between insert and select (concurrent delete, which the schema
/// does not normally allow).
pub async fn find_or_create_company(
    pool: &PgPool,
    company_name: &str,
    normalized_name: &str,
    zip_code: &str,
    extra: &NewCompany<'_>,
) -> Result<CompanyRow, DbError> {
    let inserted = sqlx::query_as::<_, CompanyRow>(&format!(
        "INSERT INTO company_master \
           (company_name, normalized_name, zip_code, city, state, industry, website) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (normalized_name, zip_code) DO NOTHING \
         RETURNING {COMPANY_COLUMNS}"
    ))
    .bind(company_name)
    .bind(normalized_name)
    .bind(zip_code)
    .bind(extra.city)
    .bind(extra.state)
    .bind(extra.industry)
    .bind(extra.website)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = inserted {
        return Ok(row);
    }

    // Conflict path: another caller (or an earlier run) owns the row.
    sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM company_master \
         WHERE normalized_name = $1 AND zip_code = $2"
    ))
    .bind(normalized_name)
    .bind(zip_code)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Fill in optional attributes that are still absent on an existing row.
///
/// Stored values always win; this only adds, never overwrites, so the
/// final state does not depend on which collector reported first with a
/// conflicting value.
///
/// # Errors
///
/// Returns `DbError::NotFound` for an unknown id, or `DbError` on query
/// failure.
pub async fn fill_company_attributes(
    pool: &PgPool,
    company_id: Uuid,
    extra: &NewCompany<'_>,
) -> Result<CompanyRow, DbError> {
    sqlx::query_as::<_, CompanyRow>(&format!(
        "UPDATE company_master SET \
           city = COALESCE(city, $2), \
           state = COALESCE(state, $3), \
           industry = COALESCE(industry, $4), \
           website = COALESCE(website, $5) \
         WHERE id = $1 \
         RETURNING {COMPANY_COLUMNS}"
    ))
    .bind(company_id)
    .bind(extra.city)
    .bind(extra.state)
    .bind(extra.industry)
    .bind(extra.website)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Fetch a company by id.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn get_company(pool: &PgPool, company_id: Uuid) -> Result<Option<CompanyRow>, DbError> {
    Ok(sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM company_master WHERE id = $1"
    ))
    .bind(company_id)
    .fetch_optional(pool)
    .await?)
}

/// List companies in insertion order, up to `limit`.
///
/// Insertion order matters downstream: batch scoring breaks score ties by
/// arrival order.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn list_companies(pool: &PgPool, limit: i64) -> Result<Vec<CompanyRow>, DbError> {
    Ok(sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM company_master ORDER BY created_at, id LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// Total number of companies.
///
/// # Errors
///
/// Returns `DbError` on query failure.
pub async fn count_companies(pool: &PgPool) -> Result<i64, DbError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM company_master")
            .fetch_one(pool)
            .await?,
    )
}
