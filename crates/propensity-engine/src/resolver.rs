//! Identity resolution: raw collector observations to canonical companies.
//!
//! Every collector funnels through [`resolve_company`] before touching
//! signal or triage state, so a company id is always externally visible
//! before anything references it.

use sqlx::PgPool;

use propensity_core::normalize_company_name;
use propensity_db::{fill_company_attributes, find_or_create_company, CompanyRow, NewCompany};

use crate::EngineError;

/// Find or create the canonical company for a raw (name, zip) observation.
///
/// The raw name is normalized into the matching key; lookup and insert are
/// a single atomic find-or-create in the store, so concurrent resolution of
/// the same pair cannot create duplicates. On a hit, `extra` attributes
/// never overwrite stored values; ones the stored row lacks are filled in,
/// so a later collector can add an industry or website but the first
/// reported value always wins.
///
/// # Errors
///
/// Returns [`EngineError::UnresolvableCompany`] for records whose name
/// normalizes to nothing or whose zip code is empty (malformed input, to be
/// logged and skipped by batch callers), or [`EngineError::Db`] on store
/// failure.
pub async fn resolve_company(
    pool: &PgPool,
    raw_name: &str,
    zip_code: &str,
    extra: &NewCompany<'_>,
) -> Result<CompanyRow, EngineError> {
    let normalized = normalize_company_name(raw_name);
    if normalized.is_empty() {
        return Err(EngineError::UnresolvableCompany(format!(
            "name '{raw_name}' normalizes to an empty key"
        )));
    }
    let zip = zip_code.trim();
    if zip.is_empty() {
        return Err(EngineError::UnresolvableCompany(format!(
            "company '{raw_name}' has no zip code"
        )));
    }

    let mut row = find_or_create_company(pool, raw_name.trim(), &normalized, zip, extra).await?;
    if has_new_attributes(&row, extra) {
        row = fill_company_attributes(pool, row.id, extra).await?;
    }
    tracing::debug!(
        company = %row.company_name,
        id = %row.id,
        key = %row.normalized_name,
        zip = %row.zip_code,
        "resolved company"
    );
    Ok(row)
}

/// Whether `extra` supplies any attribute the stored row is missing.
fn has_new_attributes(row: &CompanyRow, extra: &NewCompany<'_>) -> bool {
    (extra.city.is_some() && row.city.is_none())
        || (extra.state.is_some() && row.state.is_none())
        || (extra.industry.is_some() && row.industry.is_none())
        || (extra.website.is_some() && row.website.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Store-backed behavior (atomic find-or-create, idempotent dedup) is
    // covered by the live tests in propensity-db. These exercise the
    // malformed-input rejection paths, which never reach the store.

    fn dead_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost:1/unreachable")
            .expect("lazy pool construction is infallible")
    }

    #[tokio::test]
    async fn empty_normalized_name_is_rejected() {
        let pool = dead_pool();
        let err = resolve_company(&pool, " .,. ", "75001", &NewCompany::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnresolvableCompany(_)));
    }

    #[test]
    fn attribute_fill_only_targets_absent_fields() {
        let row = CompanyRow {
            id: uuid::Uuid::new_v4(),
            company_name: "Acme".to_string(),
            normalized_name: "acme".to_string(),
            zip_code: "75001".to_string(),
            city: Some("Dallas".to_string()),
            state: None,
            industry: None,
            website: None,
            hunter_email_pattern: None,
            primary_contact_name: None,
            primary_contact_title: None,
            primary_contact_email: None,
            primary_contact_linkedin: None,
            xray_search_date: None,
            created_at: chrono::Utc::now(),
        };

        // A conflicting city is not "new"; a missing state is.
        let extra = NewCompany {
            city: Some("Plano"),
            state: Some("TX"),
            ..NewCompany::default()
        };
        assert!(has_new_attributes(&row, &extra));

        let extra = NewCompany {
            city: Some("Plano"),
            ..NewCompany::default()
        };
        assert!(!has_new_attributes(&row, &extra));

        assert!(!has_new_attributes(&row, &NewCompany::default()));
    }

    #[tokio::test]
    async fn empty_zip_is_rejected() {
        let pool = dead_pool();
        let err = resolve_company(&pool, "Acme Inc", "   ", &NewCompany::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnresolvableCompany(_)));
    }
}
