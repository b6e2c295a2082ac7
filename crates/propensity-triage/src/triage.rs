//! The triage state machine over company-contact pairs.
//!
//! States: no contact → searched-with-no-match, no contact → matched, and
//! matched → matched only for a strictly better candidate. Every search
//! attempt stamps the company's search date, so a pass never re-searches a
//! company that already came up empty; companies holding a low-tier match
//! stay eligible for an upgrade attempt.

use sqlx::PgPool;
use tokio::time::sleep;

use propensity_db::{
    list_contacted_companies, list_unsearched_companies, set_primary_contact,
    touch_xray_search_date, CompanyRow, ContactUpdate,
};

use crate::search::{Candidate, CandidateSource, SerpApiClient};
use crate::title::{TitleClassifier, QUALIFY_THRESHOLD, TIER1_THRESHOLD};
use crate::{synthesize_email, TriageError};

/// Number of priority titles tried per company before giving up.
const MAX_TITLE_SEARCHES: usize = 4;

/// How one company's triage attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageOutcome {
    /// A new contact was stored (first match, or strict upgrade).
    Matched(Candidate),
    /// A candidate was found but did not beat the stored contact.
    KeptExisting,
    /// No qualifying candidate; search date stamped so the company is
    /// skipped next pass.
    NoMatch,
}

/// Batch totals, reported even under partial failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TriageSummary {
    pub searched: usize,
    pub matched: usize,
    pub kept_existing: usize,
    pub no_match: usize,
    pub failed: usize,
}

/// Run the triage state machine for one company.
///
/// Walks the configured priority titles (first [`MAX_TITLE_SEARCHES`]),
/// scoring every hit. A tier-1 hit (≥ 80) ends the search immediately;
/// otherwise the best candidate ≥ 60 across all queries is kept. The
/// stored contact is only replaced when the new candidate scores strictly
/// higher than the stored title re-scored under the same classifier.
///
/// # Errors
///
/// Returns [`TriageError`] on search-provider or store failure. The search
/// date is stamped before any fallible search work, so even a failed
/// attempt is recorded.
pub async fn triage_company<S: CandidateSource>(
    pool: &PgPool,
    source: &S,
    classifier: &TitleClassifier,
    company: &CompanyRow,
    inter_request_delay: std::time::Duration,
) -> Result<TriageOutcome, TriageError> {
    // Stamp first: an attempt counts as "searched" regardless of outcome.
    touch_xray_search_date(pool, company.id).await?;

    let best = search_best_candidate(
        source,
        classifier,
        &company.company_name,
        company.city.as_deref(),
        inter_request_delay,
    )
    .await?;

    let Some(candidate) = best else {
        tracing::info!(company = %company.company_name, "no qualifying contact found");
        return Ok(TriageOutcome::NoMatch);
    };

    let stored_relevance = company
        .primary_contact_title
        .as_deref()
        .map_or(0, |t| classifier.score(t));
    if keeps_existing_contact(
        company.primary_contact_name.is_some(),
        stored_relevance,
        candidate.relevance,
    ) {
        tracing::info!(
            company = %company.company_name,
            stored = stored_relevance,
            candidate = candidate.relevance,
            "keeping existing contact"
        );
        return Ok(TriageOutcome::KeptExisting);
    }

    let email = company
        .hunter_email_pattern
        .as_deref()
        .and_then(|pattern| synthesize_email(pattern, &candidate.name));

    set_primary_contact(
        pool,
        company.id,
        &ContactUpdate {
            name: &candidate.name,
            title: &candidate.title,
            email: email.as_deref(),
            linkedin: Some(&candidate.profile_url),
        },
    )
    .await?;

    tracing::info!(
        company = %company.company_name,
        contact = %candidate.name,
        title = %candidate.title,
        relevance = candidate.relevance,
        "stored new primary contact"
    );
    Ok(TriageOutcome::Matched(candidate))
}

/// Monotonic upgrade rule: a stored contact survives unless the new
/// candidate scores strictly higher.
fn keeps_existing_contact(
    has_contact: bool,
    stored_relevance: u32,
    candidate_relevance: u32,
) -> bool {
    has_contact && candidate_relevance <= stored_relevance
}

/// Search the priority title sequence, returning the winning candidate.
///
/// Early-stops the first time any hit reaches [`TIER1_THRESHOLD`];
/// otherwise tracks the best hit at or above [`QUALIFY_THRESHOLD`].
async fn search_best_candidate<S: CandidateSource>(
    source: &S,
    classifier: &TitleClassifier,
    company_name: &str,
    city: Option<&str>,
    inter_request_delay: std::time::Duration,
) -> Result<Option<Candidate>, TriageError> {
    let mut best: Option<Candidate> = None;

    for (i, search_title) in classifier
        .config()
        .search_titles
        .iter()
        .take(MAX_TITLE_SEARCHES)
        .enumerate()
    {
        if i > 0 && !inter_request_delay.is_zero() {
            sleep(inter_request_delay).await;
        }

        let query = SerpApiClient::build_query(search_title, company_name, city);
        let hits = match source.search(&query).await {
            Ok(hits) => hits,
            Err(TriageError::Http(e)) => {
                // One flaky query is not fatal to the whole company.
                tracing::warn!(error = %e, title = %search_title, "search query failed, trying next title");
                continue;
            }
            Err(e) => return Err(e),
        };

        for hit in hits {
            let relevance = classifier.score(&hit.title);
            if relevance < QUALIFY_THRESHOLD {
                continue;
            }
            let candidate = Candidate {
                name: hit.name,
                title: hit.title,
                profile_url: hit.profile_url,
                relevance,
            };
            if relevance >= TIER1_THRESHOLD {
                return Ok(Some(candidate));
            }
            if best.as_ref().is_none_or(|b| relevance > b.relevance) {
                best = Some(candidate);
            }
        }
    }

    Ok(best)
}

/// Triage a batch of companies: unsearched hot leads first, then companies
/// whose stored contact does not qualify (upgrade attempts). Per-company
/// failures are logged and counted, never propagated.
///
/// # Errors
///
/// Returns [`TriageError::Db`] only if target selection itself fails.
pub async fn run_triage_batch<S: CandidateSource>(
    pool: &PgPool,
    source: &S,
    classifier: &TitleClassifier,
    limit: i64,
    inter_request_delay: std::time::Duration,
) -> Result<TriageSummary, TriageError> {
    let mut targets = list_unsearched_companies(pool, "hot", limit).await?;

    // Backfill with upgrade candidates when fresh targets run short.
    if (targets.len() as i64) < limit {
        let remaining = limit - targets.len() as i64;
        let contacted = list_contacted_companies(pool, "hot", limit).await?;
        targets.extend(
            contacted
                .into_iter()
                .filter(|c| {
                    c.primary_contact_title
                        .as_deref()
                        .map_or(0, |t| classifier.score(t))
                        < QUALIFY_THRESHOLD
                })
                .take(usize::try_from(remaining).unwrap_or(0)),
        );
    }

    let mut summary = TriageSummary::default();
    for company in &targets {
        summary.searched += 1;
        match triage_company(pool, source, classifier, company, inter_request_delay).await {
            Ok(TriageOutcome::Matched(_)) => summary.matched += 1,
            Ok(TriageOutcome::KeptExisting) => summary.kept_existing += 1,
            Ok(TriageOutcome::NoMatch) => summary.no_match += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(
                    company = %company.company_name,
                    error = %e,
                    "triage failed for company — continuing batch"
                );
            }
        }
    }

    tracing::info!(
        searched = summary.searched,
        matched = summary.matched,
        kept = summary.kept_existing,
        no_match = summary.no_match,
        failed = summary.failed,
        "triage batch complete"
    );
    Ok(summary)
}
