//! Contact triage: finding and quality-scoring a human point of contact
//! for each high-propensity company.

use thiserror::Error;

pub mod email;
pub mod search;
pub mod title;
pub mod triage;

pub use email::synthesize_email;
pub use search::{Candidate, CandidateSource, RawSearchHit, SerpApiClient, SerpApiConfig};
pub use title::{TitleClassifier, QUALIFY_THRESHOLD, TIER1_THRESHOLD};
pub use triage::{run_triage_batch, triage_company, TriageOutcome, TriageSummary};

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("search provider error: {0}")]
    SearchProvider(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Db(#[from] propensity_db::DbError),
}
