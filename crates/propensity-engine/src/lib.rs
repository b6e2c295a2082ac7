//! Identity resolution, macro trend analysis, and propensity scoring.

use thiserror::Error;
use uuid::Uuid;

pub mod engine;
pub mod ingest;
pub mod macro_trend;
pub mod resolver;

pub use engine::{BatchScoreOutcome, ScoringEngine, TierCounts};
pub use ingest::{
    apply_macro_modifier, apply_observations, collect_from, record_indicator_point, IngestSummary,
};
pub use macro_trend::{modifier_for_series, trend_pct_change, TrendDirection};
pub use resolver::resolve_company;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("company not found: {0}")]
    CompanyNotFound(Uuid),
    #[error("cannot resolve company: {0}")]
    UnresolvableCompany(String),
    #[error(transparent)]
    Db(#[from] propensity_db::DbError),
}
