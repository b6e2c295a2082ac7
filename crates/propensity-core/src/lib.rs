use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod keywords;
pub mod normalize;
pub mod types;
pub mod weights;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{load_keyword_config, KeywordConfig};
pub use normalize::normalize_company_name;
pub use types::{
    CollectorError, OutreachMessage, OutreachRequest, ScoreBreakdown, ScoreResult,
    SignalCollector, SignalObservation, SignalProvenance, SignalScores, SignalUpdate, Tier,
};
pub use weights::ScoringWeights;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read keyword config at {path}: {source}")]
    KeywordFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse keyword config: {0}")]
    KeywordFileParse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}
