use std::path::PathBuf;

use crate::weights::ScoringWeights;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Target geography for collectors and triage.
#[derive(Debug, Clone)]
pub struct GeographyConfig {
    pub target_state: String,
    pub target_cities: Vec<String>,
    pub target_zips: Vec<String>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub weights: ScoringWeights,
    pub geography: GeographyConfig,
    /// Path to the optional keyword/title classifier YAML; when the file is
    /// absent, compiled-in defaults apply.
    pub keywords_path: PathBuf,
    pub serpapi_key: Option<String>,
    pub min_permit_value: i64,
    pub permit_lookback_days: u32,
    pub hot_lead_threshold: f64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_write_max_retries: u32,
    pub db_write_backoff_base_ms: u64,
    pub search_request_timeout_secs: u64,
    pub search_inter_request_delay_ms: u64,
    pub search_max_retries: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("database_url", &"[redacted]")
            .field("weights", &self.weights)
            .field("geography", &self.geography)
            .field("keywords_path", &self.keywords_path)
            .field("serpapi_key", &self.serpapi_key.as_ref().map(|_| "[redacted]"))
            .field("min_permit_value", &self.min_permit_value)
            .field("permit_lookback_days", &self.permit_lookback_days)
            .field("hot_lead_threshold", &self.hot_lead_threshold)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("db_write_max_retries", &self.db_write_max_retries)
            .field("db_write_backoff_base_ms", &self.db_write_backoff_base_ms)
            .field("search_request_timeout_secs", &self.search_request_timeout_secs)
            .field(
                "search_inter_request_delay_ms",
                &self.search_inter_request_delay_ms,
            )
            .field("search_max_retries", &self.search_max_retries)
            .finish()
    }
}
