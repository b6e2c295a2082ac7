use crate::app_config::{AppConfig, Environment, GeographyConfig};
use crate::weights::ScoringWeights;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PROPENSITY_ENV", "development"));

    let weights = ScoringWeights {
        expansion: parse_f64("WEIGHT_EXPANSION", "0.25")?,
        distress: parse_f64("WEIGHT_DISTRESS", "0.20")?,
        job_velocity: parse_f64("WEIGHT_JOB_VELOCITY", "0.20")?,
        sentiment: parse_f64("WEIGHT_SENTIMENT", "0.15")?,
        market_tightness: parse_f64("WEIGHT_MARKET_TIGHTNESS", "0.10")?,
        macro_trend: parse_f64("WEIGHT_MACRO", "0.10")?,
    };
    if weights.has_negative() {
        return Err(ConfigError::Validation(
            "scoring weights must be non-negative".to_string(),
        ));
    }
    // Invalid sum is a warning, not a hard stop: scores stay well-defined,
    // just not on the intended 0-100 scale.
    if !weights.is_valid() {
        tracing::warn!(
            sum = weights.sum(),
            "scoring weights do not sum to 1.0; check WEIGHT_* settings"
        );
    }

    let geography = GeographyConfig {
        target_state: or_default("TARGET_STATE", "TX"),
        target_cities: split_csv(&or_default(
            "TARGET_CITIES",
            "Dallas,Fort Worth,Arlington,Irving,Plano",
        )),
        target_zips: split_csv(&or_default("TARGET_ZIPS", "75001,75006,75019")),
    };

    let keywords_path = PathBuf::from(or_default(
        "PROPENSITY_KEYWORDS_PATH",
        "./config/keywords.yaml",
    ));
    let serpapi_key = lookup("SERPAPI_KEY").ok();

    Ok(AppConfig {
        database_url,
        env,
        weights,
        geography,
        keywords_path,
        serpapi_key,
        min_permit_value: parse_i64("MIN_PERMIT_VALUE", "50000")?,
        permit_lookback_days: parse_u32("PERMIT_LOOKBACK_DAYS", "30")?,
        hot_lead_threshold: parse_f64("HOT_LEAD_THRESHOLD", "75")?,
        db_max_connections: parse_u32("PROPENSITY_DB_MAX_CONNECTIONS", "10")?,
        db_min_connections: parse_u32("PROPENSITY_DB_MIN_CONNECTIONS", "1")?,
        db_acquire_timeout_secs: parse_u64("PROPENSITY_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
        db_write_max_retries: parse_u32("PROPENSITY_DB_WRITE_MAX_RETRIES", "3")?,
        db_write_backoff_base_ms: parse_u64("PROPENSITY_DB_WRITE_BACKOFF_BASE_MS", "500")?,
        search_request_timeout_secs: parse_u64("PROPENSITY_SEARCH_REQUEST_TIMEOUT_SECS", "30")?,
        search_inter_request_delay_ms: parse_u64("PROPENSITY_SEARCH_INTER_REQUEST_DELAY_MS", "500")?,
        search_max_retries: parse_u32("PROPENSITY_SEARCH_MAX_RETRIES", "3")?,
    })
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
