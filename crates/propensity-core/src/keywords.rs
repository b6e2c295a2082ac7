//! Keyword and title-list configuration for the free-text classifiers.
//!
//! The permit collectors and contact triage both filter free text against
//! keyword lists. Those lists live here as explicit configuration — YAML
//! overridable, compiled-in defaults — rather than as literals scattered
//! through the classifiers, so each list is independently testable.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Title inclusion tiers with their relevance scores, checked in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleTier {
    pub score: u32,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Keywords in a permit/notice/job description that mark it industrial.
    pub industrial_keywords: Vec<String>,
    /// Titles searched per company, in priority order.
    pub search_titles: Vec<String>,
    /// Title substrings that force a relevance score of 0, regardless of
    /// any inclusion match.
    pub excluded_title_terms: Vec<String>,
    /// Inclusion tiers, highest score first.
    pub title_tiers: Vec<TitleTier>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let list = |terms: &[&str]| terms.iter().map(ToString::to_string).collect::<Vec<_>>();
        Self {
            industrial_keywords: list(&[
                "warehouse",
                "distribution",
                "logistics",
                "conveyor",
                "racking",
                "rack",
                "mezzanine",
                "loading dock",
                "dock leveler",
                "cold storage",
                "freezer",
                "cooler",
                "manufacturing",
                "assembly",
                "packaging",
                "fulfillment",
                "cross-dock",
                "forklift",
                "pallet",
                "industrial",
                "3pl",
                "third party logistics",
            ]),
            search_titles: list(&[
                "plant manager",
                "operations manager",
                "procurement manager",
                "facility manager",
                "warehouse manager",
                "production manager",
                "hr director",
            ]),
            excluded_title_terms: list(&[
                "marketing",
                "sales",
                "account",
                "business development",
                "finance",
                "financial",
                "accounting",
                "controller",
                "legal",
                "counsel",
                "attorney",
                "compliance",
                "communications",
                "public relations",
                "media",
                "brand",
                "customer experience",
                "customer success",
                "customer service",
                "software",
                "engineer",
                "developer",
                "architect",
                "it ",
                "data",
                "analytics",
                "scientist",
                "research",
                "platform",
                "product manager",
                "product director",
                "consultant",
                "advisory",
                "associate director",
                "process mining",
                "intern",
                "assistant",
                "coordinator",
                "specialist",
            ]),
            title_tiers: vec![
                TitleTier {
                    score: 100,
                    terms: list(&["plant manager", "facility manager", "site manager"]),
                },
                TitleTier {
                    score: 90,
                    terms: list(&["procurement", "purchasing", "sourcing"]),
                },
                TitleTier {
                    score: 80,
                    terms: list(&[
                        "operations manager",
                        "operations director",
                        "vp operations",
                    ]),
                },
                TitleTier {
                    score: 75,
                    terms: list(&["production manager", "manufacturing manager"]),
                },
                TitleTier {
                    score: 70,
                    terms: list(&[
                        "warehouse manager",
                        "distribution manager",
                        "logistics manager",
                    ]),
                },
                TitleTier {
                    score: 60,
                    terms: list(&[
                        "hr director",
                        "human resources director",
                        "talent acquisition",
                    ]),
                },
            ],
        }
    }
}

impl KeywordConfig {
    /// Returns `true` if the text contains any industrial keyword
    /// (case-insensitive substring match).
    #[must_use]
    pub fn is_industrial(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.industrial_keywords.iter().any(|k| lower.contains(k))
    }
}

/// Load the keyword configuration from a YAML file, falling back to the
/// compiled-in defaults when the file does not exist.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_keyword_config(path: &Path) -> Result<KeywordConfig, ConfigError> {
    if !path.exists() {
        return Ok(KeywordConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let config: KeywordConfig = serde_yaml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &KeywordConfig) -> Result<(), ConfigError> {
    if config.search_titles.is_empty() {
        return Err(ConfigError::Validation(
            "search_titles must not be empty".to_string(),
        ));
    }
    for tier in &config.title_tiers {
        if tier.score > 100 {
            return Err(ConfigError::Validation(format!(
                "title tier score {} exceeds 100",
                tier.score
            )));
        }
        if tier.terms.is_empty() {
            return Err(ConfigError::Validation(format!(
                "title tier with score {} has no terms",
                tier.score
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        validate(&KeywordConfig::default()).unwrap();
    }

    #[test]
    fn default_tiers_are_descending() {
        let config = KeywordConfig::default();
        let scores: Vec<u32> = config.title_tiers.iter().map(|t| t.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(scores, sorted);
    }

    #[test]
    fn industrial_match_is_case_insensitive() {
        let config = KeywordConfig::default();
        assert!(config.is_industrial("New WAREHOUSE shell with loading dock"));
        assert!(config.is_industrial("install conveyor and racking systems"));
        assert!(!config.is_industrial("residential kitchen remodel"));
    }

    #[test]
    fn yaml_round_trip_preserves_tiers() {
        let config = KeywordConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: KeywordConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.title_tiers.len(), config.title_tiers.len());
        assert_eq!(parsed.title_tiers[0].score, 100);
    }

    #[test]
    fn empty_search_titles_fails_validation() {
        let config = KeywordConfig {
            search_titles: vec![],
            ..KeywordConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_keyword_config(Path::new("/nonexistent/keywords.yaml")).unwrap();
        assert!(!config.search_titles.is_empty());
    }
}
