//! Candidate discovery via Google X-ray search over public profiles.
//!
//! [`CandidateSource`] abstracts the search provider so the triage state
//! machine can be tested against a canned source. The production
//! implementation is [`SerpApiClient`], which queries Google through
//! SerpAPI and keeps only organic results that link to a profile page.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::TriageError;

const DEFAULT_BASE_URL: &str = "https://serpapi.com/";
const RESULTS_PER_QUERY: u32 = 5;

/// A search hit before title scoring: display name, raw title text, and
/// the profile URL it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSearchHit {
    pub name: String,
    pub title: String,
    pub profile_url: String,
}

/// A scored candidate contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub title: String,
    pub profile_url: String,
    pub relevance: u32,
}

/// A provider of candidate search results for one query string.
pub trait CandidateSource {
    /// Run one search query and return profile hits, best-effort parsed.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<RawSearchHit>, TriageError>> + Send;
}

#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    pub api_key: String,
    pub request_timeout_secs: u64,
    /// Minimum delay between consecutive search requests, honoring the
    /// provider's rate limits.
    pub inter_request_delay_ms: u64,
}

/// SerpAPI-backed Google search client.
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    inter_request_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    error: Option<String>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl SerpApiClient {
    /// Creates a client pointed at the production SerpAPI endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &SerpApiConfig) -> Result<Self, TriageError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`TriageError::SearchProvider`] for an invalid URL.
    pub fn with_base_url(config: &SerpApiConfig, base_url: &str) -> Result<Self, TriageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("propensity/0.1 (lead-enrichment)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| TriageError::SearchProvider(format!("invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url,
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
        })
    }

    /// The configured pause between consecutive queries.
    #[must_use]
    pub fn inter_request_delay(&self) -> Duration {
        self.inter_request_delay
    }

    /// Build the X-ray query for one (title, company) pair. The city is
    /// appended for smaller markets where it helps pin down local staff.
    #[must_use]
    pub fn build_query(title: &str, company: &str, city: Option<&str>) -> String {
        let mut parts = vec![
            "site:linkedin.com/in".to_string(),
            format!("\"{title}\""),
            format!("\"{company}\""),
        ];
        if let Some(city) = city {
            if city.len() > 3 {
                parts.push(format!("\"{city}\""));
            }
        }
        parts.join(" ")
    }
}

impl CandidateSource for SerpApiClient {
    async fn search(&self, query: &str) -> Result<Vec<RawSearchHit>, TriageError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| TriageError::SearchProvider(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("api_key", &self.api_key)
            .append_pair("engine", "google")
            .append_pair("num", &RESULTS_PER_QUERY.to_string());

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: SerpApiResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(TriageError::SearchProvider(error));
        }

        Ok(body
            .organic_results
            .into_iter()
            .filter(|r| r.link.contains("linkedin.com/in/"))
            .map(|r| {
                let (name, title) = parse_result_title(&r.title, &r.snippet);
                RawSearchHit {
                    name,
                    title,
                    profile_url: r.link,
                }
            })
            .collect())
    }
}

/// Split a search-result heading like `"Jane Doe - Plant Manager | LinkedIn"`
/// into (name, title). Falls back to scanning the snippet when the heading
/// carries no title segment.
fn parse_result_title(heading: &str, snippet: &str) -> (String, String) {
    let mut name = String::new();
    let mut title = String::new();

    if let Some((left, right)) = heading.split_once(" - ") {
        name = left.trim().to_string();
        title = right
            .split(" - ")
            .next()
            .unwrap_or(right)
            .replace(" | LinkedIn", "")
            .trim()
            .to_string();
    } else if let Some((left, _)) = heading.split_once(" | ") {
        name = left.trim().to_string();
    }

    if title.is_empty() && !snippet.is_empty() {
        // Common snippet shape: "Plant Manager at Acme · ..."
        if let Some((left, _)) = snippet.split_once(" at ") {
            let guess = left.trim();
            if !guess.is_empty() && guess.len() < 60 {
                title = guess.to_string();
            }
        }
    }

    (name, title)
}
