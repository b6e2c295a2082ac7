//! Title relevance classifier.
//!
//! Maps a free-text job title to a 0-100 relevance score against the
//! configured tier lists. Exclusions are checked first and force 0 — a
//! "VP Operations & Marketing" is worthless to outreach even though
//! "operations" would otherwise match.

use propensity_core::KeywordConfig;

/// A candidate at or above this score ends the search immediately.
pub const TIER1_THRESHOLD: u32 = 80;

/// Minimum score for a candidate to be kept at all.
pub const QUALIFY_THRESHOLD: u32 = 60;

/// Score assigned to a generic manager/director title with no tier match.
const GENERIC_LEADERSHIP_SCORE: u32 = 30;

/// Score assigned to any other non-excluded title.
const FALLBACK_SCORE: u32 = 10;

/// Relevance scorer over a [`KeywordConfig`]'s title lists.
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    config: KeywordConfig,
}

impl TitleClassifier {
    #[must_use]
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Score a title 0-100. Higher is a better outreach target.
    ///
    /// Order of evaluation: empty → 0; any exclusion term present → 0;
    /// first matching inclusion tier → that tier's score; generic
    /// manager/director → 30; anything else → 10.
    #[must_use]
    pub fn score(&self, title: &str) -> u32 {
        if title.trim().is_empty() {
            return 0;
        }
        let lower = title.to_lowercase();

        if self
            .config
            .excluded_title_terms
            .iter()
            .any(|term| lower.contains(term))
        {
            return 0;
        }

        for tier in &self.config.title_tiers {
            if tier.terms.iter().any(|term| lower.contains(term)) {
                return tier.score;
            }
        }

        if lower.contains("manager") || lower.contains("director") {
            return GENERIC_LEADERSHIP_SCORE;
        }

        FALLBACK_SCORE
    }
}
