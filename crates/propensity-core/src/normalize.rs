//! Canonical company-name normalization for identity matching.
//!
//! The dedup key for a company is (normalized name, zip code), so two
//! collectors reporting "Acme Inc." and "ACME, INC" at the same zip must
//! produce the same key here.

/// Legal-entity suffixes stripped from the end of a name, longest first so
/// "corporation" is removed before "corp" would match inside it.
const LEGAL_SUFFIXES: &[&str] = &[
    " corporation",
    " limited",
    " company",
    " pllc",
    " corp",
    " llc",
    " llp",
    " ltd",
    " inc",
    " co",
    " lp",
    " pc",
];

/// Normalize a raw company name into its canonical matching key.
///
/// Lowercases, trims, strips trailing legal-entity suffixes, and removes
/// commas, periods, and apostrophes. Returns an empty string for empty or
/// whitespace-only input.
#[must_use]
pub fn normalize_company_name(name: &str) -> String {
    let mut normalized = name.to_lowercase().trim().to_string();

    // Punctuation first: "Acme, Inc." must reduce to "acme inc" before the
    // suffix pass sees it.
    normalized.retain(|c| c != ',' && c != '.' && c != '\'');
    normalized = normalized.trim().to_string();

    // Strip suffixes repeatedly so "Acme Holdings Co LLC" loses both.
    loop {
        let before = normalized.len();
        for suffix in LEGAL_SUFFIXES {
            if let Some(stripped) = normalized.strip_suffix(suffix) {
                normalized = stripped.trim_end().to_string();
                break;
            }
        }
        if normalized.len() == before {
            break;
        }
    }

    normalized.trim().to_string()
}
