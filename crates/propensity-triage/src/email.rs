//! Email synthesis from a per-company naming pattern.
//!
//! Companies carry an optional discovered pattern like
//! `{first}.{last}@acme.com` or `{f}{last}@acme.com`. Given a candidate's
//! full name, the tokens are substituted to produce a best-guess address.

/// Substitute name tokens into an email pattern.
///
/// Supported tokens: `{first}`, `{last}`, `{f}` (first initial), `{l}`
/// (last initial). Returns `None` when the name cannot be split into at
/// least first and last words, or when the pattern has no `@`.
#[must_use]
pub fn synthesize_email(pattern: &str, full_name: &str) -> Option<String> {
    if !pattern.contains('@') {
        return None;
    }
    let words: Vec<&str> = full_name.split_whitespace().collect();
    let first = words.first()?.to_lowercase();
    let last = if words.len() > 1 {
        words[words.len() - 1].to_lowercase()
    } else {
        String::new()
    };
    // A single-word name cannot fill a two-part pattern safely.
    if last.is_empty() && (pattern.contains("{last}") || pattern.contains("{l}")) {
        return None;
    }

    let first_initial = first.chars().next()?.to_string();
    let last_initial = last.chars().next().map(String::from).unwrap_or_default();

    let email = pattern
        .replace("{first}", &first)
        .replace("{last}", &last)
        .replace("{f}", &first_initial)
        .replace("{l}", &last_initial);

    // A leftover brace means an unrecognized token; better no guess than a
    // wrong one.
    if email.contains('{') || email.contains('}') {
        return None;
    }
    Some(email)
}
