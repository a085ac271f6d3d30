//! URL validation, normalization and title derivation
//!
//! Everything here is pure: no storage, no logging.

use percent_encoding::percent_decode_str;
use url::Url;

/// Longest title derived from a URL, in characters
pub const MAX_DERIVED_TITLE_CHARS: usize = 50;

/// Result of splitting pasted text into URLs
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedUrls {
    /// Normalized http(s) URLs, in input order
    pub valid: Vec<String>,
    /// Lines that failed normalization, trimmed but otherwise untouched
    pub invalid: Vec<String>,
}

/// Canonicalize an absolute http(s) URL
///
/// Returns `None` for blank input, anything that does not parse as an absolute
/// URL (including bare hostnames like `example.com`), and non-http(s) schemes.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed.into()),
        _ => None,
    }
}

/// Derive a human-readable label for a URL
///
/// Uses the last non-empty path segment (percent-decoded, `-` and `_` turned
/// into spaces), then the hostname, then the raw input. Segment and raw
/// fallbacks are cut to [`MAX_DERIVED_TITLE_CHARS`].
///
/// # Example
/// ```
/// use link_groups::urls::title_from_url;
///
/// assert_eq!(title_from_url("https://github.com/foo/bar"), "bar");
/// assert_eq!(title_from_url("https://example.com"), "example.com");
/// ```
pub fn title_from_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return truncate_chars(url, MAX_DERIVED_TITLE_CHARS);
    };

    match parsed.path().split('/').filter(|s| !s.is_empty()).last() {
        Some(segment) => match percent_decode_str(segment).decode_utf8() {
            Ok(decoded) => {
                truncate_chars(&decoded.replace(['-', '_'], " "), MAX_DERIVED_TITLE_CHARS)
            }
            // Undecodable segment: treat like an unparsable URL
            Err(_) => truncate_chars(url, MAX_DERIVED_TITLE_CHARS),
        },
        None => parsed.host_str().unwrap_or_default().to_string(),
    }
}

/// Split text into trimmed, non-blank lines
pub fn parse_urls(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split text into lines and partition them by whether they normalize
pub fn parse_urls_with_validation(text: &str) -> ParsedUrls {
    let mut result = ParsedUrls::default();

    for line in parse_urls(text) {
        match normalize_url(&line) {
            Some(url) => result.valid.push(url),
            None => result.invalid.push(line),
        }
    }

    result
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
