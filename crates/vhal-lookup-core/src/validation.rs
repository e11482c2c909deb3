//! Accessibility results, confidence scoring, and alternative suggestions.
//!
//! Probing happens in the networked crate; everything here is pure
//! arithmetic and string formatting over [`ValidationResult`]s.

use serde::Serialize;
use url::Url;

/// Hosts on this domain count as authoritative for the confidence bonus.
const AUTHORITATIVE_DOMAIN: &str = "android.com";
const BONUS_PER_SOURCE: f64 = 2.0;
const MAX_BONUS: f64 = 10.0;

/// Outcome of probing one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub url: String,
    /// True iff the probe returned exactly HTTP 200.
    pub accessible: bool,
    pub status_code: Option<u16>,
    pub latency_ms: Option<f64>,
    pub last_modified: Option<String>,
    pub error: Option<String>,
}

impl ValidationResult {
    /// A result for a source that was not probed and is assumed reachable.
    pub fn assumed_accessible(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accessible: true,
            status_code: Some(200),
            latency_ms: None,
            last_modified: None,
            error: None,
        }
    }

    /// A result for a probe that never produced a response.
    pub fn unreachable(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accessible: false,
            status_code: None,
            latency_ms: None,
            last_modified: None,
            error: Some(error.into()),
        }
    }
}

/// Percentage of accessible results plus a capped authoritative bonus.
///
/// Returns 0 for an empty slice; never exceeds 100.
pub fn confidence(results: &[ValidationResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let accessible = results.iter().filter(|r| r.accessible).count();
    let mut score = accessible as f64 / results.len() as f64 * 100.0;

    let authoritative = results
        .iter()
        .filter(|r| r.accessible && r.last_modified.is_some() && is_authoritative(&r.url))
        .count();
    if authoritative > 0 {
        score += (authoritative as f64 * BONUS_PER_SOURCE).min(MAX_BONUS);
    }
    score.min(100.0)
}

fn is_authoritative(url: &str) -> bool {
    match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host == AUTHORITATIVE_DOMAIN || host.ends_with(".android.com"),
        None => false,
    }
}

fn last_path_segment(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Suggest where to look instead of an unreachable `url`.
pub fn suggest_alternative(url: &str) -> String {
    if url.contains("source.android.com") {
        format!(
            "Try Android Code Search: https://cs.android.com/search?q={}",
            last_path_segment(url)
        )
    } else if url.contains("googlesource.com") {
        format!(
            "Check if URL moved: {}",
            url.replace("/+/", "/+/refs/heads/main/")
        )
    } else {
        format!(
            "Search for alternative documentation for: {}",
            last_path_segment(url)
        )
    }
}

/// One suggestion per inaccessible result, in input order.
pub fn suggestions(results: &[ValidationResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.accessible)
        .map(|r| suggest_alternative(&r.url))
        .collect()
}
