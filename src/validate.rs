//! Source accessibility probes and the enhanced (validated) summary report.
//!
//! Probing is advisory: it annotates a summary with a confidence score and
//! suggestions, and never changes the summary text itself.

use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use serde::Serialize;
use std::time::{Duration, Instant};
use vhal_lookup_core::validation::{confidence, suggestions, ValidationResult};

use crate::fetch::Fetcher;
use crate::pool::bounded_join;

/// Issues HEAD probes over the fetcher's pooled client.
#[derive(Debug, Clone)]
pub struct SourceValidator {
    client: reqwest::Client,
    max_concurrent: usize,
    deadline: Duration,
}

impl SourceValidator {
    pub fn new(fetcher: &Fetcher) -> Self {
        Self {
            client: fetcher.client().clone(),
            max_concurrent: fetcher.max_concurrent(),
            deadline: fetcher.batch_deadline(),
        }
    }

    /// Probe one URL. Accessible iff the final response is exactly 200.
    pub async fn validate_one(&self, url: &str) -> ValidationResult {
        let started = Instant::now();
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let last_modified = response
                    .headers()
                    .get(LAST_MODIFIED)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                ValidationResult {
                    url: url.to_string(),
                    accessible: status == 200,
                    status_code: Some(status),
                    latency_ms: Some(started.elapsed().as_secs_f64() * 1000.0),
                    last_modified,
                    error: (status != 200).then(|| format!("HTTP {}", status)),
                }
            }
            Err(e) => {
                let mut result = ValidationResult::unreachable(url, e.to_string());
                result.latency_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
                result
            }
        }
    }

    /// Probe every URL on the bounded pool. Probes cut off by the batch
    /// deadline are reported as unreachable.
    pub async fn validate(&self, urls: &[String]) -> Vec<ValidationResult> {
        let tasks: Vec<_> = urls
            .iter()
            .map(|url| {
                let validator = self.clone();
                let url = url.clone();
                async move { validator.validate_one(&url).await }
            })
            .collect();

        bounded_join(tasks, self.max_concurrent, self.deadline)
            .await
            .into_iter()
            .zip(urls)
            .map(|(result, url)| {
                result.unwrap_or_else(|| ValidationResult::unreachable(url.as_str(), "Validation timed out"))
            })
            .collect()
    }
}

/// A summary annotated with source validation.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedSummary {
    pub question: String,
    pub summary: String,
    pub validations: Vec<ValidationResult>,
    pub confidence: f64,
    pub total_sources: usize,
    pub accessible_sources: usize,
    pub cached_sources: usize,
    pub suggestions: Vec<String>,
}

impl EnhancedSummary {
    pub fn new(
        question: &str,
        summary: String,
        validations: Vec<ValidationResult>,
        cached_sources: usize,
    ) -> Self {
        Self {
            question: question.to_string(),
            confidence: confidence(&validations),
            total_sources: validations.len(),
            accessible_sources: validations.iter().filter(|v| v.accessible).count(),
            suggestions: suggestions(&validations),
            cached_sources,
            summary,
            validations,
        }
    }

    /// Markdown report stamped with `now`.
    pub fn render(&self, now: DateTime<Utc>) -> String {
        let mut lines = vec![
            format!("# Enhanced vHAL Summary: '{}'", self.question),
            String::new(),
            format!(
                "**Confidence Score:** {:.1}% ({}/{} sources validated)",
                self.confidence, self.accessible_sources, self.total_sources
            ),
            String::new(),
            "## Source Validation Results".to_string(),
            String::new(),
        ];

        let mut sorted: Vec<&ValidationResult> = self.validations.iter().collect();
        sorted.sort_by(|a, b| (!a.accessible, &a.url).cmp(&(!b.accessible, &b.url)));

        for v in sorted {
            let icon = if v.accessible { "✅" } else { "❌" };
            let status = match v.status_code {
                Some(code) => format!("HTTP {}", code),
                None => "Failed".to_string(),
            };
            lines.push(format!("{} **{}**", icon, v.url));
            lines.push(format!("   Status: {}", status));
            if let Some(lm) = &v.last_modified {
                lines.push(format!("   Last-Modified: {}", lm));
            }
            if let Some(ms) = v.latency_ms {
                lines.push(format!("   Response Time: {:.1}ms", ms));
            }
            if let Some(err) = &v.error {
                lines.push(format!("   Error: {}", err));
            }
            lines.push(String::new());
        }

        if !self.suggestions.is_empty() {
            lines.push("## Alternative Sources for Failed URLs".to_string());
            lines.push(String::new());
            lines.extend(self.suggestions.iter().map(|s| format!("- {}", s)));
            lines.push(String::new());
        }

        lines.extend([
            "## Summary Content".to_string(),
            String::new(),
            self.summary.clone(),
            String::new(),
            "---".to_string(),
            format!(
                "*Validation performed at: {}*",
                now.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            format!(
                "*Total sources checked: {} | Accessible: {} | Cached: {}*",
                self.total_sources, self.accessible_sources, self.cached_sources
            ),
        ]);

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ContentCache;
    use crate::config::HttpConfig;
    use crate::test_support::{dead_base, spawn_server};
    use axum::http::{header, StatusCode, Uri};
    use axum::response::IntoResponse;
    use axum::Router;
    use chrono::TimeZone;
    use std::sync::Arc;
    use vhal_lookup_core::locator::ResourceLocator;

    fn validator() -> SourceValidator {
        let http = HttpConfig {
            timeout_secs: 2,
            batch_deadline_secs: 5,
            ..HttpConfig::default()
        };
        let fetcher =
            Fetcher::new(&http, ResourceLocator::default(), Arc::new(ContentCache::default()))
                .unwrap();
        SourceValidator::new(&fetcher)
    }

    fn probe_app() -> Router {
        Router::new().fallback(|uri: Uri| async move {
            match uri.path() {
                "/ok" => (
                    StatusCode::OK,
                    [(header::LAST_MODIFIED, "Wed, 21 Oct 2015 07:28:00 GMT")],
                    "ok",
                )
                    .into_response(),
                "/moved" => (StatusCode::FOUND, [(header::LOCATION, "/ok")]).into_response(),
                _ => StatusCode::NOT_FOUND.into_response(),
            }
        })
    }

    #[tokio::test]
    async fn test_validate_mixed_sources() {
        let base = spawn_server(probe_app()).await;
        let dead = dead_base().await;
        let urls = vec![format!("{}/ok", base), format!("{}/page", dead)];

        let results = validator().validate(&urls).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].accessible);
        assert_eq!(results[0].status_code, Some(200));
        assert_eq!(
            results[0].last_modified.as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
        assert!(!results[1].accessible);
        assert!(results[1].status_code.is_none());

        let c = confidence(&results);
        assert!(c > 0.0 && c < 100.0);
        assert_eq!(suggestions(&results).len(), 1);
    }

    #[tokio::test]
    async fn test_redirects_are_followed_and_404_is_inaccessible() {
        let base = spawn_server(probe_app()).await;
        let v = validator();
        let moved = v.validate_one(&format!("{}/moved", base)).await;
        assert!(moved.accessible);
        let missing = v.validate_one(&format!("{}/missing", base)).await;
        assert!(!missing.accessible);
        assert_eq!(missing.error.as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn test_render_orders_accessible_first() {
        let validations = vec![
            ValidationResult::unreachable("https://b.example/x", "refused"),
            ValidationResult::assumed_accessible("https://z.example/y"),
            ValidationResult::assumed_accessible("https://a.example/y"),
        ];
        let summary = EnhancedSummary::new("seat memory", "body text".to_string(), validations, 1);
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let report = summary.render(now);

        assert!(report.starts_with("# Enhanced vHAL Summary: 'seat memory'"));
        assert!(report.contains("**Confidence Score:** 66.7% (2/3 sources validated)"));
        let a = report.find("✅ **https://a.example/y**").unwrap();
        let z = report.find("✅ **https://z.example/y**").unwrap();
        let b = report.find("❌ **https://b.example/x**").unwrap();
        assert!(a < z && z < b);
        assert!(report.contains("   Status: Failed"));
        assert!(report.contains("- Search for alternative documentation for: x"));
        assert!(report.contains("*Validation performed at: 2026-01-02 03:04:05 UTC*"));
        assert!(report.ends_with("*Total sources checked: 3 | Accessible: 2 | Cached: 1*"));
    }
}
