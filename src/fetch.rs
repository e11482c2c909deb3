//! Resilient fetching of source files over a shared HTTP client.
//!
//! ```text
//! fetch(key, version)
//!   │
//!   ├─ ResourceLocator::locate ──► [url₁, url₂, …]   (priority order)
//!   │
//!   └─ for each url, sequentially:
//!        cache hit? ──► decode ──► FetchedResource
//!        GET with retry/backoff on 429/500/502/503/504
//!          ok  ──► cache.put ──► decode ──► FetchedResource
//!          err ──► remember error, try next url
//!
//!   all failed ──► FetchedResource { fetch_error: Some(aggregate) }
//! ```
//!
//! Independent keys go through [`Fetcher::fetch_many`], which runs them on
//! the bounded pool in [`crate::pool`] under the batch deadline. Failures
//! never surface as `Err` from `fetch`/`fetch_many`.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use vhal_lookup_core::locator::{display_url, ResourceLocator};

use crate::cache::ContentCache;
use crate::config::HttpConfig;
use crate::models::FetchedResource;
use crate::pool::bounded_join;

/// Why a single URL could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response body: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Connection-pooled fetcher over a [`ResourceLocator`] and a [`ContentCache`].
///
/// Cloning is cheap; clones share the client, locator, and cache.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    locator: Arc<ResourceLocator>,
    cache: Arc<ContentCache>,
    max_retries: u32,
    backoff: Duration,
    max_concurrent: usize,
    batch_deadline: Duration,
}

impl Fetcher {
    pub fn new(http: &HttpConfig, locator: ResourceLocator, cache: Arc<ContentCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.timeout())
            .user_agent(http.user_agent.as_str())
            .pool_max_idle_per_host(http.pool_max_idle_per_host)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            locator: Arc::new(locator),
            cache,
            max_retries: http.max_retries,
            backoff: Duration::from_millis(http.backoff_ms),
            max_concurrent: http.max_concurrent.max(1),
            batch_deadline: http.batch_deadline(),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn batch_deadline(&self) -> Duration {
        self.batch_deadline
    }

    /// GET `url` with retry and exponential backoff. Bypasses the cache.
    ///
    /// Retry strategy:
    /// - HTTP 429, 500, 502, 503, 504 → retry
    /// - network error → retry
    /// - any other non-success status → fail immediately
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                // Exponential backoff: base, 2×base, 4×base, ...
                let delay = self.backoff * (1u32 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let err = match self.client.get(parsed.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|source| FetchError::Body {
                            url: url.to_string(),
                            source,
                        });
                    }
                    let err = FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    };
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    err
                }
                Err(source) => FetchError::Request {
                    url: url.to_string(),
                    source,
                },
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(url, attempt, error = %err, "retrying");
            attempt += 1;
        }
    }

    /// Cache-first GET of the raw body of `url`; successful bodies are cached.
    pub async fn fetch_url(&self, url: &str) -> Result<String, FetchError> {
        if let Some(body) = self.cache.get(url) {
            return Ok(body);
        }
        let body = self.get_text(url).await?;
        self.cache.put(url, body.as_str());
        Ok(body)
    }

    /// Fetch the first reachable candidate for `key`.
    pub async fn fetch(&self, key: &str, version: Option<&str>) -> FetchedResource {
        let candidates = self.locator.locate(key, version);
        if candidates.is_empty() {
            return FetchedResource::failed(key, "", format!("Unknown resource key: {}", key));
        }

        let mut errors = Vec::with_capacity(candidates.len());
        for url in &candidates {
            match self.fetch_url(url).await {
                Ok(body) => {
                    tracing::debug!(key, url = %url, "fetched");
                    return FetchedResource::from_payload(key, url, &body);
                }
                Err(e) => {
                    tracing::warn!(key, url = %url, error = %e, "candidate failed");
                    errors.push(format!("{}: {}", display_url(url), e));
                }
            }
        }

        FetchedResource::failed(
            key,
            &candidates[0],
            format!(
                "Failed to fetch {} from {} candidate(s):\n{}",
                key,
                candidates.len(),
                errors.join("\n")
            ),
        )
    }

    /// Fetch independent keys on the bounded pool.
    ///
    /// Results keep the order of `keys`; keys still in flight at the batch
    /// deadline are omitted.
    pub async fn fetch_many(&self, keys: &[&str], version: Option<&str>) -> Vec<FetchedResource> {
        let tasks: Vec<_> = keys
            .iter()
            .map(|key| {
                let fetcher = self.clone();
                let key = key.to_string();
                let version = version.map(str::to_string);
                async move { fetcher.fetch(&key, version.as_deref()).await }
            })
            .collect();

        let results: Vec<FetchedResource> =
            bounded_join(tasks, self.max_concurrent, self.batch_deadline)
                .await
                .into_iter()
                .flatten()
                .collect();

        tracing::info!(
            requested = keys.len(),
            completed = results.len(),
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            "batch fetch finished"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dead_base, spawn_server};
    use axum::http::{StatusCode as AxumStatus, Uri};
    use axum::Router;
    use base64::Engine as _;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_http() -> HttpConfig {
        HttpConfig {
            timeout_secs: 2,
            backoff_ms: 5,
            batch_deadline_secs: 5,
            ..HttpConfig::default()
        }
    }

    fn fetcher_for(base: &str, http: &HttpConfig) -> Fetcher {
        let locator = ResourceLocator::new(base, base, "android15").unwrap();
        Fetcher::new(http, locator, Arc::new(ContentCache::default())).unwrap()
    }

    /// Primary AIDL always 503; the HIDL fallback answers with base64.
    fn flaky_app(primary_hits: Arc<AtomicUsize>, fallback_hits: Arc<AtomicUsize>) -> Router {
        Router::new().fallback(move |uri: Uri| {
            let primary_hits = Arc::clone(&primary_hits);
            let fallback_hits = Arc::clone(&fallback_hits);
            async move {
                let path = uri.path().to_string();
                if path.ends_with("VehicleProperty.aidl") {
                    primary_hits.fetch_add(1, Ordering::SeqCst);
                    (AxumStatus::SERVICE_UNAVAILABLE, "busy".to_string())
                } else if path.ends_with("types.hal") {
                    fallback_hits.fetch_add(1, Ordering::SeqCst);
                    let body = base64::engine::general_purpose::STANDARD
                        .encode("enum VehicleProperty {\n    SEAT_MEMORY_SELECT = 0x0B56,\n}\n");
                    (AxumStatus::OK, body)
                } else if path.ends_with("VehicleArea.aidl") {
                    (AxumStatus::OK, "plain area text".to_string())
                } else {
                    (AxumStatus::NOT_FOUND, "missing".to_string())
                }
            }
        })
    }

    #[tokio::test]
    async fn test_falls_back_to_second_candidate_after_retries() {
        let primary = Arc::new(AtomicUsize::new(0));
        let fallback = Arc::new(AtomicUsize::new(0));
        let base = spawn_server(flaky_app(Arc::clone(&primary), Arc::clone(&fallback))).await;
        let http = HttpConfig {
            max_retries: 1,
            ..fast_http()
        };
        let fetcher = fetcher_for(&base, &http);

        let r = fetcher.fetch("vehicle_property_aidl", Some("android13")).await;
        assert!(r.is_ok(), "{:?}", r.fetch_error);
        assert!(r.decoded);
        assert!(r.raw_content.contains("SEAT_MEMORY_SELECT = 0x0B56"));
        assert!(r.display_url.ends_with("/2.0/types.hal"));
        assert_eq!(r.line_count, 3);
        // one attempt plus one retry
        assert_eq!(primary.load(Ordering::SeqCst), 2);
        assert_eq!(fallback.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let primary = Arc::new(AtomicUsize::new(0));
        let fallback = Arc::new(AtomicUsize::new(0));
        let base = spawn_server(flaky_app(Arc::clone(&primary), Arc::clone(&fallback))).await;
        let fetcher = fetcher_for(&base, &fast_http());

        let first = fetcher.fetch("vehicle_property_aidl", Some("13")).await;
        let second = fetcher.fetch("vehicle_property_aidl", Some("13")).await;
        assert_eq!(first.raw_content, second.raw_content);
        assert_eq!(fallback.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().fallback(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (AxumStatus::NOT_FOUND, "nope")
            }
        });
        let base = spawn_server(app).await;
        let fetcher = fetcher_for(&base, &fast_http());

        let err = fetcher.get_text(&format!("{}/x", base)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_candidates_unreachable_sets_fetch_error() {
        let base = dead_base().await;
        let http = HttpConfig {
            max_retries: 0,
            ..fast_http()
        };
        let fetcher = fetcher_for(&base, &http);

        let r = fetcher.fetch("default_hal_impl", None).await;
        assert!(!r.is_ok());
        assert_eq!(r.content_type, "error");
        let message = r.fetch_error.unwrap();
        assert!(message.contains("3 candidate(s)"));
        assert_eq!(message.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_unknown_key_is_an_error_result() {
        let fetcher = fetcher_for("http://127.0.0.1:9", &fast_http());
        let r = fetcher.fetch("bogus", None).await;
        assert!(r.fetch_error.unwrap().contains("Unknown resource key"));
    }

    #[tokio::test]
    async fn test_invalid_scheme_rejected() {
        let fetcher = fetcher_for("http://127.0.0.1:9", &fast_http());
        let err = fetcher.get_text("ftp://example.com/x").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_fetch_many_mixes_success_and_failure() {
        let primary = Arc::new(AtomicUsize::new(0));
        let fallback = Arc::new(AtomicUsize::new(0));
        let base = spawn_server(flaky_app(primary, fallback)).await;
        let http = HttpConfig {
            max_retries: 0,
            ..fast_http()
        };
        let fetcher = fetcher_for(&base, &http);

        let results = fetcher
            .fetch_many(&["vehicle_area_aidl", "emulator_config", "nope"], None)
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].source_key, "vehicle_area_aidl");
        assert!(results[0].is_ok());
        assert!(!results[0].decoded);
        assert_eq!(results[0].raw_content, "plain area text");
        assert!(!results[1].is_ok());
        assert!(!results[2].is_ok());
    }
}
