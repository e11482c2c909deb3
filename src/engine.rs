//! The assembled lookup engine.
//!
//! One [`Engine`] owns every long-lived component: the search index over
//! the catalog, the pooled fetcher with its cache, the documentation
//! source, and the validator. The CLI, the tool registry, and the HTTP
//! server all drive the same engine.
//!
//! ```text
//!            ┌────────────── Engine ───────────────┐
//! search ───▶│ SearchIndex ◀── RecordCatalog        │
//! lookup ───▶│   + ResourceLocator locations        │
//! locate ───▶│ ResourceLocator                      │
//! analyze ──▶│ Fetcher ──▶ ContentCache             │
//! summarize ▶│ DocsSource ──▶ Fetcher ──▶ summarize │
//!            │   └─▶ SourceValidator (optional)     │
//!            └──────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use vhal_lookup_core::catalog::RecordCatalog;
use vhal_lookup_core::index::SearchIndex;
use vhal_lookup_core::models::Record;
use vhal_lookup_core::summarize::{summarize, SummaryParams};
use vhal_lookup_core::validation::ValidationResult;

use crate::analyze::{analyze, ImplementationAnalysis};
use crate::cache::ContentCache;
use crate::config::Config;
use crate::docs::DocsSource;
use crate::fetch::Fetcher;
use crate::lookup::render_lookup;
use crate::validate::{EnhancedSummary, SourceValidator};

pub const NO_DOCUMENTATION: &str =
    "Unable to fetch vHAL documentation. Please check your internet connection or try again later.";

/// Candidate URLs for one resource key.
#[derive(Debug, Clone, Serialize)]
pub struct LocateResult {
    pub key: String,
    pub version: String,
    pub urls: Vec<String>,
}

#[derive(Debug)]
pub struct Engine {
    index: SearchIndex,
    fetcher: Fetcher,
    docs: DocsSource,
    validator: SourceValidator,
    summary: SummaryParams,
}

impl Engine {
    /// Build every component from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.catalog.path {
            Some(path) => RecordCatalog::load(path)?,
            None => RecordCatalog::builtin(),
        };
        let locator = config
            .sources
            .locator()
            .context("Invalid [sources] configuration")?;
        let cache = Arc::new(ContentCache::new(Duration::from_secs(config.cache.ttl_secs)));
        let fetcher = Fetcher::new(&config.http, locator, cache)?;
        let docs = DocsSource::new(
            fetcher.clone(),
            config.sources.docs_base.as_str(),
            config.sources.max_pages,
        );
        let validator = SourceValidator::new(&fetcher);

        Ok(Self {
            index: SearchIndex::new(Arc::new(catalog)),
            fetcher,
            docs,
            validator,
            summary: config.summary.params(),
        })
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn docs(&self) -> &DocsSource {
        &self.docs
    }

    /// Catalog records matching `keyword`, most relevant first.
    pub fn search(&self, keyword: &str) -> Vec<Record> {
        self.index.search(keyword).into_iter().cloned().collect()
    }

    pub fn lookup(&self, keyword: &str) -> String {
        render_lookup(keyword, &self.index, self.fetcher.locator())
    }

    pub fn locate(&self, key: &str, version: Option<&str>) -> LocateResult {
        let locator = self.fetcher.locator();
        LocateResult {
            key: key.to_string(),
            version: locator.resolve_version(version).to_string(),
            urls: locator.locate(key, version),
        }
    }

    pub async fn analyze(&self, property: &str, version: Option<&str>) -> ImplementationAnalysis {
        analyze(&self.fetcher, &self.index, property, version).await
    }

    /// Summarize every discovered documentation page for `question`.
    pub async fn summarize(&self, question: &str) -> String {
        let pages = self.docs.discover_pages().await;
        let texts = self.docs.fetch_pages(&pages).await;
        if texts.is_empty() {
            return NO_DOCUMENTATION.to_string();
        }
        summarize(question, &texts, &self.summary)
    }

    /// Summarize the first `max_sources` pages and annotate the result with
    /// source validation. With `validate` off, every source is assumed reachable.
    pub async fn summarize_validated(
        &self,
        question: &str,
        validate: bool,
        max_sources: usize,
    ) -> String {
        let cache = self.fetcher.cache();
        // Discovery may seed the landing page, so note its state first.
        let landing_was_fresh = cache.is_fresh(self.docs.base());
        let pages = self.docs.discover_pages().await;
        let sources: Vec<String> = pages.into_iter().take(max_sources).collect();

        let cached = sources
            .iter()
            .filter(|u| {
                if u.as_str() == self.docs.base() {
                    landing_was_fresh
                } else {
                    cache.is_fresh(u)
                }
            })
            .count();

        let texts = self.docs.fetch_pages(&sources).await;
        if texts.is_empty() {
            return NO_DOCUMENTATION.to_string();
        }
        let summary = summarize(question, &texts, &self.summary);

        let validations = if validate {
            self.validator.validate(&sources).await
        } else {
            sources
                .iter()
                .map(|u| ValidationResult::assumed_accessible(u.as_str()))
                .collect()
        };

        EnhancedSummary::new(question, summary, validations, cached).render(Utc::now())
    }
}
