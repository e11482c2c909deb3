//! vHAL documentation pages: discovery and cached text fetch.
//!
//! Discovery reads the docs landing page once per process and keeps the
//! result; page text is cached per URL in the shared [`ContentCache`].
//!
//! [`ContentCache`]: crate::cache::ContentCache

use tokio::sync::OnceCell;
use url::Url;

use crate::extract::{extract_links, html_to_text};
use crate::fetch::Fetcher;
use crate::pool::bounded_join;

/// Known documentation pages, relative to the docs base.
pub const KNOWN_PAGES: &[&str] = &[
    "",
    "vhal-interface",
    "property-configuration",
    "special-properties",
    "seat-steering",
    "adas-properties",
    "reference-implementation",
    "vhal_debug",
    "native-client",
];

/// Pages returned when discovery fails.
const FALLBACK_PAGE_COUNT: usize = 6;
/// Characters of text kept per page.
pub const PAGE_CONTENT_LIMIT: usize = 5000;

/// Documentation page source bound to one docs base URL.
#[derive(Debug)]
pub struct DocsSource {
    fetcher: Fetcher,
    base: String,
    max_pages: usize,
    discovered: OnceCell<Vec<String>>,
}

impl DocsSource {
    pub fn new(fetcher: Fetcher, base: impl Into<String>, max_pages: usize) -> Self {
        Self {
            fetcher,
            base: base.into().trim_end_matches('/').to_string(),
            max_pages: max_pages.max(1),
            discovered: OnceCell::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URLs of [`KNOWN_PAGES`].
    pub fn known_pages(&self) -> Vec<String> {
        KNOWN_PAGES
            .iter()
            .map(|p| {
                if p.is_empty() {
                    self.base.clone()
                } else {
                    format!("{}/{}", self.base, p)
                }
            })
            .collect()
    }

    /// Documentation pages to read, discovered once and then reused.
    pub async fn discover_pages(&self) -> Vec<String> {
        self.discovered
            .get_or_init(|| self.discover_uncached())
            .await
            .clone()
    }

    async fn discover_uncached(&self) -> Vec<String> {
        let known = self.known_pages();
        let html = match self.fetcher.get_text(&self.base).await {
            Ok(html) => {
                let cache = self.fetcher.cache();
                if !cache.is_fresh(&self.base) {
                    cache.put(&self.base, html_to_text(&html, PAGE_CONTENT_LIMIT).as_str());
                }
                html
            }
            Err(e) => {
                tracing::warn!(base = %self.base, error = %e, "page discovery failed, using known pages");
                return known.into_iter().take(FALLBACK_PAGE_COUNT).collect();
            }
        };

        let prefix = docs_prefix(&self.base);
        let discovered = extract_links(&html, &format!("{}/", self.base))
            .into_iter()
            .filter(|link| {
                let href = link.href.to_lowercase();
                href.contains("vhal") || href.contains("vehicle")
            })
            .filter(|link| prefix.as_deref().is_some_and(|p| link.url.starts_with(p)))
            .map(|link| link.url);

        // Landing page first, then live links, then the remaining known pages.
        let mut pages: Vec<String> = Vec::new();
        let candidates = std::iter::once(self.base.clone())
            .chain(discovered.map(|l| l.trim_end_matches('/').to_string()))
            .chain(known);
        for page in candidates {
            if pages.len() >= self.max_pages {
                break;
            }
            if !pages.contains(&page) {
                pages.push(page);
            }
        }
        tracing::debug!(count = pages.len(), "discovered documentation pages");
        pages
    }

    /// Plain text of one page, cache-first. `None` when the page cannot be fetched.
    pub async fn page_text(&self, url: &str) -> Option<String> {
        let cache = self.fetcher.cache();
        if let Some(text) = cache.get(url) {
            return Some(text);
        }
        match self.fetcher.get_text(url).await {
            Ok(html) => {
                let text = html_to_text(&html, PAGE_CONTENT_LIMIT);
                cache.put(url, text.as_str());
                Some(text)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "page fetch failed");
                None
            }
        }
    }

    /// Text of every reachable, non-empty page among `urls`, in input order.
    ///
    /// Cached pages are answered immediately; the rest go through the pool.
    pub async fn fetch_pages(&self, urls: &[String]) -> Vec<String> {
        let cache = self.fetcher.cache();
        let mut texts: Vec<Option<String>> = urls.iter().map(|u| cache.get(u)).collect();

        let missing: Vec<usize> = (0..urls.len()).filter(|&i| texts[i].is_none()).collect();
        if !missing.is_empty() {
            let tasks: Vec<_> = missing
                .iter()
                .map(|&i| {
                    let fetcher = self.fetcher.clone();
                    let url = urls[i].clone();
                    async move {
                        let html = fetcher.get_text(&url).await.ok()?;
                        let text = html_to_text(&html, PAGE_CONTENT_LIMIT);
                        fetcher.cache().put(&url, text.as_str());
                        Some(text)
                    }
                })
                .collect();
            let fetched = bounded_join(
                tasks,
                self.fetcher.max_concurrent(),
                self.fetcher.batch_deadline(),
            )
            .await;
            for (i, text) in missing.into_iter().zip(fetched) {
                texts[i] = text.flatten();
            }
        }

        texts
            .into_iter()
            .flatten()
            .filter(|t| !t.trim().is_empty())
            .collect()
    }
}

/// `scheme://host[:port]/docs/automotive` for the docs base, when it parses.
fn docs_prefix(base: &str) -> Option<String> {
    let url = Url::parse(base).ok()?;
    let host = url.host_str()?;
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    Some(format!("{}://{}{}/docs/automotive", url.scheme(), host, port))
}
