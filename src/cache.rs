//! In-memory content cache with time-to-live.
//!
//! Entries older than the TTL are shadowed, not removed: [`ContentCache::get`]
//! reports a miss and the next [`ContentCache::put`] for the same URL
//! overwrites the stale value. The map only grows for the lifetime of the
//! process.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    stored_at: Instant,
}

/// URL-keyed cache shared by every fetch path.
#[derive(Debug)]
pub struct ContentCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Content stored for `url`, or `None` when absent or expired.
    pub fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(url)?;
        if entry.stored_at.elapsed() < self.ttl {
            tracing::debug!(url, "cache hit");
            Some(entry.content.clone())
        } else {
            tracing::debug!(url, "cache entry expired");
            None
        }
    }

    /// Store `content` for `url`. Last writer wins.
    pub fn put(&self, url: &str, content: impl Into<String>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            url.to_string(),
            CacheEntry {
                content: content.into(),
                stored_at: Instant::now(),
            },
        );
    }

    pub fn is_fresh(&self, url: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(url)
            .map(|e| e.stored_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}
