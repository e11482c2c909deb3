//! Result types produced by the networked layer.
//!
//! These flow from the fetcher and analyzers out to tools, the HTTP
//! server, and the CLI, and all serialize to JSON.

use serde::Serialize;
use vhal_lookup_core::locator::display_url;

use crate::extract::{decode_payload, language_for};

/// One fetched source file, or the record of why every candidate failed.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedResource {
    pub source_key: String,
    /// URL without the `?format=TEXT` marker.
    pub display_url: String,
    /// Decoded text, or the aggregate error message when `fetch_error` is set.
    pub raw_content: String,
    /// True when the body was base64 and decoded successfully.
    pub decoded: bool,
    pub content_type: String,
    pub line_count: usize,
    pub fetch_error: Option<String>,
}

impl FetchedResource {
    /// Build a resource from a successful response body.
    pub fn from_payload(source_key: &str, url: &str, body: &str) -> Self {
        let (content, decoded) = match decode_payload(body) {
            Some(text) => (text, true),
            None => (body.to_string(), false),
        };
        Self {
            source_key: source_key.to_string(),
            display_url: display_url(url),
            line_count: content.lines().count(),
            raw_content: content,
            decoded,
            content_type: language_for(url).to_string(),
            fetch_error: None,
        }
    }

    /// Build an error-flagged resource; never returned as an `Err`.
    pub fn failed(source_key: &str, url: &str, message: String) -> Self {
        Self {
            source_key: source_key.to_string(),
            display_url: display_url(url),
            raw_content: message.clone(),
            decoded: false,
            content_type: "error".to_string(),
            line_count: 0,
            fetch_error: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.fetch_error.is_none()
    }

    /// Final path segment of the display URL.
    pub fn file_name(&self) -> String {
        vhal_lookup_core::locator::file_name(&self.display_url)
    }
}
