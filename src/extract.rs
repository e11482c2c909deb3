//! Payload decoding and HTML text extraction.
//!
//! Source files come back from the repository host as base64 text
//! (`?format=TEXT`); documentation pages come back as HTML. This module
//! turns both into plain UTF-8 text suitable for scoring.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;
use vhal_lookup_core::summarize::truncate_chars;

/// Elements whose text never reaches the output.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "iframe", "noscript", "meta", "link",
    "svg", "head",
];

/// Content roots tried in order before falling back to `<body>`.
const CONTENT_ROOTS: &[&str] = &["main", "article", "body"];

/// Decode a base64 payload into UTF-8 text.
///
/// Whitespace (line wrapping) is ignored. Returns `None` when the payload is
/// not valid base64 or does not decode to UTF-8, in which case callers treat
/// the body as already-text.
pub fn decode_payload(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let bytes = STANDARD.decode(compact.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Source language label derived from the URL's file extension.
pub fn language_for(url: &str) -> &'static str {
    let path = url.split('?').next().unwrap_or(url).to_lowercase();
    if path.ends_with(".cpp") || path.ends_with(".cc") || path.ends_with(".h") {
        "cpp"
    } else if path.ends_with(".aidl") {
        "aidl"
    } else if path.ends_with(".json") {
        "json"
    } else {
        "text"
    }
}

/// Visible text of an HTML page, whitespace-collapsed and capped at `max_chars`.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let root = CONTENT_ROOTS
        .iter()
        .filter_map(|tag| Selector::parse(tag).ok())
        .find_map(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    collect_text(root, &mut parts);

    let joined = parts.join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, parts);
                }
            }
            _ => {}
        }
    }
}

/// One `<a href>` from a page: the attribute as written and its resolved URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub url: String,
}

/// Every `<a href>` in `html`, resolved against `base_url`.
///
/// Fragments are dropped from the resolved URL; duplicates are kept in document order.
pub fn extract_links(html: &str, base_url: &str) -> Vec<Link> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let href = href.trim();
            let mut url = base.join(href).ok()?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return None;
            }
            url.set_fragment(None);
            Some(Link {
                href: href.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}
