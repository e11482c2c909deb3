//! Keyword scoring and length-bounded summary assembly.
//!
//! ```text
//! query ──► extract_keywords ──► score each document ──► sort desc
//!                                                          │
//!            header + top N sections (≤ section_limit) ◄───┘
//!                          │
//!                 stop before the budget is exceeded,
//!                 append truncation marker
//! ```
//!
//! Lengths are measured in characters, not bytes. The returned string is
//! never longer than [`SummaryParams::summary_limit`].

use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "what", "how", "are", "is", "the", "a", "an", "and", "or", "but", "in", "on", "at", "to",
    "for", "of", "with", "by", "do", "does",
];

const MIN_KEYWORD_LEN: usize = 3;
const LONG_KEYWORD_LEN: usize = 4;
const TRUNCATION_MARKER: &str = "\n\n[Summary truncated for length]";

/// Limits applied while assembling a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryParams {
    /// Number of top-scoring sections included.
    pub max_sections: usize,
    /// Each section is cut to this many characters.
    pub section_limit: usize,
    /// Hard cap on the whole summary.
    pub summary_limit: usize,
    /// Documents shorter than this (after trimming) are never scored.
    pub min_section_len: usize,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            max_sections: 3,
            section_limit: 2000,
            summary_limit: 4000,
            min_section_len: 50,
        }
    }
}

/// Lowercase word tokens of at least three characters, minus stopwords.
///
/// Duplicates are dropped; first occurrence order is kept.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let mut seen = HashSet::new();
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= MIN_KEYWORD_LEN)
        .filter(|t| !STOPWORDS.contains(t))
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

/// Σ occurrences × weight, where tokens longer than four characters weigh 2.
pub fn score(document: &str, keywords: &[String]) -> usize {
    let lower = document.to_lowercase();
    keywords
        .iter()
        .map(|kw| {
            let weight = if kw.chars().count() > LONG_KEYWORD_LEN { 2 } else { 1 };
            lower.matches(kw.as_str()).count() * weight
        })
        .sum()
}

/// Build a relevance-ordered summary of `documents` for `query`.
pub fn summarize<S: AsRef<str>>(query: &str, documents: &[S], params: &SummaryParams) -> String {
    let query = query.trim();
    let non_blank: Vec<&str> = documents
        .iter()
        .map(|d| d.as_ref())
        .filter(|d| !d.trim().is_empty())
        .collect();

    if non_blank.is_empty() {
        return truncate_chars(
            &format!("No documentation content available for: '{}'", query),
            params.summary_limit,
        );
    }

    let keywords = extract_keywords(query);
    let mut scored: Vec<(usize, &str)> = non_blank
        .iter()
        .filter(|d| d.trim().chars().count() >= params.min_section_len)
        .map(|d| (score(d, &keywords), *d))
        .filter(|(s, _)| *s > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    if scored.is_empty() {
        let longest = non_blank
            .iter()
            .copied()
            .max_by_key(|d| d.chars().count())
            .unwrap_or_default();
        let fallback = format!(
            "No specific information found for '{}'. General vHAL overview:\n\n{}...",
            query,
            truncate_chars(longest.trim(), params.section_limit)
        );
        return truncate_chars(&fallback, params.summary_limit);
    }

    let separator = format!("\n{}\n", "=".repeat(50));
    let mut out = truncate_chars(&format!("vHAL Summary for: '{}'\n", query), params.summary_limit);
    let mut used = out.chars().count();
    let marker_len = TRUNCATION_MARKER.chars().count();

    for (i, (_, section)) in scored.iter().take(params.max_sections).enumerate() {
        let piece = format!("\n{}{}", truncate_chars(section.trim(), params.section_limit), separator);
        let piece_len = piece.chars().count();
        if used + piece_len > params.summary_limit {
            if used + marker_len <= params.summary_limit {
                out.push_str(TRUNCATION_MARKER);
            }
            break;
        }
        out.push_str(&piece);
        used += piece_len;

        // More sections were available but the cap on section count stopped us.
        let last = i + 1 == params.max_sections.min(scored.len());
        if last && scored.len() > params.max_sections && used + marker_len <= params.summary_limit {
            out.push_str(TRUNCATION_MARKER);
        }
    }

    out
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(words: &str, filler: usize) -> String {
        format!("{} {}", words, "lorem ipsum ".repeat(filler))
    }

    #[test]
    fn test_extract_keywords_drops_short_and_stopwords() {
        let kw = extract_keywords("How does the SEAT memory work? What is a seat?");
        assert_eq!(kw, vec!["seat", "memory", "work"]);
    }

    #[test]
    fn test_extract_keywords_keeps_underscored_names() {
        let kw = extract_keywords("HVAC_FAN_SPEED config");
        assert_eq!(kw, vec!["hvac_fan_speed", "config"]);
    }

    #[test]
    fn test_score_weights_long_tokens() {
        let kw = vec!["seat".to_string(), "memory".to_string()];
        // seat x2 (weight 1) + memory x1 (weight 2)
        assert_eq!(score("Seat memory: seat position", &kw), 4);
        assert_eq!(score("nothing relevant", &kw), 0);
    }

    #[test]
    fn test_empty_documents_gives_no_content_message() {
        let docs: Vec<String> = Vec::new();
        let out = summarize("seat memory", &docs, &SummaryParams::default());
        assert_eq!(out, "No documentation content available for: 'seat memory'");
        assert_eq!(out, summarize("seat memory", &["  ", ""], &SummaryParams::default()));
    }

    #[test]
    fn test_orders_sections_by_score() {
        let low = doc("seat once", 10);
        let high = doc("seat memory seat memory memory", 10);
        let out = summarize("seat memory", &[low.clone(), high.clone()], &SummaryParams::default());
        assert!(out.starts_with("vHAL Summary for: 'seat memory'\n"));
        let hi = out.find("seat memory seat memory").unwrap();
        let lo = out.find("seat once").unwrap();
        assert!(hi < lo);
        assert!(!out.contains("[Summary truncated"));
    }

    #[test]
    fn test_short_and_zero_score_sections_are_skipped() {
        let short = "seat memory".to_string();
        let unrelated = doc("steering column", 10);
        let relevant = doc("seat adjustment", 10);
        let out = summarize(
            "seat",
            &[short, unrelated, relevant],
            &SummaryParams::default(),
        );
        assert!(out.contains("seat adjustment"));
        assert!(!out.contains("steering column"));
        assert!(!out.contains("\nseat memory\n"));
    }

    #[test]
    fn test_fallback_uses_longest_document() {
        let a = doc("first page", 5);
        let b = doc("second page is longer", 20);
        let out = summarize("zzzunknown", &[a, b], &SummaryParams::default());
        assert!(out.starts_with("No specific information found for 'zzzunknown'."));
        assert!(out.contains("second page is longer"));
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_output_never_exceeds_budget() {
        let params = SummaryParams {
            max_sections: 3,
            section_limit: 400,
            summary_limit: 600,
            min_section_len: 10,
        };
        let docs: Vec<String> = (0..5).map(|_| doc("seat memory", 200)).collect();
        let out = summarize("seat memory", &docs, &params);
        assert!(out.chars().count() <= 600, "len = {}", out.chars().count());
        assert!(out.ends_with(TRUNCATION_MARKER));

        let tiny = SummaryParams {
            summary_limit: 10,
            ..params
        };
        assert!(summarize("seat memory", &docs, &tiny).chars().count() <= 10);
        assert!(summarize("zzz", &docs, &tiny).chars().count() <= 10);
        let empty: [&str; 0] = [];
        assert!(summarize("seat", &empty, &tiny).chars().count() <= 10);
    }

    #[test]
    fn test_section_count_cap_marks_truncation() {
        let docs: Vec<String> = (0..5).map(|i| doc(&format!("seat {}", i), 10)).collect();
        let params = SummaryParams {
            max_sections: 2,
            ..SummaryParams::default()
        };
        let out = summarize("seat", &docs, &params);
        assert_eq!(out.matches(&"=".repeat(50)).count(), 2);
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
