//! Source lookup report: catalog matches plus where to read the code.

use vhal_lookup_core::index::SearchIndex;
use vhal_lookup_core::locator::{code_search_url, ResourceLocator};
use vhal_lookup_core::models::{Category, Record};

const SEAT_NOTES: &[&str] = &[
    "- Area Type: VehicleAreaSeat (typically 0x05000000 base)",
    "- Data Type: Usually INT32 for positions, BOOLEAN for states",
    "- Access: Most seat properties are READ_WRITE",
    "- Change Mode: ON_CHANGE for most properties",
];

/// Matches for `keyword` grouped by category, in order of first appearance.
pub fn group_by_category<'a>(records: &[&'a Record]) -> Vec<(Category, Vec<&'a Record>)> {
    let mut groups: Vec<(Category, Vec<&'a Record>)> = Vec::new();
    for &record in records {
        match groups.iter_mut().find(|(c, _)| *c == record.category) {
            Some((_, members)) => members.push(record),
            None => groups.push((record.category, vec![record])),
        }
    }
    groups
}

/// Render the lookup report for `keyword`.
pub fn render_lookup(keyword: &str, index: &SearchIndex, locator: &ResourceLocator) -> String {
    let keyword = keyword.trim();
    let matches = index.search(keyword);

    let mut out = vec![
        format!("Android Source Code Lookup for: '{}'\n", keyword),
        "=".repeat(50),
    ];

    if matches.is_empty() {
        out.push("\nNo matching vehicle properties in the catalog.".to_string());
    } else {
        out.push("\n## Vehicle Property Definitions:".to_string());
        for (category, records) in group_by_category(&matches) {
            out.push(format!("\n### {} Properties:", category));
            for r in records {
                out.push(format!("  - {}: {}", r.name, r.identifier));
            }
        }
    }

    out.push("\n## Source Code Locations:".to_string());
    for location in locator.source_locations() {
        out.push(format!("\n### {}:", location.description));
        out.push(format!("URL: {}", location.url));
    }

    out.push("\n## Search URL:".to_string());
    out.push(format!("Android Code Search: {}", code_search_url(keyword)));

    if matches.iter().any(|r| r.name.starts_with("SEAT_")) {
        out.push("\n## Seat Property Usage:".to_string());
        out.extend(SEAT_NOTES.iter().map(|s| s.to_string()));
    }

    out.join("\n")
}
