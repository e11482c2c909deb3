//! Implementation analysis for a single vHAL property.
//!
//! Fetches the AOSP files that define and configure vehicle properties,
//! then reports where the property appears, which configuration markers
//! the default implementation uses, and what it depends on.
//!
//! | Priority     | Keys                                                           |
//! |--------------|----------------------------------------------------------------|
//! | essential    | `vehicle_property_aidl`, `default_hal_impl`                    |
//! | supplementary| `vehicle_area_aidl`, `hal_interface`, `emulator_hal`, `emulator_config` |
//!
//! Essential files are fetched as their own batch before the supplementary
//! batch starts, so a slow emulator host never delays the definitions.

use serde::Serialize;
use std::collections::BTreeSet;
use vhal_lookup_core::index::SearchIndex;
use vhal_lookup_core::locator::{code_search_url, ResourceKey};

use crate::fetch::Fetcher;
use crate::models::FetchedResource;

pub const ESSENTIAL_KEYS: [ResourceKey; 2] =
    [ResourceKey::VehiclePropertyAidl, ResourceKey::DefaultHalImpl];

pub const SUPPLEMENTARY_KEYS: [ResourceKey; 4] = [
    ResourceKey::VehicleAreaAidl,
    ResourceKey::HalInterface,
    ResourceKey::EmulatorHal,
    ResourceKey::EmulatorConfig,
];

const CONFIG_MARKERS: &[&str] = &[
    "VehicleAreaConfig",
    "configArray",
    "VehiclePropertyAccess",
    "VehiclePropertyChangeMode",
];

const CONTEXT_LINES: usize = 3;
const PREVIEW_LINES: usize = 30;

const BASE_RELATED_FILES: &[&str] = &[
    "VehicleProperty.aidl - Property ID definitions",
    "VehicleArea.aidl - Area type definitions",
    "VehiclePropertyType.aidl - Data type definitions",
    "IVehicle.aidl - Main HAL interface",
    "DefaultProperties.json - Default property configurations",
];

const IMPLEMENTATION_TIPS: &[&str] = &[
    "• Study the AIDL definitions to understand data types and structure",
    "• Check DefaultProperties.json for configuration examples",
    "• Use the emulator implementation as a reference for testing",
    "• Follow the pattern established in existing properties for consistency",
    "• Pay attention to area mapping and access control requirements",
];

/// A titled finding extracted from one source file.
#[derive(Debug, Clone, Serialize)]
pub struct ImplementationDetail {
    pub title: String,
    pub body: String,
}

/// Everything learned about one property.
#[derive(Debug, Clone, Serialize)]
pub struct ImplementationAnalysis {
    pub property_name: String,
    /// Identifier from the catalog, when the property is known.
    pub property_id: Option<String>,
    pub version: String,
    pub source_files: Vec<FetchedResource>,
    pub details: Vec<ImplementationDetail>,
    pub dependencies: Vec<String>,
    pub related_files: Vec<String>,
    pub documentation_links: Vec<String>,
}

/// Analyze `property_name` against the sources for `version`.
pub async fn analyze(
    fetcher: &Fetcher,
    index: &SearchIndex,
    property_name: &str,
    version: Option<&str>,
) -> ImplementationAnalysis {
    let name = property_name.trim().to_uppercase();
    let property_id = index.by_exact_name(&name).map(|r| r.identifier.clone());
    let resolved = fetcher.locator().resolve_version(version);

    let essential: Vec<&str> = ESSENTIAL_KEYS.iter().map(|k| k.as_str()).collect();
    let supplementary: Vec<&str> = SUPPLEMENTARY_KEYS.iter().map(|k| k.as_str()).collect();

    let mut source_files = fetcher.fetch_many(&essential, Some(resolved)).await;
    source_files.extend(fetcher.fetch_many(&supplementary, Some(resolved)).await);

    let details = extract_details(&name, property_id.as_deref(), &source_files);
    let dependencies = find_dependencies(&name, &source_files);

    ImplementationAnalysis {
        related_files: related_files(&name),
        documentation_links: documentation_links(&name),
        property_name: name,
        property_id,
        version: resolved.to_string(),
        source_files,
        details,
        dependencies,
    }
}

/// Definition context and configuration markers found in each fetched file.
pub fn extract_details(
    name: &str,
    property_id: Option<&str>,
    files: &[FetchedResource],
) -> Vec<ImplementationDetail> {
    let upper_name = name.trim().to_uppercase();
    let mut details = Vec::new();
    if upper_name.is_empty() {
        return details;
    }

    for file in files.iter().filter(|f| f.is_ok()) {
        let file_name = file.file_name();
        let lines: Vec<&str> = file.raw_content.lines().collect();

        let hit = lines.iter().position(|line| {
            line.to_uppercase().contains(&upper_name) || property_id.is_some_and(|id| line.contains(id))
        });
        if let Some(i) = hit {
            let start = i.saturating_sub(CONTEXT_LINES);
            let end = (i + CONTEXT_LINES + 1).min(lines.len());
            let context = (start..end)
                .map(|j| format!("{:4}: {}", j + 1, lines[j]))
                .collect::<Vec<_>>()
                .join("\n");
            details.push(ImplementationDetail {
                title: format!("{} definition", file_name),
                body: format!(
                    "Property definition in {}:\n```{}\n{}\n```",
                    file_name, file.content_type, context
                ),
            });
        }

        let lower = file_name.to_lowercase();
        if lower.contains("config") || lower.contains("default") {
            let found: Vec<&str> = CONFIG_MARKERS
                .iter()
                .copied()
                .filter(|m| file.raw_content.contains(m))
                .collect();
            if !found.is_empty() {
                details.push(ImplementationDetail {
                    title: format!("{} config", file_name),
                    body: format!(
                        "Configuration found in {} (contains {})",
                        file_name,
                        found.join(", ")
                    ),
                });
            }
        }
    }

    details
}

/// Category-derived and content-derived dependency hints, sorted.
pub fn find_dependencies(name: &str, files: &[FetchedResource]) -> Vec<String> {
    let upper_name = name.trim().to_uppercase();
    if upper_name.is_empty() {
        return Vec::new();
    }
    let mut deps: BTreeSet<&str> = BTreeSet::new();

    if upper_name.contains("SEAT") {
        deps.extend([
            "VehicleAreaSeat",
            "VehiclePropertyAccess.READ_WRITE",
            "VehiclePropertyChangeMode.ON_CHANGE",
        ]);
    } else if upper_name.contains("HVAC") {
        deps.extend([
            "VehicleAreaSeat or VehicleAreaGlobal",
            "VehiclePropertyAccess.READ_WRITE",
            "VehiclePropertyChangeMode.ON_CHANGE",
        ]);
    }

    for file in files.iter().filter(|f| f.is_ok()) {
        if !file.raw_content.to_uppercase().contains(&upper_name) {
            continue;
        }
        if file.raw_content.contains("VehicleArea") {
            deps.insert("VehicleArea definitions");
        }
        if file.raw_content.contains("VehiclePropertyType") {
            deps.insert("VehiclePropertyType definitions");
        }
        if file.raw_content.contains("android.hardware.automotive.vehicle") {
            deps.insert("Vehicle HAL AIDL interface");
        }
    }

    deps.into_iter().map(str::to_string).collect()
}

fn related_files(name: &str) -> Vec<String> {
    let mut files: Vec<String> = BASE_RELATED_FILES.iter().map(|s| s.to_string()).collect();
    let extra: &[&str] = if name.contains("SEAT") {
        &[
            "Seat-specific configuration files",
            "Memory management implementations",
            "Position control algorithms",
        ]
    } else if name.contains("HVAC") {
        &[
            "Climate control implementations",
            "Temperature sensor integrations",
            "Fan control algorithms",
        ]
    } else {
        &[]
    };
    files.extend(extra.iter().map(|s| s.to_string()));
    files
}

fn documentation_links(name: &str) -> Vec<String> {
    vec![
        "https://source.android.com/docs/automotive/vhal - Main vHAL documentation".to_string(),
        "https://source.android.com/docs/automotive/vhal/properties - Property specifications"
            .to_string(),
        "https://source.android.com/docs/automotive/vhal/vehicle-areas - Area mapping details"
            .to_string(),
        format!("{} - Android Code Search", code_search_url(name)),
    ]
}

fn purpose_of(key: &str) -> &'static str {
    key.parse::<ResourceKey>()
        .map(|k| k.description())
        .unwrap_or("Unknown source")
}

impl ImplementationAnalysis {
    /// Human-readable report.
    pub fn render(&self) -> String {
        let mut out = vec![
            format!("vHAL Implementation Analysis for: '{}'\n", self.property_name),
            "=".repeat(80),
            format!(
                "\nProperty ID: {}",
                self.property_id.as_deref().unwrap_or("Unknown")
            ),
            format!("Android Version: {}", self.version),
        ];

        if !self.source_files.is_empty() {
            out.push("\n\nSource Files Analysis:".to_string());
            for (i, file) in self.source_files.iter().enumerate() {
                out.push(format!("\n### {}. {}", i + 1, file.file_name()));
                out.push(format!("**Purpose:** {}", purpose_of(&file.source_key)));
                out.push(format!("**Language:** {}", file.content_type));
                out.push(format!("**Lines:** {}", file.line_count));
                out.push(format!("**URL:** {}", file.display_url));

                match &file.fetch_error {
                    Some(err) => out.push(format!("\n**Error:** {}", err)),
                    None => {
                        let lines: Vec<&str> = file.raw_content.lines().collect();
                        if !lines.is_empty() {
                            out.push("\n**Source Code Preview:**".to_string());
                            out.push(format!("```{}", file.content_type));
                            for (n, line) in lines.iter().take(PREVIEW_LINES).enumerate() {
                                out.push(format!("{:4}: {}", n + 1, line));
                            }
                            if lines.len() > PREVIEW_LINES {
                                out.push("...".to_string());
                                out.push(format!(
                                    "[File continues for {} more lines]",
                                    lines.len() - PREVIEW_LINES
                                ));
                            }
                            out.push("```".to_string());
                        }
                    }
                }
                out.push(String::new());
            }
        }

        if !self.details.is_empty() {
            out.push("\n\nImplementation Details:".to_string());
            for d in &self.details {
                out.push(format!("\n### {}", d.title));
                out.push(d.body.clone());
            }
        }

        let lists: [(&str, &Vec<String>); 3] = [
            ("Dependencies", &self.dependencies),
            ("Related Implementation Files", &self.related_files),
            ("Documentation & Resources", &self.documentation_links),
        ];
        for (heading, items) in lists {
            if !items.is_empty() {
                out.push(format!("\n\n{}:", heading));
                out.extend(items.iter().map(|d| format!("• {}", d)));
            }
        }

        out.push("\n\nImplementation Tips:".to_string());
        out.extend(IMPLEMENTATION_TIPS.iter().map(|s| s.to_string()));

        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ContentCache;
    use crate::config::HttpConfig;
    use crate::test_support::spawn_server;
    use axum::http::{StatusCode, Uri};
    use axum::Router;
    use base64::Engine as _;
    use std::sync::Arc;
    use vhal_lookup_core::catalog::RecordCatalog;
    use vhal_lookup_core::locator::ResourceLocator;

    const PROPERTY_AIDL: &str = "package android.hardware.automotive.vehicle;\n\
        enum VehicleProperty {\n\
        \x20   INVALID = 0x00000000,\n\
        \x20   /** Seat memory select. */\n\
        \x20   SEAT_MEMORY_SELECT = 0x0B56 + VehiclePropertyGroup.SYSTEM + VehicleArea.SEAT + VehiclePropertyType.INT32,\n\
        \x20   SEAT_MEMORY_SET = 0x0B57,\n\
        }\n";

    const DEFAULT_JSON: &str = r#"{ "properties": [ { "property": "VehicleProperty::SEAT_MEMORY_SELECT", "configArray": [0, 3], "areas": [ { "areaId": 1 } ] } ] }"#;

    fn sources_app() -> Router {
        Router::new().fallback(|uri: Uri| async move {
            let path = uri.path().to_string();
            if path.ends_with("/VehicleProperty.aidl") {
                let body = base64::engine::general_purpose::STANDARD.encode(PROPERTY_AIDL);
                (StatusCode::OK, body)
            } else if path.ends_with("/DefaultProperties.json") {
                (StatusCode::OK, DEFAULT_JSON.to_string())
            } else {
                (StatusCode::NOT_FOUND, String::new())
            }
        })
    }

    async fn analyze_against_local(property: &str) -> ImplementationAnalysis {
        let base = spawn_server(sources_app()).await;
        let http = HttpConfig {
            max_retries: 0,
            timeout_secs: 2,
            batch_deadline_secs: 5,
            ..HttpConfig::default()
        };
        let locator = ResourceLocator::new(base.as_str(), base.as_str(), "android15").unwrap();
        let fetcher = Fetcher::new(&http, locator, Arc::new(ContentCache::default())).unwrap();
        let index = SearchIndex::new(Arc::new(RecordCatalog::builtin()));
        analyze(&fetcher, &index, property, Some("v14")).await
    }

    #[tokio::test]
    async fn test_analyze_finds_definition_and_config() {
        let analysis = analyze_against_local("seat_memory_select").await;
        assert_eq!(analysis.property_name, "SEAT_MEMORY_SELECT");
        assert_eq!(analysis.property_id.as_deref(), Some("0x0B56"));
        assert_eq!(analysis.version, "android14");

        // essential batch first, in key order
        assert_eq!(analysis.source_files.len(), 6);
        assert_eq!(analysis.source_files[0].source_key, "vehicle_property_aidl");
        assert!(analysis.source_files[0].is_ok());
        assert_eq!(analysis.source_files[1].source_key, "default_hal_impl");
        assert!(analysis.source_files[1].is_ok());
        assert!(analysis.source_files[2..].iter().all(|f| !f.is_ok()));

        let titles: Vec<&str> = analysis.details.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "VehicleProperty.aidl definition",
                "DefaultProperties.json definition",
                "DefaultProperties.json config",
            ]
        );
        assert!(analysis.details[0].body.contains("   5:     SEAT_MEMORY_SELECT = 0x0B56"));
        assert!(analysis.details[0].body.contains("   2: enum VehicleProperty {"));
        assert!(analysis.details[2].body.contains("configArray"));

        assert!(analysis.dependencies.contains(&"VehicleAreaSeat".to_string()));
        assert!(analysis.dependencies.contains(&"VehicleArea definitions".to_string()));
        assert!(analysis
            .dependencies
            .contains(&"Vehicle HAL AIDL interface".to_string()));
    }

    #[tokio::test]
    async fn test_render_includes_preview_and_errors() {
        let analysis = analyze_against_local("SEAT_MEMORY_SELECT").await;
        let report = analysis.render();
        assert!(report.starts_with("vHAL Implementation Analysis for: 'SEAT_MEMORY_SELECT'"));
        assert!(report.contains("Property ID: 0x0B56"));
        assert!(report.contains("**Source Code Preview:**"));
        assert!(report.contains("**Error:**"));
        assert!(report.contains("Implementation Tips:"));
        assert!(report.contains("SEAT_MEMORY_SELECT%20automotive%20vehicle"));
    }

    #[test]
    fn test_unknown_property_has_no_category_dependencies() {
        assert!(find_dependencies("VENDOR_THING", &[]).is_empty());
        assert_eq!(related_files("VENDOR_THING").len(), BASE_RELATED_FILES.len());
    }

    #[test]
    fn test_context_is_clamped_at_file_start() {
        let file = FetchedResource::from_payload(
            "vehicle_area_aidl",
            "https://h/VehicleArea.aidl",
            "HVAC_FAN_SPEED here\nline two\n",
        );
        let details = extract_details("HVAC_FAN_SPEED", None, &[file]);
        assert_eq!(details.len(), 1);
        assert!(details[0].body.contains("   1: HVAC_FAN_SPEED here\n   2: line two"));
    }

    #[test]
    fn test_blank_name_matches_nothing() {
        let file = FetchedResource::from_payload(
            "default_config",
            "https://h/DefaultProperties.json",
            "VehicleArea.SEAT\nVehiclePropertyType.INT32\nconfigArray\n",
        );
        let files = [file];
        assert!(extract_details("  ", None, &files).is_empty());
        assert!(find_dependencies("", &files).is_empty());
    }
}
