//! Immutable, categorized property catalog.
//!
//! The catalog is seed data: a fixed list of [`Record`]s grouped by
//! [`Category`]. It is built once (from the built-in tables or a TOML file)
//! and shared by reference with the search index; nothing mutates it
//! afterwards.
//!
//! # TOML format
//!
//! ```toml
//! [[record]]
//! name = "SEAT_MEMORY_SELECT"
//! identifier = "0x0B56"
//! category = "SEAT"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::models::{Category, Record};

const SEAT_PROPERTIES: &[(&str, &str)] = &[
    ("SEAT_MEMORY_SELECT", "0x0B56"),
    ("SEAT_MEMORY_SET", "0x0B57"),
    ("SEAT_BELT_BUCKLED", "0x0B58"),
    ("SEAT_BELT_HEIGHT_POS", "0x0B59"),
    ("SEAT_BELT_HEIGHT_MOVE", "0x0B5A"),
    ("SEAT_FORE_AFT_POS", "0x0B5B"),
    ("SEAT_FORE_AFT_MOVE", "0x0B5C"),
    ("SEAT_BACKREST_ANGLE_1_POS", "0x0B5D"),
    ("SEAT_BACKREST_ANGLE_1_MOVE", "0x0B5E"),
    ("SEAT_BACKREST_ANGLE_2_POS", "0x0B5F"),
    ("SEAT_BACKREST_ANGLE_2_MOVE", "0x0B60"),
    ("SEAT_HEIGHT_POS", "0x0B61"),
    ("SEAT_HEIGHT_MOVE", "0x0B62"),
    ("SEAT_DEPTH_POS", "0x0B63"),
    ("SEAT_DEPTH_MOVE", "0x0B64"),
    ("SEAT_TILT_POS", "0x0B65"),
    ("SEAT_TILT_MOVE", "0x0B66"),
    ("SEAT_LUMBAR_FORE_AFT_POS", "0x0B67"),
    ("SEAT_LUMBAR_FORE_AFT_MOVE", "0x0B68"),
    ("SEAT_LUMBAR_SIDE_SUPPORT_POS", "0x0B69"),
    ("SEAT_LUMBAR_SIDE_SUPPORT_MOVE", "0x0B6A"),
    ("SEAT_HEADREST_HEIGHT_POS", "0x0B6B"),
    ("SEAT_HEADREST_HEIGHT_MOVE", "0x0B6C"),
    ("SEAT_HEADREST_ANGLE_POS", "0x0B6D"),
    ("SEAT_HEADREST_ANGLE_MOVE", "0x0B6E"),
    ("SEAT_HEADREST_FORE_AFT_POS", "0x0B6F"),
    ("SEAT_HEADREST_FORE_AFT_MOVE", "0x0B70"),
];

const HVAC_PROPERTIES: &[(&str, &str)] = &[
    ("HVAC_FAN_SPEED", "0x0A01"),
    ("HVAC_FAN_DIRECTION", "0x0A02"),
    ("HVAC_TEMPERATURE_CURRENT", "0x0A03"),
    ("HVAC_TEMPERATURE_SET", "0x0A04"),
    ("HVAC_DEFROSTER", "0x0A05"),
    ("HVAC_AC_ON", "0x0A06"),
    ("HVAC_MAX_AC_ON", "0x0A07"),
    ("HVAC_MAX_DEFROST_ON", "0x0A08"),
    ("HVAC_RECIRC_ON", "0x0A09"),
    ("HVAC_DUAL_ON", "0x0A0A"),
    ("HVAC_AUTO_ON", "0x0A0B"),
    ("HVAC_SEAT_TEMPERATURE", "0x0A0C"),
    ("HVAC_SIDE_MIRROR_HEAT", "0x0A0D"),
    ("HVAC_STEERING_WHEEL_HEAT", "0x0A0E"),
    ("HVAC_TEMPERATURE_DISPLAY_UNITS", "0x0A0F"),
    ("HVAC_ACTUAL_FAN_SPEED_RPM", "0x0A10"),
    ("HVAC_POWER_ON", "0x0A11"),
    ("HVAC_FAN_DIRECTION_AVAILABLE", "0x0A12"),
    ("HVAC_AUTO_RECIRC_ON", "0x0A13"),
    ("HVAC_SEAT_VENTILATION", "0x0A14"),
];

/// An immutable set of property records.
#[derive(Debug, Clone)]
pub struct RecordCatalog {
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    record: Vec<Record>,
}

impl RecordCatalog {
    /// Build a catalog from records, rejecting duplicate names within a category.
    pub fn new(records: Vec<Record>) -> Result<Self> {
        let mut seen: HashSet<(Category, &str)> = HashSet::new();
        for r in &records {
            if r.name.trim().is_empty() {
                bail!("catalog record with empty name (identifier {})", r.identifier);
            }
            if !seen.insert((r.category, r.name.as_str())) {
                bail!("duplicate record {} in category {}", r.name, r.category);
            }
        }
        Ok(Self { records })
    }

    /// The built-in SEAT and HVAC property tables.
    pub fn builtin() -> Self {
        let records = SEAT_PROPERTIES
            .iter()
            .map(|(n, id)| Record::new(*n, *id, Category::Seat))
            .chain(
                HVAC_PROPERTIES
                    .iter()
                    .map(|(n, id)| Record::new(*n, *id, Category::Hvac)),
            )
            .collect();
        Self { records }
    }

    /// Parse a catalog from TOML `[[record]]` tables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).with_context(|| "Failed to parse catalog file")?;
        Self::new(file.record)
    }

    /// Load a catalog from a TOML file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Categories that have at least one record, in first-seen order.
    pub fn categories(&self) -> Vec<Category> {
        let mut out: Vec<Category> = Vec::new();
        for r in &self.records {
            if !out.contains(&r.category) {
                out.push(r.category);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for RecordCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_seat_and_hvac() {
        let catalog = RecordCatalog::builtin();
        assert_eq!(catalog.len(), SEAT_PROPERTIES.len() + HVAC_PROPERTIES.len());
        assert_eq!(catalog.categories(), vec![Category::Seat, Category::Hvac]);
    }

    #[test]
    fn test_builtin_passes_validation() {
        let catalog = RecordCatalog::builtin();
        assert!(RecordCatalog::new(catalog.records().to_vec()).is_ok());
    }

    #[test]
    fn test_duplicate_in_same_category_rejected() {
        let err = RecordCatalog::new(vec![
            Record::new("ALPHA_ONE", "0x01", Category::Vendor),
            Record::new("ALPHA_ONE", "0x02", Category::Vendor),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_from_toml() {
        let catalog = RecordCatalog::from_toml_str(
            r#"
[[record]]
name = "ALPHA_ONE"
identifier = "0x01"
category = "VENDOR"

[[record]]
name = "ALPHA_TWO"
identifier = "0x02"
category = "VENDOR"
"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[1].identifier, "0x02");
    }

    #[test]
    fn test_from_toml_rejects_unknown_category() {
        let result = RecordCatalog::from_toml_str(
            "[[record]]\nname = \"X\"\nidentifier = \"0x1\"\ncategory = \"SPACESHIP\"\n",
        );
        assert!(result.is_err());
    }
}
