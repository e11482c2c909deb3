//! Core data models shared by the catalog, index, and report layers.
//!
//! A [`Record`] is one named vehicle property with its identifier and
//! [`Category`]. Records are immutable once loaded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Property group a record belongs to.
///
/// The symbolic name (e.g. `"SEAT"`) is what category-tier search
/// matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Seat,
    Hvac,
    Lights,
    Power,
    Body,
    Cabin,
    Climate,
    Display,
    Engine,
    Info,
    InstrumentCluster,
    Mirror,
    VehicleMapService,
    Window,
    Vendor,
    General,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 16] = [
        Category::Seat,
        Category::Hvac,
        Category::Lights,
        Category::Power,
        Category::Body,
        Category::Cabin,
        Category::Climate,
        Category::Display,
        Category::Engine,
        Category::Info,
        Category::InstrumentCluster,
        Category::Mirror,
        Category::VehicleMapService,
        Category::Window,
        Category::Vendor,
        Category::General,
    ];

    /// Uppercase symbolic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Seat => "SEAT",
            Category::Hvac => "HVAC",
            Category::Lights => "LIGHTS",
            Category::Power => "POWER",
            Category::Body => "BODY",
            Category::Cabin => "CABIN",
            Category::Climate => "CLIMATE",
            Category::Display => "DISPLAY",
            Category::Engine => "ENGINE",
            Category::Info => "INFO",
            Category::InstrumentCluster => "INSTRUMENT_CLUSTER",
            Category::Mirror => "MIRROR",
            Category::VehicleMapService => "VEHICLE_MAP_SERVICE",
            Category::Window => "WINDOW",
            Category::Vendor => "VENDOR",
            Category::General => "GENERAL",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// A named entry in the property catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Property name, e.g. `"SEAT_MEMORY_SELECT"`.
    pub name: String,
    /// Property identifier, e.g. `"0x0B56"`.
    pub identifier: String,
    pub category: Category,
}

impl Record {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_name() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("hvac".parse::<Category>().unwrap(), Category::Hvac);
        assert_eq!(
            " instrument_cluster ".parse::<Category>().unwrap(),
            Category::InstrumentCluster
        );
        assert!("SEATS".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_uses_symbolic_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            category: Category,
        }
        let w: Wrapper = toml::from_str("category = \"VEHICLE_MAP_SERVICE\"").unwrap();
        assert_eq!(w.category, Category::VehicleMapService);
    }
}
