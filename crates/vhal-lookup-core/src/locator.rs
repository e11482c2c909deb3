//! Maps logical resource keys to ordered fallback chains of remote URLs.
//!
//! A chain is tried front to back by the fetcher; earlier URLs have
//! priority. Chains depend on the requested Android version: Android 13
//! still ships the legacy HIDL layout, so its chains carry HIDL fallbacks
//! behind the AIDL locations.
//!
//! Version handling is lenient. `"Android 14"`, `"14"`, `"android14-release"`
//! and `"android14"` all resolve to the same branch; anything that does not
//! resolve to a supported version silently falls back to the configured
//! default.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::Serialize;

/// Supported version names and the branch each one maps to.
pub const SUPPORTED_VERSIONS: &[(&str, &str)] = &[
    ("android13", "android13-release"),
    ("android14", "android14-release"),
    ("android15", "android15-release"),
    ("android16", "android16-release"),
    ("main", "main"),
    ("master", "master"),
];

pub const DEFAULT_VERSION: &str = "android15";

pub const DEFAULT_HW_INTERFACES_BASE: &str =
    "https://android.googlesource.com/platform/hardware/interfaces";
pub const DEFAULT_DEVICE_CAR_BASE: &str = "https://android.googlesource.com/device/generic/car";

const CODE_SEARCH_BASE: &str = "https://cs.android.com/search?q=";
const TEXT_FORMAT_SUFFIX: &str = "?format=TEXT";

/// Logical source files the locator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    VehiclePropertyAidl,
    VehicleAreaAidl,
    VehiclePropertyTypeAidl,
    DefaultHalImpl,
    HalInterface,
    EmulatorHal,
    EmulatorConfig,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 7] = [
        ResourceKey::VehiclePropertyAidl,
        ResourceKey::VehicleAreaAidl,
        ResourceKey::VehiclePropertyTypeAidl,
        ResourceKey::DefaultHalImpl,
        ResourceKey::HalInterface,
        ResourceKey::EmulatorHal,
        ResourceKey::EmulatorConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::VehiclePropertyAidl => "vehicle_property_aidl",
            ResourceKey::VehicleAreaAidl => "vehicle_area_aidl",
            ResourceKey::VehiclePropertyTypeAidl => "vehicle_property_type_aidl",
            ResourceKey::DefaultHalImpl => "default_hal_impl",
            ResourceKey::HalInterface => "hal_interface",
            ResourceKey::EmulatorHal => "emulator_hal",
            ResourceKey::EmulatorConfig => "emulator_config",
        }
    }

    /// Human-readable purpose of the file(s) behind this key.
    pub fn description(&self) -> &'static str {
        match self {
            ResourceKey::VehiclePropertyAidl => "Main Vehicle Property AIDL definitions",
            ResourceKey::VehicleAreaAidl => "Vehicle Area definitions for property mapping",
            ResourceKey::VehiclePropertyTypeAidl => "Vehicle property data type definitions",
            ResourceKey::DefaultHalImpl => {
                "Default HAL implementation with property configurations"
            }
            ResourceKey::HalInterface => "Main vHAL interface definition",
            ResourceKey::EmulatorHal => "Emulator HAL server implementation",
            ResourceKey::EmulatorConfig => "Emulator default configuration",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ResourceKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown resource key: {}", s))
    }
}

/// A fixed, well-known source location shown in lookup reports.
#[derive(Debug, Clone, Serialize)]
pub struct SourceLocation {
    pub description: String,
    pub url: String,
}

/// Resolve a free-form version string to a supported version name.
///
/// Returns `None` when nothing supported can be extracted.
pub fn normalize_version(input: &str) -> Option<&'static str> {
    let cleaned = input.trim().to_lowercase();
    let cleaned = cleaned.trim_end_matches("-release");

    if let Some((name, _)) = SUPPORTED_VERSIONS.iter().find(|(n, _)| *n == cleaned) {
        return Some(name);
    }

    let digits = trailing_number(cleaned)?;
    let candidate = format!("android{}", digits);
    SUPPORTED_VERSIONS
        .iter()
        .find(|(n, _)| *n == candidate)
        .map(|(n, _)| *n)
}

/// Last run of ASCII digits in `s`, without leading zeros.
fn trailing_number(s: &str) -> Option<String> {
    let end = s.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = s[..end]
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    let number = s[start..end].trim_start_matches('0');
    if number.is_empty() {
        None
    } else {
        Some(number.to_string())
    }
}

fn branch_for(version: &str) -> &'static str {
    SUPPORTED_VERSIONS
        .iter()
        .find(|(n, _)| *n == version)
        .map(|(_, b)| *b)
        .unwrap_or("android15-release")
}

/// Strip the `?format=TEXT` marker used to request base64 payloads.
pub fn display_url(url: &str) -> String {
    url.replace(TEXT_FORMAT_SUFFIX, "")
}

/// Final path segment of a URL, ignoring any query string.
pub fn file_name(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}

/// Android Code Search URL for a keyword.
pub fn code_search_url(keyword: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(keyword.trim().as_bytes()).collect();
    format!("{}{}%20automotive%20vehicle", CODE_SEARCH_BASE, encoded)
}

/// Produces version-specific fallback chains for each [`ResourceKey`].
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    hw_interfaces_base: String,
    device_car_base: String,
    default_version: &'static str,
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self {
            hw_interfaces_base: DEFAULT_HW_INTERFACES_BASE.to_string(),
            device_car_base: DEFAULT_DEVICE_CAR_BASE.to_string(),
            default_version: DEFAULT_VERSION,
        }
    }
}

impl ResourceLocator {
    /// Create a locator over custom repository bases.
    ///
    /// `default_version` must itself normalize to a supported version.
    pub fn new(
        hw_interfaces_base: impl Into<String>,
        device_car_base: impl Into<String>,
        default_version: &str,
    ) -> Result<Self> {
        let Some(default_version) = normalize_version(default_version) else {
            bail!(
                "unsupported default version '{}'; expected one of: {}",
                default_version,
                SUPPORTED_VERSIONS
                    .iter()
                    .map(|(n, _)| *n)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        };
        Ok(Self {
            hw_interfaces_base: hw_interfaces_base.into().trim_end_matches('/').to_string(),
            device_car_base: device_car_base.into().trim_end_matches('/').to_string(),
            default_version,
        })
    }

    pub fn default_version(&self) -> &'static str {
        self.default_version
    }

    /// Version actually used for `requested`, after normalization and fallback.
    pub fn resolve_version(&self, requested: Option<&str>) -> &'static str {
        requested
            .and_then(normalize_version)
            .unwrap_or(self.default_version)
    }

    /// Candidate URLs for `key`, highest priority first. Unknown keys yield an empty list.
    pub fn locate(&self, key: &str, version: Option<&str>) -> Vec<String> {
        match key.parse::<ResourceKey>() {
            Ok(k) => self.locate_key(k, version),
            Err(_) => Vec::new(),
        }
    }

    pub fn locate_key(&self, key: ResourceKey, version: Option<&str>) -> Vec<String> {
        let branch = branch_for(self.resolve_version(version));
        let hw = format!("{}/+/refs/heads/{}/automotive/vehicle", self.hw_interfaces_base, branch);
        let car = format!("{}/+/refs/heads/{}/emulator/vhal", self.device_car_base, branch);
        let aidl_types = format!("{}/aidl_property/android/hardware/automotive/vehicle", hw);
        let legacy = branch == "android13-release";

        let mut paths: Vec<String> = match key {
            ResourceKey::VehiclePropertyAidl => vec![format!("{}/VehicleProperty.aidl", aidl_types)],
            ResourceKey::VehicleAreaAidl => vec![format!("{}/VehicleArea.aidl", aidl_types)],
            ResourceKey::VehiclePropertyTypeAidl => {
                vec![format!("{}/VehiclePropertyType.aidl", aidl_types)]
            }
            ResourceKey::DefaultHalImpl => {
                let mut v = vec![format!(
                    "{}/aidl/impl/default_config/config/DefaultProperties.json",
                    hw
                )];
                if legacy {
                    v.push(format!("{}/2.0/default/impl/vhal_v2_0/DefaultConfig.h", hw));
                } else {
                    v.push(format!("{}/aidl/impl/vhal/src/DefaultVehicleHal.cpp", hw));
                    v.push(format!("{}/aidl/impl/fake_impl/userhal/src/FakeUserHal.cpp", hw));
                }
                v
            }
            ResourceKey::HalInterface => {
                let mut v = vec![format!(
                    "{}/aidl/android/hardware/automotive/vehicle/IVehicle.aidl",
                    hw
                )];
                if legacy {
                    v.push(format!("{}/2.0/IVehicle.hal", hw));
                }
                v
            }
            ResourceKey::EmulatorHal => vec![
                format!("{}/VehicleHalServer.cpp", car),
                format!("{}/VehicleEmulator.cpp", car),
            ],
            ResourceKey::EmulatorConfig => vec![format!("{}/DefaultConfig.h", car)],
        };

        if legacy
            && matches!(
                key,
                ResourceKey::VehiclePropertyAidl
                    | ResourceKey::VehicleAreaAidl
                    | ResourceKey::VehiclePropertyTypeAidl
            )
        {
            paths.push(format!("{}/2.0/types.hal", hw));
        }

        paths
            .into_iter()
            .map(|p| format!("{}{}", p, TEXT_FORMAT_SUFFIX))
            .collect()
    }

    /// Well-known locations listed in every lookup report.
    pub fn source_locations(&self) -> Vec<SourceLocation> {
        let branch = branch_for(self.default_version);
        vec![
            SourceLocation {
                description: "Vehicle Property AIDL Definition".to_string(),
                url: display_url(&self.locate_key(ResourceKey::VehiclePropertyAidl, None)[0]),
            },
            SourceLocation {
                description: "HAL Implementation Directory".to_string(),
                url: format!(
                    "{}/+/refs/heads/{}/automotive/vehicle/",
                    self.hw_interfaces_base, branch
                ),
            },
            SourceLocation {
                description: "Reference Implementation".to_string(),
                url: format!("{}/+/refs/heads/{}/emulator/", self.device_car_base, branch),
            },
        ]
    }
}
