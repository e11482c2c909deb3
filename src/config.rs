//! TOML configuration.
//!
//! Every section is optional. A missing file yields [`Config::default`],
//! which points at the public Android hosts.
//!
//! ```toml
//! [http]
//! timeout_secs = 8
//! max_concurrent = 3
//!
//! [sources]
//! default_version = "android15"
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vhal_lookup_core::locator::{
    normalize_version, ResourceLocator, DEFAULT_DEVICE_CAR_BASE, DEFAULT_HW_INTERFACES_BASE,
};
use vhal_lookup_core::summarize::SummaryParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_batch_deadline_secs")]
    pub batch_deadline_secs: u64,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            max_concurrent: default_max_concurrent(),
            batch_deadline_secs: default_batch_deadline_secs(),
            pool_max_idle_per_host: default_pool_max_idle(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_deadline(&self) -> Duration {
        Duration::from_secs(self.batch_deadline_secs)
    }
}

fn default_timeout_secs() -> u64 {
    8
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_ms() -> u64 {
    100
}
fn default_max_concurrent() -> usize {
    3
}
fn default_batch_deadline_secs() -> u64 {
    16
}
fn default_pool_max_idle() -> usize {
    20
}
fn default_user_agent() -> String {
    format!("vHAL-Lookup/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,
    #[serde(default = "default_section_limit")]
    pub section_limit: usize,
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
    #[serde(default = "default_min_section_len")]
    pub min_section_len: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_sections: default_max_sections(),
            section_limit: default_section_limit(),
            summary_limit: default_summary_limit(),
            min_section_len: default_min_section_len(),
        }
    }
}

impl SummaryConfig {
    pub fn params(&self) -> SummaryParams {
        SummaryParams {
            max_sections: self.max_sections,
            section_limit: self.section_limit,
            summary_limit: self.summary_limit,
            min_section_len: self.min_section_len,
        }
    }
}

fn default_max_sections() -> usize {
    3
}
fn default_section_limit() -> usize {
    2000
}
fn default_summary_limit() -> usize {
    4000
}
fn default_min_section_len() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_version")]
    pub default_version: String,
    #[serde(default = "default_hw_interfaces_base")]
    pub hw_interfaces_base: String,
    #[serde(default = "default_device_car_base")]
    pub device_car_base: String,
    #[serde(default = "default_docs_base")]
    pub docs_base: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            default_version: default_version(),
            hw_interfaces_base: default_hw_interfaces_base(),
            device_car_base: default_device_car_base(),
            docs_base: default_docs_base(),
            max_pages: default_max_pages(),
        }
    }
}

impl SourcesConfig {
    pub fn locator(&self) -> Result<ResourceLocator> {
        ResourceLocator::new(
            self.hw_interfaces_base.as_str(),
            self.device_car_base.as_str(),
            &self.default_version,
        )
    }
}

fn default_version() -> String {
    "android15".to_string()
}
fn default_hw_interfaces_base() -> String {
    DEFAULT_HW_INTERFACES_BASE.to_string()
}
fn default_device_car_base() -> String {
    DEFAULT_DEVICE_CAR_BASE.to_string()
}
fn default_docs_base() -> String {
    "https://source.android.com/docs/automotive/vhal".to_string()
}
fn default_max_pages() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Replacement seed data; the built-in SEAT/HVAC tables when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config: {}", path.display()))
}

fn validate(config: &Config) -> Result<()> {
    if config.http.max_concurrent == 0 {
        bail!("http.max_concurrent must be >= 1");
    }
    if config.http.timeout_secs == 0 {
        bail!("http.timeout_secs must be > 0");
    }
    if config.cache.ttl_secs == 0 {
        bail!("cache.ttl_secs must be > 0");
    }
    if config.summary.summary_limit == 0 {
        bail!("summary.summary_limit must be > 0");
    }
    if config.summary.max_sections == 0 {
        bail!("summary.max_sections must be >= 1");
    }
    if config.sources.max_pages == 0 {
        bail!("sources.max_pages must be >= 1");
    }
    if normalize_version(&config.sources.default_version).is_none() {
        bail!(
            "sources.default_version '{}' is not a supported Android version",
            config.sources.default_version
        );
    }
    Ok(())
}
