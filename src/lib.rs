//! # vHAL Lookup
//!
//! Property lookup for the Android vehicle HAL: a searchable catalog of
//! vehicle properties, version-aware locations of the AOSP files that
//! define them, cached remote fetch, relevance-ranked documentation
//! summaries, and source validation with a confidence score.
//!
//! The network-free half (catalog, index, locator, summarizer, confidence
//! scoring) lives in `vhal-lookup-core`; this crate adds HTTP, caching,
//! the tool registry, the tool server, and the CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ RecordCatalog│──▶│ SearchIndex  │   │ ResourceLocator  │
//! └──────────────┘   └──────┬───────┘   └────────┬─────────┘
//!                           │                    ▼
//!                           │           ┌──────────────────┐   ┌──────────────┐
//!                           │           │ Fetcher (pooled, │──▶│ ContentCache │
//!                           │           │ retry, fallback) │   └──────────────┘
//!                           │           └────────┬─────────┘
//!                           ▼                    ▼
//!                     ┌───────────────── Engine ──────────────────┐
//!                     │ lookup · analyze · summarize · validate   │
//!                     └───────────┬───────────────────┬───────────┘
//!                                 ▼                   ▼
//!                           ┌──────────┐        ┌──────────┐
//!                           │   CLI    │        │   HTTP   │
//!                           │  (vhal)  │        │  tools   │
//!                           └──────────┘        └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`cache`] | TTL content cache |
//! | [`pool`] | Bounded concurrent batches with a deadline |
//! | [`fetch`] | Retrying, cache-first fetch over fallback chains |
//! | [`extract`] | Payload decoding, HTML to text, link extraction |
//! | [`models`] | Fetched resource type |
//! | [`docs`] | Documentation page discovery and text fetch |
//! | [`lookup`] | Source lookup report |
//! | [`analyze`] | Implementation analysis |
//! | [`validate`] | Source probes and the enhanced summary |
//! | [`engine`] | Wiring of all components |
//! | [`traits`] | Tool trait, built-in tools, registry |
//! | [`server`] | HTTP tool server |

pub mod analyze;
pub mod cache;
pub mod config;
pub mod docs;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod lookup;
pub mod models;
pub mod pool;
pub mod server;
pub mod traits;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use vhal_lookup_core as core;
