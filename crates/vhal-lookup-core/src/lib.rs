//! # vHAL Lookup Core
//!
//! Network-free logic for vHAL Lookup: the property model and catalog,
//! the tiered search index, the resource locator, the summary ranker,
//! and source confidence scoring.
//!
//! This crate has no tokio or reqwest dependency. Everything here is a
//! pure function of configuration and input.

pub mod catalog;
pub mod index;
pub mod locator;
pub mod models;
pub mod summarize;
pub mod validation;
