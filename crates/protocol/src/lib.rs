//! Data model for the opportunity snapshot.
//!
//! This crate contains the serde-serializable types produced by a scrape run
//! and persisted as the JSON snapshot. These types represent the shapes of
//! data as they appear in the output file.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization and a few lookup helpers
//! * 1:1 with the file: field names match the camelCase JSON keys
//! * Immutable once built: records are assembled by the pipeline and only read afterwards
//!
//! Scraping logic lives in `tender-rs`; this crate has no browser or HTML knowledge.

pub mod opportunity;
pub mod snapshot;

pub use opportunity::*;
pub use snapshot::*;
