//! Gearforge Core - data model and tag algebra for the item rule engine
//!
//! This crate provides the fundamental abstractions shared by the rest of
//! the workspace:
//! - Tag algebra for normalizing heterogeneous tag encodings
//! - Part and balance-record types describing the buildable catalog
//! - The `PartCatalog` access trait (plus an in-memory implementation)

pub mod catalog;
pub mod part;
pub mod tags;

pub use catalog::{CatalogError, MemoryCatalog, PartCatalog, SlotCensus};
pub use part::{BalanceRecord, Part, RecordError};
pub use tags::{decode_tags, tag_set, tags_disjoint, tags_subset, TagAggregate};
