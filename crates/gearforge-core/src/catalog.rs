//! Part catalog access.
//!
//! The engine depends only on the query contracts below; any store exposing
//! equivalent lookups suffices. `MemoryCatalog` is the in-tree
//! implementation used by tests and by hosts without a relational store.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::part::{BalanceRecord, Part};

/// Error raised by a catalog backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The underlying store failed or was unreachable.
    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// One row of the preliminary slot scan: how many parts a slot offers under
/// a given inventory type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCensus {
    pub slot: String,
    pub inv_type: String,
    pub count: usize,
}

/// Read-only access to the part catalog and balance records.
///
/// All methods are independently awaitable; implementations must not hold
/// locks across await points.
#[async_trait]
pub trait PartCatalog: Send + Sync {
    /// Parts occupying `slot` whose classification matches any of the given
    /// inventory types. No tag filtering; this is the raw candidate set.
    async fn candidate_parts(
        &self,
        slot: &str,
        inv_types: &[&str],
    ) -> Result<Vec<Part>, CatalogError>;

    /// Parts matching any of the given serial indices, across all slots.
    async fn parts_by_ids(&self, ids: &[u32]) -> Result<Vec<Part>, CatalogError>;

    /// Per-(slot, inv_type) part counts under the item's two type filters.
    async fn slot_census(
        &self,
        item_type: &str,
        parent_type: &str,
    ) -> Result<Vec<SlotCensus>, CatalogError>;

    /// Balance record for an (inventory type id, item id) pair, if any.
    async fn balance(
        &self,
        inv_type_id: &str,
        item_id: &str,
    ) -> Result<Option<BalanceRecord>, CatalogError>;
}

/// In-memory `PartCatalog` backed by plain vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    parts: Vec<Part>,
    balances: HashMap<(String, String), BalanceRecord>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(mut self, parts: impl IntoIterator<Item = Part>) -> Self {
        self.parts.extend(parts);
        self
    }

    pub fn with_balance(
        mut self,
        inv_type_id: impl Into<String>,
        item_id: impl Into<String>,
        balance: BalanceRecord,
    ) -> Self {
        self.balances
            .insert((inv_type_id.into(), item_id.into()), balance);
        self
    }
}

#[async_trait]
impl PartCatalog for MemoryCatalog {
    async fn candidate_parts(
        &self,
        slot: &str,
        inv_types: &[&str],
    ) -> Result<Vec<Part>, CatalogError> {
        Ok(self
            .parts
            .iter()
            .filter(|p| p.slot == slot && inv_types.contains(&p.inv_type.as_str()))
            .cloned()
            .collect())
    }

    async fn parts_by_ids(&self, ids: &[u32]) -> Result<Vec<Part>, CatalogError> {
        Ok(self
            .parts
            .iter()
            .filter(|p| ids.contains(&p.serial_index))
            .cloned()
            .collect())
    }

    async fn slot_census(
        &self,
        item_type: &str,
        parent_type: &str,
    ) -> Result<Vec<SlotCensus>, CatalogError> {
        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for part in &self.parts {
            if part.inv_type == item_type || part.inv_type == parent_type {
                *counts
                    .entry((part.slot.clone(), part.inv_type.clone()))
                    .or_default() += 1;
            }
        }
        let mut census: Vec<SlotCensus> = counts
            .into_iter()
            .map(|((slot, inv_type), count)| SlotCensus {
                slot,
                inv_type,
                count,
            })
            .collect();
        census.sort_by(|a, b| (&a.slot, &a.inv_type).cmp(&(&b.slot, &b.inv_type)));
        Ok(census)
    }

    async fn balance(
        &self,
        inv_type_id: &str,
        item_id: &str,
    ) -> Result<Option<BalanceRecord>, CatalogError> {
        Ok(self
            .balances
            .get(&(inv_type_id.to_string(), item_id.to_string()))
            .cloned())
    }
}
