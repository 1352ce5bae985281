//! Part and balance-record types.
//!
//! Parts are read-only catalog rows; they are referenced by selection state
//! but never mutated. A balance record is the template for one buildable
//! item family: its slot list, raw rule JSON, base tags, and the type
//! identifiers used to filter the catalog.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tags::{decode_tags, tag_set};

/// Error raised when a raw balance row is missing required fields.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("balance record missing field `{0}`")]
    MissingField(&'static str),
}

/// One catalog part: a row belonging to exactly one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Stable identifier used inside component strings.
    pub serial_index: u32,
    /// Raw part name, e.g. `bor_sr_barrel_01_stray`.
    pub name: String,
    /// Slot (part type) this part occupies.
    pub slot: String,
    /// Inventory type classification used for catalog filtering.
    pub inv_type: String,
    /// Optional free-text stat description.
    pub stats: Option<String>,
    /// Tags this part contributes to the build when equipped.
    pub add_tags: Vec<String>,
    /// Tags that must already be present for this part to be legal.
    pub dependency_tags: Vec<String>,
    /// Tags that must not be present elsewhere in the build.
    pub exclusion_tags: Vec<String>,
}

impl Part {
    pub fn dependency_set(&self) -> HashSet<String> {
        tag_set(&self.dependency_tags)
    }

    pub fn exclusion_set(&self) -> HashSet<String> {
        tag_set(&self.exclusion_tags)
    }

    /// All tags attached to the part in any role. Allow-list rules match
    /// against these in addition to the part name.
    pub fn identification_tags(&self) -> Vec<String> {
        let mut tags = self.add_tags.clone();
        tags.extend(self.dependency_tags.iter().cloned());
        tags.extend(self.exclusion_tags.iter().cloned());
        tags
    }

    /// Builds a part from a raw catalog row, normalizing the three tag
    /// columns through the tag algebra.
    pub fn from_row(row: &Value) -> Result<Self, RecordError> {
        let serial_index = row
            .get("serial_index")
            .and_then(coerce_u32)
            .ok_or(RecordError::MissingField("serial_index"))?;
        let name = str_field(row, "partname").ok_or(RecordError::MissingField("partname"))?;
        let slot = str_field(row, "part_type").ok_or(RecordError::MissingField("part_type"))?;
        let inv_type = str_field(row, "inv").ok_or(RecordError::MissingField("inv"))?;
        Ok(Part {
            serial_index,
            name,
            slot,
            inv_type,
            stats: str_field(row, "stats"),
            add_tags: tag_field(row, "addtags"),
            dependency_tags: tag_field(row, "dependencytags"),
            exclusion_tags: tag_field(row, "exclusiontags"),
        })
    }
}

/// Template for one buildable item family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Display/lookup key of the balance entry.
    pub entry_key: String,
    /// Inventory type holding item-specific parts.
    pub item_type: String,
    /// Broader category type holding parts shared across the family.
    pub parent_type: String,
    /// Classification id emitted as the component string header.
    pub classification_id: String,
    /// Optional base part id serialized ahead of all slot tokens.
    pub base_part: Option<u32>,
    /// Tags present even with no parts selected.
    pub base_tags: Vec<String>,
    /// Slot names in serialization order.
    pub slot_order: Vec<String>,
    /// Raw per-slot cardinality rule JSON (`parttypeselectionrules`).
    pub slot_rules: Value,
    /// Raw global tag rule JSON (`parttagselectionrules`).
    pub tag_rules: Value,
}

impl BalanceRecord {
    /// Builds a balance record from a raw row.
    ///
    /// The slot list (`parttypes`) tolerates every encoding seen in the
    /// wild: a list of strings, a list of one-entry maps, or a map keyed by
    /// slot name.
    pub fn from_row(row: &Value) -> Result<Self, RecordError> {
        let entry_key = str_field(row, "entry_key").ok_or(RecordError::MissingField("entry_key"))?;
        let item_type = str_field(row, "item_type").ok_or(RecordError::MissingField("item_type"))?;
        let parent_type =
            str_field(row, "parent_type").ok_or(RecordError::MissingField("parent_type"))?;
        let classification_id = row
            .get("serial_index")
            .and_then(coerce_string)
            .unwrap_or_else(|| "0".to_string());
        let base_part = row
            .get("base_part")
            .and_then(coerce_u32)
            .filter(|id| *id != 0);
        Ok(BalanceRecord {
            entry_key,
            item_type,
            parent_type,
            classification_id,
            base_part,
            base_tags: tag_field(row, "basetags"),
            slot_order: slot_order_from(row.get("parttypes").unwrap_or(&Value::Null)),
            slot_rules: row
                .get("parttypeselectionrules")
                .cloned()
                .unwrap_or(Value::Null),
            tag_rules: row
                .get("parttagselectionrules")
                .cloned()
                .unwrap_or(Value::Null),
        })
    }
}

/// Extracts the ordered slot list from the heterogeneous `parttypes` column.
pub fn slot_order_from(raw: &Value) -> Vec<String> {
    let value = match raw {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        },
        other => other.clone(),
    };
    match value {
        Value::Array(items) => {
            let mut slots = Vec::new();
            for item in items {
                match item {
                    Value::String(s) => slots.push(s),
                    Value::Object(map) => slots.extend(map.into_iter().map(|(k, _)| k)),
                    _ => {}
                }
            }
            slots
        }
        Value::Object(map) => map.into_iter().map(|(k, _)| k).collect(),
        _ => Vec::new(),
    }
}

fn str_field(row: &Value, key: &str) -> Option<String> {
    row.get(key).and_then(coerce_string)
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn tag_field(row: &Value, key: &str) -> Vec<String> {
    row.get(key).map(decode_tags).unwrap_or_default()
}
