//! Slot classification for generically-typed catalog rows.
//!
//! Some rows are filed under a catch-all slot and only their part name
//! reveals the functional slot they occupy. The classifier is an explicit
//! pattern table applied once when a catalog batch is loaded, not re-derived
//! per lookup.

use gearforge_core::Part;

/// Maps rows in a generic slot to their functional slot by part-name
/// substring.
#[derive(Debug, Clone)]
pub struct SlotClassifier {
    /// The catch-all slot whose rows need re-homing.
    generic_slot: String,
    /// Ordered (substring, slot) table; first match wins.
    table: Vec<(String, String)>,
    /// Slot assigned when no pattern matches.
    fallback: String,
}

impl SlotClassifier {
    pub fn new(
        generic_slot: impl Into<String>,
        table: Vec<(String, String)>,
        fallback: impl Into<String>,
    ) -> Self {
        SlotClassifier {
            generic_slot: generic_slot.into(),
            table,
            fallback: fallback.into(),
        }
    }

    /// Resolves the functional slot for one row. Rows outside the generic
    /// slot are trusted as-is.
    pub fn classify(&self, slot: &str, part_name: &str) -> String {
        if slot != self.generic_slot {
            return slot.to_string();
        }
        for (pattern, target) in &self.table {
            if part_name.contains(pattern.as_str()) {
                return target.clone();
            }
        }
        self.fallback.clone()
    }

    /// Re-homes every part in a loaded batch.
    pub fn apply(&self, parts: &mut [Part]) {
        for part in parts {
            part.slot = self.classify(&part.slot, &part.name);
        }
    }

    /// Re-homes a batch and hands it back, for feeding straight into
    /// catalog construction.
    pub fn classified(&self, mut parts: Vec<Part>) -> Vec<Part> {
        self.apply(&mut parts);
        parts
    }
}

impl Default for SlotClassifier {
    /// The table for manufacturer-filed weapon rows.
    fn default() -> Self {
        SlotClassifier::new(
            "Manufacturer Part",
            vec![
                (".part_shield_".to_string(), "Body Accessory".to_string()),
                (".part_mag_torgue_".to_string(), "Magazine".to_string()),
                (
                    ".part_barrel_licensed_".to_string(),
                    "Barrel Accessory".to_string(),
                ),
                (
                    ".part_secondary_ammo_".to_string(),
                    "Stat Modifier".to_string(),
                ),
            ],
            "Stat Modifier",
        )
    }
}
