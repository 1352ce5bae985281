//! Per-family serialization format specs.
//!
//! Each item family fixes its own slot order, maps some slots onto struct
//! keys (`{key:[id id]}` tokens), and differs on whether a space follows the
//! `||` separator. These quirks are data, looked up once, so the encoding
//! path stays branch-free.

use std::collections::HashMap;

/// Serialization spec for one item family.
#[derive(Debug, Clone)]
pub struct FamilyFormat {
    /// Slot names in required token order.
    pub slot_order: Vec<String>,
    /// Slots serialized as `{key:...}` groups instead of bare `{id}` tokens.
    /// These slots draw parts from the parent inventory type.
    struct_keys: HashMap<String, String>,
    /// Whether a single space follows the `||` separator.
    pub space_after_separator: bool,
}

impl FamilyFormat {
    pub fn new(
        slot_order: Vec<String>,
        struct_keys: HashMap<String, String>,
        space_after_separator: bool,
    ) -> Self {
        FamilyFormat {
            slot_order,
            struct_keys,
            space_after_separator,
        }
    }

    /// Balance-driven format: slot order comes from the balance record; the
    /// element slots are keyed composites under key `1`.
    pub fn generic(slot_order: Vec<String>) -> Self {
        let struct_keys = [
            ("body_ele".to_string(), "1".to_string()),
            ("secondary_ele".to_string(), "1".to_string()),
        ]
        .into();
        FamilyFormat::new(slot_order, struct_keys, false)
    }

    pub fn weapon() -> Self {
        let order = [
            "Rarity",
            "Body",
            "Body Accessory",
            "Primary Element",
            "Barrel",
            "Barrel Accessory",
            "Magazine",
            "Scope",
            "Scope Accessory",
            "Grip",
            "Underbarrel",
            "Foregrip",
            "Stat Modifier",
            "Secondary Element",
        ];
        let struct_keys = [
            ("Primary Element".to_string(), "1".to_string()),
            ("Secondary Element".to_string(), "1".to_string()),
        ]
        .into();
        FamilyFormat::new(
            order.iter().map(|s| s.to_string()).collect(),
            struct_keys,
            true,
        )
    }

    pub fn shield() -> Self {
        let order = ["Rarity", "UniquePart", "General", "Energy", "Armor"];
        let struct_keys = [
            ("General".to_string(), "246".to_string()),
            ("Energy".to_string(), "248".to_string()),
            ("Armor".to_string(), "237".to_string()),
        ]
        .into();
        FamilyFormat::new(
            order.iter().map(|s| s.to_string()).collect(),
            struct_keys,
            true,
        )
    }

    pub fn repkit() -> Self {
        let order = ["Rarity", "TypeDenomination", "UniquePart", "Perks"];
        let struct_keys = [("Perks".to_string(), "243".to_string())].into();
        FamilyFormat::new(
            order.iter().map(|s| s.to_string()).collect(),
            struct_keys,
            false,
        )
    }

    /// Looks up a built-in family by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "weapon" => Some(FamilyFormat::weapon()),
            "shield" => Some(FamilyFormat::shield()),
            "repkit" => Some(FamilyFormat::repkit()),
            _ => None,
        }
    }

    /// The struct key for a slot, if it serializes as a keyed group.
    pub fn struct_key(&self, slot: &str) -> Option<&str> {
        self.struct_keys.get(slot).map(String::as_str)
    }

    pub fn separator(&self) -> &'static str {
        if self.space_after_separator {
            "|| "
        } else {
            "||"
        }
    }

    /// Renders the token(s) for one slot's selected ids.
    ///
    /// Plain slots emit one `{id}` token per part; struct-keyed slots emit a
    /// single `{key:id}` or `{key:[id, id]}` group.
    pub fn render_slot_tokens(&self, slot: &str, ids: &[u32]) -> Vec<String> {
        if ids.is_empty() {
            return Vec::new();
        }
        match self.struct_key(slot) {
            Some(key) if ids.len() == 1 => vec![format!("{{{key}:{}}}", ids[0])],
            Some(key) => {
                let joined = ids
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![format!("{{{key}:[{joined}]}}")]
            }
            None => ids.iter().map(|id| format!("{{{id}}}")).collect(),
        }
    }
}

/// Assembles the full component string in the family's format.
///
/// The exact textual grammar round-trips through the external codec service
/// and must be reproduced byte-for-byte, leading space included.
pub fn build_component_string(
    format: &FamilyFormat,
    classification_id: &str,
    level: u32,
    skin: &str,
    tokens: &[String],
    extra: &str,
) -> String {
    format!(
        "{classification_id}, 0, 1, {level}|{skin}{}{}|{extra}",
        format.separator(),
        tokens.join(" "),
    )
}
