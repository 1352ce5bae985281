//! Rule catalog loading.
//!
//! Balance records carry two raw rule blobs: per-slot selection rules (the
//! `pairs` structure) and global tag limits. Both tolerate the string-vs-
//! decoded ambiguity of JSONB columns. A rule that fails to parse is
//! skipped with a warning, never fatal to the whole load.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::warn;

use gearforge_core::tags::decode_tags;

/// Effective limit for a global rule whose `max` is absent or invalid.
const UNLIMITED: usize = 999;

/// Cardinality and allow-list rule for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRule {
    /// Minimum selected parts for a legitimate build.
    pub min: u32,
    /// Maximum simultaneous selections. `max > 1` makes the slot a bag.
    pub max: u32,
    /// Optional part-name rule strings restricting the slot regardless of
    /// tag legality. `None` means unrestricted.
    pub allowed_parts: Option<Vec<String>>,
}

impl Default for SlotRule {
    /// An unlisted slot is mandatory-single unless explicitly relaxed.
    fn default() -> Self {
        SlotRule {
            min: 1,
            max: 1,
            allowed_parts: None,
        }
    }
}

/// Normalized per-slot rules for one balance record.
#[derive(Debug, Clone, Default)]
pub struct SlotRules {
    rules: HashMap<String, SlotRule>,
}

impl SlotRules {
    /// Parses the `parttypeselectionrules` structure:
    ///
    /// ```json
    /// { "pairs": { "<pair-id>": { "key": "barrel",
    ///   "value": { "partcount": {"min": 1, "max": 1},
    ///              "parts": [{"part": "part_barrel_01_stray"}] } } } }
    /// ```
    ///
    /// Missing `min`/`max` default to 1. Unparseable input yields an empty
    /// rule set.
    pub fn from_json(raw: &Value) -> Self {
        let value = decode_level(raw);
        let mut rules = HashMap::new();
        let Some(pairs) = value.get("pairs").and_then(Value::as_object) else {
            return SlotRules { rules };
        };
        for pair in pairs.values() {
            let Some(slot) = pair.get("key").and_then(Value::as_str) else {
                continue;
            };
            let val = pair.get("value").cloned().unwrap_or(Value::Null);
            let counts = val.get("partcount").cloned().unwrap_or(Value::Null);
            let min = coerce_count(counts.get("min")).unwrap_or(1);
            let max = coerce_count(counts.get("max")).unwrap_or(1);
            let allowed_parts = val.get("parts").and_then(Value::as_array).map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get("part").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            });
            rules.insert(
                slot.to_string(),
                SlotRule {
                    min,
                    max,
                    allowed_parts: allowed_parts.filter(|l| !l.is_empty()),
                },
            );
        }
        SlotRules { rules }
    }

    /// Rule for a slot, falling back to the mandatory-single default.
    pub fn get(&self, slot: &str) -> SlotRule {
        self.rules.get(slot).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, slot: impl Into<String>, rule: SlotRule) {
        self.rules.insert(slot.into(), rule);
    }
}

/// Global occurrence cap: across the whole build, tags in `tags` may occur
/// at most `max` times in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalTagRule {
    pub max: usize,
    pub tags: HashSet<String>,
}

impl GlobalTagRule {
    /// Parses the `parttagselectionrules` list. A malformed entry is
    /// skipped, not fatal.
    pub fn load_all(raw: &Value) -> Vec<GlobalTagRule> {
        let value = decode_level(raw);
        let Some(entries) = value.as_array() else {
            return Vec::new();
        };
        let mut rules = Vec::new();
        for entry in entries {
            if !entry.is_object() {
                warn!(rule = %entry, "skipping malformed global tag rule");
                continue;
            }
            let max = coerce_count(entry.get("max"))
                .map(|m| m as usize)
                .unwrap_or(UNLIMITED);
            let tags: HashSet<String> = entry
                .get("tags")
                .map(decode_tags)
                .unwrap_or_default()
                .into_iter()
                .collect();
            rules.push(GlobalTagRule { max, tags });
        }
        rules
    }

    /// A display name for the rule: its lexicographically first tag.
    pub fn display_tag(&self) -> String {
        self.tags
            .iter()
            .min()
            .cloned()
            .unwrap_or_else(|| "Restricted".to_string())
    }
}

/// Matches an allow-list rule string against a catalog row.
///
/// The rule names parts generically (`part_barrel_01_stray`); rows name them
/// per inventory type (`bor_sr_barrel_01_stray`). Substituting the row's
/// inventory type for the leading `part` gives the expected name. When the
/// row's name is a prefix of the expected name, the remaining suffix may be
/// carried as a tag instead (`stray` or `uni_stray`).
pub fn match_rule_part_name(name: &str, tags: &[String], rule: &str, inv_type: &str) -> bool {
    let name = name.to_lowercase();
    let rule = rule.to_lowercase();
    let inv_type = inv_type.to_lowercase();

    let expected = rule.replacen("part", &inv_type, 1);
    if name == expected {
        return true;
    }
    if let Some(rest) = expected.strip_prefix(name.as_str()) {
        let suffix = rest.trim_matches('_');
        if suffix.is_empty() {
            return false;
        }
        let prefixed = format!("uni_{suffix}");
        return tags
            .iter()
            .map(|t| t.to_lowercase())
            .any(|t| t == suffix || t == prefixed);
    }
    false
}

/// JSONB columns may arrive as text; decode one level if so.
fn decode_level(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or(Value::Null),
        other => other.clone(),
    }
}

fn coerce_count(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
