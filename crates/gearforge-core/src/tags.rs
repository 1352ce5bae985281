//! Tag algebra.
//!
//! Tags arrive from the data layer in several shapes: a flat JSON array of
//! strings, a single string (sometimes itself JSON-encoded), a key-value
//! object, or an array mixing strings and one-entry objects. Everything is
//! normalized here into a flat `Vec<String>` so downstream logic never
//! special-cases input shape.
//!
//! Two representations coexist on purpose: dependency and exclusion checks
//! are set predicates, while global limits count occurrences over the
//! original list with duplicates intact.

use std::collections::HashSet;

use serde_json::Value;

/// Decodes raw tag data into a flat list of tag strings.
///
/// Order is preserved and duplicates are kept. Objects contribute their
/// values, not their keys. Null or unparseable input yields an empty list,
/// never an error.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use gearforge_core::decode_tags;
///
/// let raw = json!(["stray", {"uni_stray": "uni_stray"}, "stray"]);
/// assert_eq!(decode_tags(&raw), vec!["stray", "uni_stray", "stray"]);
/// ```
pub fn decode_tags(raw: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect(raw, true, &mut out);
    out
}

fn collect(value: &Value, decode_strings: bool, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            // JSONB columns occasionally come back as text; decode one level
            // before treating the string as a literal tag.
            if decode_strings {
                match serde_json::from_str::<Value>(s) {
                    Ok(inner @ (Value::Array(_) | Value::Object(_))) => {
                        collect(&inner, false, out)
                    }
                    _ => out.push(s.clone()),
                }
            } else {
                out.push(s.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, false, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                collect(v, false, out);
            }
        }
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
    }
}

/// Builds a de-duplicated set from a tag list.
pub fn tag_set(tags: &[String]) -> HashSet<String> {
    tags.iter().cloned().collect()
}

/// Returns true when every required tag is present.
pub fn tags_subset(required: &HashSet<String>, present: &HashSet<String>) -> bool {
    required.is_subset(present)
}

/// Returns true when the two sets share no tag.
pub fn tags_disjoint(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    a.is_disjoint(b)
}

/// The aggregate tag state of a build: base tags plus every selected part's
/// contribution.
///
/// Keeps both the multiset (for counting rules) and the derived set (for
/// membership predicates) in sync.
#[derive(Debug, Clone, Default)]
pub struct TagAggregate {
    list: Vec<String>,
    set: HashSet<String>,
}

impl TagAggregate {
    /// Creates an aggregate from a flat tag list, duplicates intact.
    pub fn from_list(list: Vec<String>) -> Self {
        let set = list.iter().cloned().collect();
        TagAggregate { list, set }
    }

    /// The full occurrence list.
    pub fn list(&self) -> &[String] {
        &self.list
    }

    /// The de-duplicated view.
    pub fn as_set(&self) -> &HashSet<String> {
        &self.set
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.set.contains(tag)
    }

    /// Occurrence count of tags that fall inside `targets`.
    pub fn count_in(&self, targets: &HashSet<String>) -> usize {
        self.list.iter().filter(|t| targets.contains(*t)).count()
    }

    /// Occurrence count as above, but with one part's own contribution
    /// subtracted. Used when asking "is this tag present elsewhere".
    pub fn count_in_excluding(&self, targets: &HashSet<String>, own: &[String]) -> usize {
        let total = self.count_in(targets);
        let mine = own.iter().filter(|t| targets.contains(*t)).count();
        total.saturating_sub(mine)
    }

    /// Occurrences of a single tag with one part's contribution removed.
    pub fn occurrences_excluding(&self, tag: &str, own: &[String]) -> usize {
        let total = self.list.iter().filter(|t| *t == tag).count();
        let mine = own.iter().filter(|t| *t == tag).count();
        total.saturating_sub(mine)
    }

    /// Sorted distinct tags, for display.
    pub fn distinct_sorted(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.set.iter().cloned().collect();
        tags.sort();
        tags
    }
}
