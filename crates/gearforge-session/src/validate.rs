//! Whole-item validation.
//!
//! Stateless single pass: decode → parse → catalog lookup → trial session →
//! evaluate → report. Rule violations are accumulated, not short-circuited,
//! so one call reports every detected problem; stage failures (codec,
//! parse, unknown item) abort with a typed error instead of a partial
//! verdict.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use gearforge_codec::{item_name, CodecClient, CodecError, CodecTransport, ParseError, ParsedComponents};
use gearforge_core::{BalanceRecord, CatalogError, PartCatalog};

use crate::error::SessionError;
use crate::session::AssemblySession;

/// Display cap applied by renderers; collection itself is unbounded.
pub const VIOLATION_DISPLAY_CAP: usize = 10;

/// A stage failure that aborts validation outright.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No balance record matches the decoded type identifiers.
    #[error("unknown item: inv `{inv_type_id}` / item `{item_id}`")]
    UnknownItem {
        inv_type_id: String,
        item_id: String,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One detected rule violation. Accumulated, never short-circuited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Part drawn from the wrong inventory type for its slot.
    InvalidSource {
        part: String,
        expected: String,
        got: String,
    },
    TooManyParts {
        slot: String,
        count: usize,
        max: u32,
    },
    /// Below minimum while at least one candidate was actually selectable.
    MissingParts {
        slot: String,
        count: usize,
        min: u32,
    },
    /// An equipped part excludes a tag present elsewhere in the build.
    Excluded { part: String, tag: String },
    MissingDependencies { part: String, missing: Vec<String> },
    GlobalLimitExceeded {
        tag: String,
        count: usize,
        max: usize,
    },
    /// Ids in the serial with no catalog row. Non-fatal.
    UnknownIds { ids: Vec<u32> },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InvalidSource { part, expected, got } => {
                write!(f, "{part}: invalid source, expected type `{expected}`, got `{got}`")
            }
            Violation::TooManyParts { slot, count, max } => {
                write!(f, "{slot}: too many parts ({count}/{max})")
            }
            Violation::MissingParts { slot, count, min } => {
                write!(f, "{slot}: missing parts ({count}/{min})")
            }
            Violation::Excluded { part, tag } => {
                write!(f, "{part}: incompatible, excludes `{tag}` which is present elsewhere")
            }
            Violation::MissingDependencies { part, missing } => {
                write!(f, "{part}: missing required tags: `{}`", missing.join(", "))
            }
            Violation::GlobalLimitExceeded { tag, count, max } => {
                write!(f, "global limit exceeded for `{tag}` ({count}/{max})")
            }
            Violation::UnknownIds { ids } => write!(f, "unknown part ids: {ids:?}"),
        }
    }
}

/// Facts about the item gathered along the way, for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationMetadata {
    pub inv_type_id: String,
    pub item_id: String,
    pub item_name: Option<String>,
    pub item_type: String,
    pub part_count: usize,
    /// Sorted distinct tags of the assembled item.
    pub tags: Vec<String>,
}

/// The outcome of validating one item.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// True when no rule violation was found. Unknown ids are recorded but
    /// do not flip legitimacy.
    pub legitimate: bool,
    pub violations: Vec<Violation>,
    pub metadata: ValidationMetadata,
}

impl Verdict {
    /// Violation messages capped for display.
    pub fn display_violations(&self) -> Vec<String> {
        self.violations
            .iter()
            .take(VIOLATION_DISPLAY_CAP)
            .map(Violation::to_string)
            .collect()
    }
}

/// Decodes a serial and validates the item it describes.
pub async fn validate_serial<T: CodecTransport>(
    serial: &str,
    codec: &CodecClient<T>,
    catalog: &dyn PartCatalog,
) -> Result<Verdict, ValidateError> {
    let decoded = codec.decode(serial).await?;
    let parsed = ParsedComponents::parse(&decoded.component_string)?;
    let balance = catalog
        .balance(&parsed.inv_type_id, &parsed.item_id)
        .await?
        .ok_or_else(|| ValidateError::UnknownItem {
            inv_type_id: parsed.inv_type_id.clone(),
            item_id: parsed.item_id.clone(),
        })?;
    let name = item_name(&decoded.additional_data);
    validate_assembled(&parsed, balance, catalog, name).await
}

/// Validates an already-decoded item against its balance record's rules.
pub async fn validate_assembled(
    parsed: &ParsedComponents,
    balance: BalanceRecord,
    catalog: &dyn PartCatalog,
    item_name: Option<String>,
) -> Result<Verdict, ValidateError> {
    let all_ids = parsed.all_part_ids();
    let mut metadata = ValidationMetadata {
        inv_type_id: parsed.inv_type_id.clone(),
        item_id: parsed.item_id.clone(),
        item_name,
        item_type: balance.item_type.clone(),
        part_count: all_ids.len(),
        tags: Vec::new(),
    };

    let mut session = AssemblySession::trial(balance, catalog).await?;
    let loaded = catalog.parts_by_ids(&all_ids).await?;
    debug!(requested = all_ids.len(), found = loaded.len(), "loaded decoded parts");

    let mut violations = Vec::new();
    let mut found_ids = HashSet::new();

    for part in loaded {
        found_ids.insert(part.serial_index);
        let expected = session.target_inv(&part.slot).to_string();
        if part.inv_type != expected {
            violations.push(Violation::InvalidSource {
                part: part.name.clone(),
                expected,
                got: part.inv_type.clone(),
            });
            continue;
        }
        session.admit_part(part);
    }

    // Slot cardinality. An empty slot is only a violation when something
    // legal could actually have filled it.
    for slot in session.balance().slot_order.clone() {
        let count = session.selections(&slot).len();
        let rule = session.rules().get(&slot);
        if count > rule.max as usize {
            violations.push(Violation::TooManyParts {
                slot: slot.clone(),
                count,
                max: rule.max,
            });
        }
        if (count as u32) < rule.min {
            let statuses = session.slot_status(&slot, catalog).await?;
            if statuses.iter().any(|s| s.is_valid()) {
                violations.push(Violation::MissingParts {
                    slot,
                    count,
                    min: rule.min,
                });
            }
        }
    }

    // Pairwise tag legality of every equipped part against the rest of the
    // assembled item.
    let current = session.current_tags();
    metadata.tags = current.distinct_sorted();
    for slot in session.balance().slot_order.clone() {
        for part in session.selections(&slot) {
            for tag in part.exclusion_set() {
                if current.occurrences_excluding(&tag, &part.add_tags) > 0 {
                    violations.push(Violation::Excluded {
                        part: part.name.clone(),
                        tag,
                    });
                }
            }
            let deps = part.dependency_set();
            if !deps.is_empty() && !deps.is_subset(current.as_set()) {
                let mut missing: Vec<String> =
                    deps.difference(current.as_set()).cloned().collect();
                missing.sort();
                violations.push(Violation::MissingDependencies {
                    part: part.name.clone(),
                    missing,
                });
            }
        }
    }

    // Global limits as exact counts over the final tag multiset.
    for rule in session.global_rules() {
        let count = current.count_in(&rule.tags);
        if count > rule.max {
            violations.push(Violation::GlobalLimitExceeded {
                tag: rule.display_tag(),
                count,
                max: rule.max,
            });
        }
    }

    let legitimate = violations.is_empty();

    let mut unknown: Vec<u32> = all_ids
        .iter()
        .copied()
        .collect::<HashSet<u32>>()
        .difference(&found_ids)
        .copied()
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        violations.push(Violation::UnknownIds { ids: unknown });
    }

    Ok(Verdict {
        legitimate,
        violations,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use gearforge_core::MemoryCatalog;

    use crate::test_utils::{balance, part, StubCodec};

    fn test_balance() -> BalanceRecord {
        balance(
            &["body", "grip", "barrel", "body_ele", "scope", "mod"],
            json!({
                "pairs": {
                    "p1": {"key": "barrel", "value": {"partcount": {"min": 1, "max": 2}}},
                }
            }),
            json!([{"max": 1, "tags": ["stray"]}]),
        )
    }

    /// Scope has no candidates at all; mod's sole candidate needs a tag no
    /// part provides, so it is never actually selectable.
    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_parts(vec![
                part(10, "body", "bor_sr", &["heavy"], &[], &[]),
                part(11, "body", "bor_sr", &[], &[], &["stray"]),
                part(20, "grip", "bor_sr", &[], &[], &[]),
                part(30, "barrel", "bor_sr", &["stray"], &[], &[]),
                part(31, "barrel", "bor_sr", &[], &[], &[]),
                part(32, "barrel", "bor_sr", &["stray"], &[], &[]),
                part(40, "body_ele", "bor", &[], &[], &[]),
                part(50, "body", "bor", &[], &[], &[]),
                part(60, "mod", "bor_sr", &[], &["licensed"], &[]),
            ])
            .with_balance("41", "99", test_balance())
    }

    async fn verdict_for(component: &str) -> Verdict {
        let catalog = catalog();
        let parsed = ParsedComponents::parse(component).unwrap();
        validate_assembled(&parsed, test_balance(), &catalog, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_legitimate_item_end_to_end() {
        let (codec, _) = StubCodec::client("41, 0, 1, 50| 2, 5||{99} {10} {20} {30} {1:40}|");
        let catalog = catalog();
        let verdict = validate_serial("@Ugxyz", &codec, &catalog).await.unwrap();
        assert!(verdict.legitimate, "violations: {:?}", verdict.violations);
        assert!(verdict.violations.is_empty());
        assert_eq!(verdict.metadata.inv_type_id, "41");
        assert_eq!(verdict.metadata.item_id, "99");
        assert_eq!(verdict.metadata.item_name.as_deref(), Some("Stray Rifle"));
        assert_eq!(verdict.metadata.item_type, "bor_sr");
        assert_eq!(verdict.metadata.part_count, 4);
        assert_eq!(verdict.metadata.tags, vec!["heavy", "stray"]);
    }

    #[tokio::test]
    async fn test_unknown_item_aborts() {
        let (codec, _) = StubCodec::client("77, 0, 1, 50| 2, 5||{99} {10}|");
        let catalog = catalog();
        let err = validate_serial("@Ugxyz", &codec, &catalog)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ValidateError::UnknownItem { ref inv_type_id, .. } if inv_type_id == "77"
        ));
    }

    #[tokio::test]
    async fn test_invalid_source_skips_part_and_flags_slot() {
        // Part 50 lives under the parent type but the body slot draws from
        // the item type; it is reported and not counted, so body also comes
        // up short.
        let verdict =
            verdict_for("41, 0, 1, 50| 2, 5||{99} {50} {20} {30} {1:40}|").await;
        assert!(!verdict.legitimate);
        assert!(verdict.violations.iter().any(|v| matches!(
            v,
            Violation::InvalidSource { expected, got, .. }
                if expected == "bor_sr" && got == "bor"
        )));
        assert!(verdict.violations.iter().any(|v| matches!(
            v,
            Violation::MissingParts { slot, count: 0, min: 1 } if slot == "body"
        )));
    }

    #[tokio::test]
    async fn test_empty_slot_only_flagged_when_fillable() {
        // Grip is missing and fillable: flagged. Scope has no candidates and
        // mod's sole candidate is locked by its dependency: both tolerated.
        let verdict = verdict_for("41, 0, 1, 50| 2, 5||{99} {10} {30} {1:40}|").await;
        assert!(!verdict.legitimate);
        let missing: Vec<&str> = verdict
            .violations
            .iter()
            .filter_map(|v| match v {
                Violation::MissingParts { slot, .. } => Some(slot.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec!["grip"]);
    }

    #[tokio::test]
    async fn test_too_many_parts_in_slot() {
        let verdict =
            verdict_for("41, 0, 1, 50| 2, 5||{99} {10} {11} {20} {31} {1:40}|").await;
        assert!(verdict.violations.iter().any(|v| matches!(
            v,
            Violation::TooManyParts { slot, count: 2, max: 1 } if slot == "body"
        )));
    }

    #[tokio::test]
    async fn test_exclusion_against_rest_of_build() {
        // Body 11 excludes "stray", contributed by barrel 30.
        let verdict = verdict_for("41, 0, 1, 50| 2, 5||{99} {11} {20} {30} {1:40}|").await;
        assert!(!verdict.legitimate);
        assert!(verdict.violations.iter().any(|v| matches!(
            v,
            Violation::Excluded { part, tag }
                if part == "bor_sr_body_11" && tag == "stray"
        )));
    }

    #[tokio::test]
    async fn test_missing_dependency_named() {
        let verdict =
            verdict_for("41, 0, 1, 50| 2, 5||{99} {10} {20} {30} {60} {1:40}|").await;
        assert!(verdict.violations.iter().any(|v| matches!(
            v,
            Violation::MissingDependencies { part, missing }
                if part == "bor_sr_mod_60" && missing == &["licensed".to_string()]
        )));
    }

    #[tokio::test]
    async fn test_global_limit_exact_count() {
        // Two stray-tagged barrels against a cap of one.
        let verdict =
            verdict_for("41, 0, 1, 50| 2, 5||{99} {10} {20} {30} {32} {1:40}|").await;
        assert!(verdict.violations.iter().any(|v| matches!(
            v,
            Violation::GlobalLimitExceeded { tag, count: 2, max: 1 } if tag == "stray"
        )));
    }

    #[tokio::test]
    async fn test_unknown_ids_recorded_but_not_fatal() {
        let verdict =
            verdict_for("41, 0, 1, 50| 2, 5||{99} {10} {20} {30} {888} {777} {1:40}|").await;
        assert!(verdict.legitimate);
        assert_eq!(
            verdict.violations,
            vec![Violation::UnknownIds { ids: vec![777, 888] }]
        );
    }

    #[tokio::test]
    async fn test_unknown_ids_reported_after_rule_violations() {
        let verdict =
            verdict_for("41, 0, 1, 50| 2, 5||{99} {11} {20} {30} {888} {1:40}|").await;
        assert!(!verdict.legitimate);
        assert!(matches!(
            verdict.violations.last(),
            Some(Violation::UnknownIds { .. })
        ));
    }

    #[test]
    fn test_display_violations_capped() {
        let verdict = Verdict {
            legitimate: false,
            violations: (0..15)
                .map(|i| Violation::MissingParts {
                    slot: format!("slot{i}"),
                    count: 0,
                    min: 1,
                })
                .collect(),
            metadata: ValidationMetadata::default(),
        };
        assert_eq!(verdict.display_violations().len(), VIOLATION_DISPLAY_CAP);
    }
}
