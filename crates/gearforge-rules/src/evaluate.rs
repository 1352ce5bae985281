//! Constraint evaluation.
//!
//! Given the build's aggregate tag state, decides whether a candidate part
//! is currently selectable and why not if not. The slot-wide status list is
//! a first-class output: callers render it directly, locked options
//! included.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use gearforge_core::{Part, TagAggregate};

use crate::loader::{match_rule_part_name, GlobalTagRule, SlotRule};

/// Verdict for one candidate part against the current tag state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Valid,
    /// One of the part's exclusion tags is present elsewhere in the build.
    Excluded { conflicting: Vec<String> },
    /// Required tags are not present.
    MissingDependencies { missing: Vec<String> },
    /// Selecting the part would push a global tag rule past its cap.
    OverLimit { tag: String },
}

impl Eligibility {
    pub fn is_valid(&self) -> bool {
        matches!(self, Eligibility::Valid)
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Valid => Ok(()),
            Eligibility::Excluded { .. } => write!(f, "Incompatible (Exclusion)"),
            Eligibility::MissingDependencies { missing } => {
                write!(f, "Requires: {}", missing.join(", "))
            }
            Eligibility::OverLimit { tag } => write!(f, "Max Limit ({tag})"),
        }
    }
}

/// One entry of a slot's option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartStatus {
    pub part: Part,
    pub verdict: Eligibility,
}

impl PartStatus {
    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }

    /// Render label: part name, stats appended when the row carries them.
    pub fn display_label(&self) -> String {
        match &self.part.stats {
            Some(stats) => format!("{} ({stats})", self.part.name),
            None => self.part.name.clone(),
        }
    }
}

/// Evaluates a single candidate against the current tag state.
///
/// `already_selected` marks a candidate that is part of the build right now,
/// so `current` contains its own contribution; self-counting is subtracted
/// before the exclusion and global-limit checks. Dependency tags are checked
/// against the full tag set either way.
///
/// Check order is fixed: exclusion, then dependency, then global limits.
pub fn evaluate_part(
    part: &Part,
    current: &TagAggregate,
    global_rules: &[GlobalTagRule],
    already_selected: bool,
) -> Eligibility {
    let own: &[String] = if already_selected { &part.add_tags } else { &[] };

    let mut conflicting: Vec<String> = part
        .exclusion_set()
        .into_iter()
        .filter(|tag| current.occurrences_excluding(tag, own) > 0)
        .collect();
    if !conflicting.is_empty() {
        conflicting.sort();
        debug!(part = %part.name, tags = ?conflicting, "candidate excluded");
        return Eligibility::Excluded { conflicting };
    }

    let deps = part.dependency_set();
    if !deps.is_empty() && !deps.is_subset(current.as_set()) {
        let mut missing: Vec<String> = deps.difference(current.as_set()).cloned().collect();
        missing.sort();
        debug!(part = %part.name, missing = ?missing, "candidate missing dependencies");
        return Eligibility::MissingDependencies { missing };
    }

    for rule in global_rules {
        let new_adds = part
            .add_tags
            .iter()
            .filter(|t| rule.tags.contains(*t))
            .count();
        if new_adds == 0 {
            continue;
        }
        let current_count = current.count_in_excluding(&rule.tags, own);
        if current_count + new_adds > rule.max {
            let tag = rule.display_tag();
            debug!(part = %part.name, %tag, current_count, new_adds, max = rule.max,
                "candidate over global limit");
            return Eligibility::OverLimit { tag };
        }
    }

    Eligibility::Valid
}

/// Builds the full option list for one slot.
///
/// Candidates filtered out by the slot's allow-list are dropped entirely;
/// candidates blocked by tags are kept with their reason so callers can show
/// them locked.
pub fn slot_status(
    candidates: Vec<Part>,
    rule: &SlotRule,
    current: &TagAggregate,
    selected_ids: &HashSet<u32>,
    global_rules: &[GlobalTagRule],
) -> Vec<PartStatus> {
    let mut statuses = Vec::with_capacity(candidates.len());
    for part in candidates {
        if let Some(allowed) = &rule.allowed_parts {
            let identification = part.identification_tags();
            let permitted = allowed
                .iter()
                .any(|r| match_rule_part_name(&part.name, &identification, r, &part.inv_type));
            if !permitted {
                debug!(part = %part.name, "candidate not in allow-list");
                continue;
            }
        }
        let already_selected = selected_ids.contains(&part.serial_index);
        let verdict = evaluate_part(&part, current, global_rules, already_selected);
        statuses.push(PartStatus { part, verdict });
    }
    statuses
}
