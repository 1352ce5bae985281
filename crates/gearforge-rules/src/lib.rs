//! Gearforge Rules - rule catalog loading and constraint evaluation.
//!
//! This crate turns raw balance-record JSON into normalized rules (per-slot
//! cardinality, global tag limits, allow-lists) and decides, for a candidate
//! part or a whole build, whether the accumulated tag state permits it.

pub mod classify;
pub mod evaluate;
pub mod loader;

pub use classify::SlotClassifier;
pub use evaluate::{evaluate_part, slot_status, Eligibility, PartStatus};
pub use loader::{match_rule_part_name, GlobalTagRule, SlotRule, SlotRules};
