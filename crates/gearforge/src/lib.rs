//! Gearforge - an item rule engine for serialized loot items.
//!
//! Decode item serials into their component parts, validate assembled items
//! against part-compatibility rules, and build new items interactively slot
//! by slot.
//!
//! # Example
//!
//! ```rust
//! use gearforge::prelude::*;
//!
//! // Component strings are re-exported from the codec crate
//! let parsed = ParsedComponents::parse("5, 0, 1, 20| 2, 999||{1} {2} {3}|").unwrap();
//! assert_eq!(parsed.item_id, "1");
//! assert_eq!(parsed.item_part_ids, vec![2, 3]);
//! ```

pub mod logging;

// Data model and tag algebra
pub use gearforge_core::{
    decode_tags, tag_set, tags_disjoint, tags_subset, BalanceRecord, CatalogError, MemoryCatalog,
    Part, PartCatalog, RecordError, SlotCensus, TagAggregate,
};

// Rule loading and constraint evaluation
pub use gearforge_rules::{
    evaluate_part, match_rule_part_name, slot_status, Eligibility, GlobalTagRule, PartStatus,
    SlotClassifier, SlotRule, SlotRules,
};

// Component string grammar and the serial codec client
pub use gearforge_codec::{
    build_component_string, item_name, CodecClient, CodecError, CodecTransport, Decoded,
    FamilyFormat, HttpTransport, ParseError, ParsedComponents,
};

// Interactive assembly and whole-item validation
pub use gearforge_session::{
    validate_assembled, validate_serial, AssemblySession, SessionError, SessionState,
    ValidateError, ValidationMetadata, Verdict, Violation, VIOLATION_DISPLAY_CAP,
};

pub mod prelude {
    pub use super::{
        validate_serial, AssemblySession, BalanceRecord, CodecClient, Eligibility, FamilyFormat,
        Part, PartCatalog, ParsedComponents, SessionState, TagAggregate, Verdict, Violation,
    };
}
