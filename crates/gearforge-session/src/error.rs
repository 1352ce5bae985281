//! Session error types.

use thiserror::Error;

use gearforge_codec::CodecError;
use gearforge_core::CatalogError;

/// Error raised by assembly session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Selection against a slot the balance does not declare. A programming
    /// error on the caller's side; never silently ignored.
    #[error("unknown slot `{0}`")]
    UnknownSlot(String),

    /// More parts offered than the slot's cardinality permits. The session
    /// rejects rather than silently truncating.
    #[error("slot `{slot}` accepts at most {max} parts, got {given}")]
    TooManySelections { slot: String, given: usize, max: u32 },

    /// Selection ids that resolve to no catalog part for the slot.
    #[error("unknown part ids for slot `{slot}`: {ids:?}")]
    UnknownPartIds { slot: String, ids: Vec<u32> },

    /// Mutation after the session reached a terminal state.
    #[error("session is closed")]
    Closed,

    /// The balance record offers no slot with any candidate part.
    #[error("balance `{0}` has no buildable slots")]
    NoBuildableSlots(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
