//! Gearforge Session - interactive assembly and whole-item validation.
//!
//! An [`AssemblySession`] walks a user through picking parts slot by slot,
//! recomputing the valid-options set after every pick, and finally encodes
//! the build into a serial. [`validate_serial`] runs the same rule engine as
//! a stateless single pass over an existing item.

pub mod error;
pub mod session;
pub mod validate;

#[cfg(test)]
mod session_tests;
#[cfg(test)]
pub(crate) mod test_utils;

pub use error::SessionError;
pub use session::{AssemblySession, SessionState};
pub use validate::{
    validate_assembled, validate_serial, ValidateError, ValidationMetadata, Verdict, Violation,
    VIOLATION_DISPLAY_CAP,
};
