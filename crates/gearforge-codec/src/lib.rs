//! Gearforge Codec - component string grammar and the serial codec client.
//!
//! A serial is an opaque external encoding; the codec service converts it to
//! and from the textual component string this crate parses and rebuilds.
//! Family-specific serialization quirks (token order, struct keys, the
//! leading space after `||`) live in per-family format specs, not in
//! conditional branches inside the encoding logic.

pub mod client;
pub mod component;
pub mod family;

pub use client::{item_name, CodecClient, CodecError, CodecTransport, Decoded, HttpTransport};
pub use component::{ParseError, ParsedComponents};
pub use family::{build_component_string, FamilyFormat};
