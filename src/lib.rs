//! Adventure Engine: runtime and structural validator for branching
//! narratives.
//!
//! An adventure is a directed graph of text passages joined by choices.
//! Entering a passage may add items to, or remove them from, the reader's
//! inventory. This crate parses and serializes story documents, validates
//! them before play, walks them passage by passage, and persists reader
//! progress through a pluggable store.

pub mod core;
pub mod export;
pub mod schema;

pub use crate::core::format::{parse, serialize, Format, FormatError};
pub use crate::core::interpreter::{Action, Interpreter, Inventory, PlayState, Snapshot};
pub use crate::core::session::{PlaySession, SessionConfig, SessionError};
pub use crate::core::validator::{validate, ValidationReport};
pub use crate::schema::adventure::Adventure;
