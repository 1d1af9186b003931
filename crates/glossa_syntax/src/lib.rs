//! Resource grammar parsers for Glossa.
//!
//! Two source grammars (plus a flat-JSON shorthand) produce the same
//! [`glossa_tree::EntryMap`] shape. Each parser runs in one of two modes:
//! with an `emit` callback, per-entity failures are reported and parsing
//! resumes with the next entity (lenient mode); without one, the first
//! failure aborts the whole resource (strict mode).

pub mod json;
pub mod l20n;
pub mod properties;

use glossa_tree::{Error, EventKind};

pub use json::parse_json;
pub use l20n::parse_l20n;
pub use properties::parse_properties;

/// Error sink used by the lenient parse mode.
pub type Emit<'a> = &'a mut dyn FnMut(EventKind, Error);

/// Event-channel kind a parse-stage error is reported under.
pub(crate) fn emit_kind(err: &Error) -> EventKind {
    match err {
        Error::Duplicate { .. } => EventKind::DuplicateError,
        _ => EventKind::ParserError,
    }
}
