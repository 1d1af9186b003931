//! Entity tree for Glossa resources.
//!
//! Both resource grammars parse into the same shape: a map from entity id to
//! a tagged value tree. The resolver dispatches on the tags through a single
//! match per node kind, never by sniffing shapes at call sites.

pub mod ast;
pub mod errors;
pub mod walk;

pub use ast::{Attr, Entity, Entry, EntryMap, Fragment, Hash, IndexExpr, Value};
pub use errors::{Error, EventKind};
pub use walk::{walk_entry, walk_value};
