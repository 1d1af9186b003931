//! Shared error type and the event-channel vocabulary.
//!
//! Content-related failures never cross a batch-resolve boundary; they are
//! emitted on the environment's event channel and recovered locally. The
//! variants below cover both parse-time and resolve-time failures so that
//! negative cache slots can store them whole.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{message}")]
    Parse { message: String },

    #[error("duplicate {what} \"{key}\"")]
    Duplicate {
        what: &'static str,
        key: CompactString,
    },

    #[error("cyclic reference detected")]
    Cyclic,

    #[error("unknown reference: {id}")]
    UnknownReference { id: CompactString },

    #[error("\"{}\" not found {}", fmt_ids(.ids), fmt_scope(.lang))]
    NotFound {
        ids: Vec<CompactString>,
        lang: Option<CompactString>,
    },

    #[error("arg must be a string or a number: {id}")]
    InvalidArgType { id: CompactString },

    #[error("illegal id: {id}")]
    IllegalId { id: CompactString },

    #[error("unresolvable value")]
    Unresolved,

    #[error("too many characters in placeable ({len}, max allowed is {max})")]
    OversizedPlaceable { len: usize, max: usize },

    #[error("too many placeables ({count}, max allowed is {max})")]
    TooManyPlaceables { count: usize, max: usize },

    #[error("malformed index")]
    MalformedIndex,

    #[error("failed to fetch {resource}: {message}")]
    Fetch {
        resource: CompactString,
        message: String,
    },

    #[error("no parser for resource format \"{ext}\"")]
    UnknownFormat { ext: CompactString },
}

fn fmt_ids(ids: &[CompactString]) -> String {
    ids.join(", ")
}

fn fmt_scope(lang: &Option<CompactString>) -> String {
    match lang {
        Some(lang) => format!("in {lang}"),
        None => "in any language".into(),
    }
}

/// Event kinds carried on the environment's error/event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ParserError,
    DuplicateError,
    NotFoundError,
    ResolveError,
    FetchError,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::ParserError => "parsererror",
            EventKind::DuplicateError => "duplicateerror",
            EventKind::NotFoundError => "notfounderror",
            EventKind::ResolveError => "resolveerror",
            EventKind::FetchError => "fetcherror",
        }
    }
}
