//! Flat JSON resources.
//!
//! A shorthand grammar for simple tables: one object, string values only.
//! Non-string values are per-entity failures; a malformed document fails the
//! whole resource even in lenient mode, since nothing after the error can be
//! trusted.

use glossa_tree::{Entry, EntryMap, Error};

use crate::{emit_kind, Emit};

/// Parse a flat JSON resource.
pub fn parse_json(source: &str, mut emit: Option<Emit<'_>>) -> Result<EntryMap, Error> {
    let parsed: serde_json::Value = match serde_json::from_str(source) {
        Ok(parsed) => parsed,
        Err(err) => {
            let err = Error::Parse {
                message: format!("invalid JSON resource: {err}"),
            };
            return match emit.as_mut() {
                Some(emit) => {
                    emit(emit_kind(&err), err);
                    Ok(EntryMap::default())
                }
                None => Err(err),
            };
        }
    };

    let serde_json::Value::Object(object) = parsed else {
        let err = Error::Parse {
            message: "JSON resource must be an object".into(),
        };
        return match emit.as_mut() {
            Some(emit) => {
                emit(emit_kind(&err), err);
                Ok(EntryMap::default())
            }
            None => Err(err),
        };
    };

    let mut entries = EntryMap::default();
    for (id, value) in object {
        match value {
            serde_json::Value::String(s) => {
                entries.insert(id.into(), Entry::Simple(s.into()));
            }
            _ => {
                let err = Error::Parse {
                    message: format!("JSON resource value for \"{id}\" must be a string"),
                };
                match emit.as_mut() {
                    Some(emit) => emit(emit_kind(&err), err),
                    None => return Err(err),
                }
            }
        }
    }

    Ok(entries)
}
