//! Line-oriented properties grammar.
//!
//! `key = value` lines, where the key encodes structure: `name.attr` targets
//! an attribute, `name[key]` a variant branch, `name.attr[key]` both. A
//! string entry whose value is a `{[ selector ]}` descriptor turns into a
//! variant hash the moment its first branch line arrives; the descriptor is
//! then reparsed as the hash's index.

use std::borrow::Cow;
use std::collections::hash_map::Entry as Slot;

use compact_str::CompactString;
use once_cell::sync::Lazy;
use regex::Regex;

use glossa_tree::{Attr, Entity, Entry, EntryMap, Error, Fragment, Hash, IndexExpr, Value};

use crate::{emit_kind, Emit};

const MAX_PLACEABLES: usize = 100;

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#|^\s*$").unwrap());
static RE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^=\s]+)\s*=\s*(.*)$").unwrap());
static RE_MULTILINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\\]\\$").unwrap());
static RE_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\[\s*(\w+)(?:\(([^)]*)\))?\s*\]\}").unwrap());
static RE_UNICODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\u([0-9a-fA-F]{1,4})").unwrap());
static RE_CONTROL: Lazy<Regex> =
    Lazy::new(|| Regex::new("\\\\([\\\\\n\r\t\u{8}\u{c}{}\"'])").unwrap());
static RE_PLACEABLES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*(\S*?)\s*\}\}").unwrap());

/// Parse a properties-grammar resource.
pub fn parse_properties(source: &str, mut emit: Option<Emit<'_>>) -> Result<EntryMap, Error> {
    let mut entries = EntryMap::default();
    let lines: Vec<&str> = source.lines().filter(|line| !line.is_empty()).collect();

    let mut i = 0;
    while i < lines.len() {
        let mut line: Cow<'_, str> = Cow::Borrowed(lines[i]);

        if RE_COMMENT.is_match(&line) {
            i += 1;
            continue;
        }

        // A trailing unescaped backslash continues the value on the next line.
        while RE_MULTILINE.is_match(&line) && i + 1 < lines.len() {
            i += 1;
            let mut joined = line.into_owned();
            joined.pop();
            joined.push_str(lines[i].trim());
            line = Cow::Owned(joined);
        }

        if let Some(caps) = RE_ENTITY.captures(&line) {
            let result = parse_entity(&caps[1], &caps[2], &mut entries);
            if let Err(err) = result {
                match emit.as_mut() {
                    Some(emit) => emit(emit_kind(&err), err),
                    None => return Err(err),
                }
            }
        }

        i += 1;
    }

    Ok(entries)
}

fn parse_entity(id: &str, value: &str, entries: &mut EntryMap) -> Result<(), Error> {
    let (name, key) = match id.find('[') {
        Some(pos) => {
            let inner = &id[pos + 1..];
            (&id[..pos], Some(inner.strip_suffix(']').unwrap_or(inner)))
        }
        None => (id, None),
    };

    let mut parts = name.split('.');
    let name = parts.next().unwrap_or(name);
    let attr = parts.next();
    if parts.next().is_some() {
        return Err(Error::Parse {
            message: format!("Error in ID: \"{name}\". Nested attributes are not supported."),
        });
    }
    if let Some(attr) = attr {
        if attr.starts_with('$') {
            return Err(Error::Parse {
                message: "Attribute can't start with \"$\"".into(),
            });
        }
    }

    set_entity_value(name, attr, key, &unescape(value), entries)
}

fn set_entity_value(
    name: &str,
    attr: Option<&str>,
    key: Option<&str>,
    raw: &str,
    entries: &mut EntryMap,
) -> Result<(), Error> {
    let value = if raw.contains("{{") {
        parse_placeables(raw)?
    } else {
        Value::Literal(raw.into())
    };

    match (attr, key) {
        (None, None) => set_base_value(name, value, entries),
        (Some(attr), None) => {
            let entity = entity_mut(name, entries);
            let attrs = entity.attrs.get_or_insert_with(Default::default);
            match attrs.entry(CompactString::from(attr)) {
                Slot::Vacant(slot) => {
                    slot.insert(Attr::from_parts(value, None));
                    Ok(())
                }
                Slot::Occupied(mut slot) => match slot.get_mut() {
                    Attr::Simple(_) => Err(Error::Duplicate {
                        what: "attribute",
                        key: format_id(name, Some(attr), None),
                    }),
                    Attr::Node {
                        value: existing, ..
                    } => {
                        *existing = value;
                        Ok(())
                    }
                },
            }
        }
        (None, Some(key)) => {
            let entity = entity_mut(name, entries);
            if let Some(Value::Literal(descriptor)) = &entity.value {
                let index = parse_index(descriptor)?;
                entity.index = Some(index);
                entity.value = Some(Value::Hash(Hash::default()));
            } else if entity.value.is_none() {
                entity.value = Some(Value::Hash(Hash::default()));
            }
            let hash = match &mut entity.value {
                Some(Value::Hash(hash)) => hash,
                _ => {
                    return Err(Error::Parse {
                        message: format!("\"{name}\" cannot take the branch \"{key}\""),
                    })
                }
            };
            insert_branch(hash, name, key, value)
        }
        (Some(attr), Some(key)) => {
            let entity = entity_mut(name, entries);
            let attrs = entity.attrs.get_or_insert_with(Default::default);
            if let Some(Attr::Simple(descriptor)) = attrs.get(attr) {
                let index = parse_index(descriptor)?;
                attrs.insert(
                    attr.into(),
                    Attr::Node {
                        value: Value::Hash(Hash::default()),
                        index: Some(index),
                    },
                );
            }
            let node = attrs.entry(attr.into()).or_insert_with(|| Attr::Node {
                value: Value::Hash(Hash::default()),
                index: None,
            });
            let hash = match node {
                Attr::Node {
                    value: Value::Hash(hash),
                    ..
                } => hash,
                _ => {
                    return Err(Error::Parse {
                        message: format!("\"{name}.{attr}\" cannot take the branch \"{key}\""),
                    })
                }
            };
            insert_branch(hash, name, key, value)
        }
    }
}

/// `name = value` with no structure in the key.
fn set_base_value(name: &str, value: Value, entries: &mut EntryMap) -> Result<(), Error> {
    match entries.entry(CompactString::from(name)) {
        Slot::Vacant(slot) => {
            slot.insert(Entry::from_parts(Some(value), None, None));
            Ok(())
        }
        Slot::Occupied(mut slot) => match slot.get_mut() {
            Entry::Simple(_) => Err(Error::Duplicate {
                what: "entry id",
                key: name.into(),
            }),
            // A structured line arrived first; this line fills the value in.
            Entry::Entity(entity) => {
                entity.value = Some(value);
                Ok(())
            }
        },
    }
}

/// Fetch the structured entity for `name`, upgrading a bare string in place.
fn entity_mut<'a>(name: &str, entries: &'a mut EntryMap) -> &'a mut Entity {
    let entry = entries
        .entry(name.into())
        .or_insert_with(|| Entry::Entity(Entity::default()));
    if let Entry::Simple(s) = entry {
        let value = std::mem::take(s);
        *entry = Entry::Entity(Entity {
            value: Some(Value::Literal(value)),
            index: None,
            attrs: None,
        });
    }
    match entry {
        Entry::Entity(entity) => entity,
        Entry::Simple(_) => unreachable!("upgraded above"),
    }
}

fn insert_branch(hash: &mut Hash, name: &str, key: &str, value: Value) -> Result<(), Error> {
    if hash.contains(key) {
        return Err(Error::Duplicate {
            what: "hash key",
            key: format_id(name, None, Some(key)),
        });
    }
    hash.items.push((key.into(), value));
    Ok(())
}

fn format_id(name: &str, attr: Option<&str>, key: Option<&str>) -> CompactString {
    let mut id = CompactString::from(name);
    if let Some(attr) = attr {
        id.push('.');
        id.push_str(attr);
    }
    if let Some(key) = key {
        id.push('[');
        id.push_str(key);
        id.push(']');
    }
    id
}

/// Split a value on `{{ id }}` placeables into an interpolated fragment list.
fn parse_placeables(raw: &str) -> Result<Value, Error> {
    let count = RE_PLACEABLES.find_iter(raw).count();
    if count >= MAX_PLACEABLES {
        return Err(Error::TooManyPlaceables {
            count,
            max: MAX_PLACEABLES,
        });
    }
    if count == 0 {
        return Ok(Value::Literal(raw.into()));
    }

    let mut fragments = Vec::new();
    let mut last = 0;
    for caps in RE_PLACEABLES.captures_iter(raw) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        if whole.start() > last {
            fragments.push(Fragment::Text(raw[last..whole.start()].into()));
        }
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        fragments.push(Fragment::Ref(name.strip_prefix('$').unwrap_or(name).into()));
        last = whole.end();
    }
    if last < raw.len() {
        fragments.push(Fragment::Text(raw[last..].into()));
    }

    Ok(Value::Complex(fragments))
}

/// Reparse a former string value as a `{[ selector ]}` index descriptor.
fn parse_index(descriptor: &str) -> Result<IndexExpr, Error> {
    let caps = RE_INDEX
        .captures(descriptor)
        .ok_or(Error::MalformedIndex)?;
    match caps.get(2) {
        Some(arg) => {
            let arg = arg.as_str().trim();
            Ok(IndexExpr::Plural(
                arg.strip_prefix('$').unwrap_or(arg).into(),
            ))
        }
        None => {
            let name = &caps[1];
            Ok(IndexExpr::Ref(
                name.strip_prefix('$').unwrap_or(name).into(),
            ))
        }
    }
}

/// Resolve backslash escapes and `\uXXXX` sequences.
fn unescape(raw: &str) -> String {
    let unescaped = if raw.rfind('\\').is_some() {
        RE_CONTROL.replace_all(raw, "$1")
    } else {
        Cow::Borrowed(raw)
    };
    RE_UNICODE
        .replace_all(&unescaped, |caps: &regex::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}
