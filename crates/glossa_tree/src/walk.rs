//! Pure mapping walk over an entry tree.
//!
//! Used by the pseudo-locale synthesis: every piece of translatable text is
//! passed through the supplied function, while placeable references and
//! index descriptors pass through untouched.

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::ast::{Attr, Entity, Entry, Fragment, Hash, Value};

/// Map `f` over every text node of an entry, returning a new entry.
pub fn walk_entry<F>(entry: &Entry, f: &F) -> Entry
where
    F: Fn(&str) -> CompactString,
{
    match entry {
        Entry::Simple(s) => Entry::Simple(f(s)),
        Entry::Entity(entity) => Entry::Entity(Entity {
            value: entity.value.as_ref().map(|v| walk_value(v, f)),
            index: entity.index.clone(),
            attrs: entity.attrs.as_ref().map(|attrs| {
                attrs
                    .iter()
                    .map(|(k, attr)| (k.clone(), walk_attr(attr, f)))
                    .collect::<FxHashMap<_, _>>()
            }),
        }),
    }
}

/// Map `f` over every text node of a value, returning a new value.
pub fn walk_value<F>(value: &Value, f: &F) -> Value
where
    F: Fn(&str) -> CompactString,
{
    match value {
        Value::Literal(s) => Value::Literal(f(s)),
        Value::Complex(fragments) => Value::Complex(
            fragments
                .iter()
                .map(|frag| match frag {
                    Fragment::Text(s) => Fragment::Text(f(s)),
                    Fragment::Ref(id) => Fragment::Ref(id.clone()),
                })
                .collect(),
        ),
        Value::Hash(hash) => Value::Hash(Hash {
            items: hash
                .items
                .iter()
                .map(|(k, v)| (k.clone(), walk_value(v, f)))
                .collect(),
            default_key: hash.default_key.clone(),
        }),
    }
}

fn walk_attr<F>(attr: &Attr, f: &F) -> Attr
where
    F: Fn(&str) -> CompactString,
{
    match attr {
        Attr::Simple(s) => Attr::Simple(f(s)),
        Attr::Node { value, index } => Attr::Node {
            value: walk_value(value, f),
            index: index.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::IndexExpr;

    fn upper(s: &str) -> CompactString {
        s.to_uppercase().into()
    }

    #[test]
    fn walks_simple_entries() {
        let entry = Entry::Simple("hello".into());
        assert_eq!(walk_entry(&entry, &upper), Entry::Simple("HELLO".into()));
    }

    #[test]
    fn leaves_placeables_untouched() {
        let entry = Entry::Entity(Entity {
            value: Some(Value::Complex(vec![
                Fragment::Text("hi ".into()),
                Fragment::Ref("name".into()),
            ])),
            index: None,
            attrs: None,
        });

        let walked = walk_entry(&entry, &upper);
        let Entry::Entity(entity) = walked else {
            panic!("expected structured entity");
        };
        assert_eq!(
            entity.value,
            Some(Value::Complex(vec![
                Fragment::Text("HI ".into()),
                Fragment::Ref("name".into()),
            ]))
        );
    }

    #[test]
    fn walks_hash_branches_and_keeps_index() {
        let entry = Entry::Entity(Entity {
            value: Some(Value::Hash(Hash {
                items: vec![
                    ("one".into(), Value::Literal("file".into())),
                    ("other".into(), Value::Literal("files".into())),
                ],
                default_key: Some("other".into()),
            })),
            index: Some(IndexExpr::Plural("n".into())),
            attrs: None,
        });

        let Entry::Entity(entity) = walk_entry(&entry, &upper) else {
            panic!("expected structured entity");
        };
        assert_eq!(entity.index, Some(IndexExpr::Plural("n".into())));
        let Some(Value::Hash(hash)) = entity.value else {
            panic!("expected hash value");
        };
        assert_eq!(hash.get("one"), Some(&Value::Literal("FILE".into())));
        assert_eq!(hash.default_key, Some("other".into()));
    }
}
