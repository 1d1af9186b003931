//! Entity tree node types.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Parsed entity table of one resource for one language.
pub type EntryMap = FxHashMap<CompactString, Entry>;

/// A named, localizable unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entry {
    /// Bare string entity, the common fast path.
    Simple(CompactString),
    /// Structured entity with a value, a variant index and/or attributes.
    Entity(Entity),
}

/// Structured entity node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    pub value: Option<Value>,
    pub index: Option<IndexExpr>,
    pub attrs: Option<FxHashMap<CompactString, Attr>>,
}

/// An attribute value. One nesting level only: attributes have no attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attr {
    Simple(CompactString),
    Node {
        value: Value,
        index: Option<IndexExpr>,
    },
}

/// An entity value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Literal string with no placeables.
    Literal(CompactString),
    /// Interpolated string: ordered literal/placeable fragments.
    Complex(Vec<Fragment>),
    /// Variant hash selected by an index expression.
    Hash(Hash),
}

/// One segment of an interpolated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fragment {
    Text(CompactString),
    /// `{{ id }}` placeable referencing an argument, a macro or an entity.
    Ref(CompactString),
}

/// Variant branches in source order, with an optional `*`-marked default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hash {
    pub items: Vec<(CompactString, Value)>,
    pub default_key: Option<CompactString>,
}

impl Hash {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }
}

/// Variant selector: `{[ n ]}` or `{[ plural(n) ]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexExpr {
    /// Bare identifier or variable reference.
    Ref(CompactString),
    /// `plural(arg)` macro call over a numeric argument.
    Plural(CompactString),
}

impl Entry {
    /// Wrap a parsed value, collapsing to the bare-string form when possible.
    pub fn from_parts(
        value: Option<Value>,
        index: Option<IndexExpr>,
        attrs: Option<FxHashMap<CompactString, Attr>>,
    ) -> Self {
        match (value, index, attrs) {
            (Some(Value::Literal(s)), None, None) => Entry::Simple(s),
            (value, index, attrs) => Entry::Entity(Entity {
                value,
                index,
                attrs,
            }),
        }
    }
}

impl Attr {
    /// Wrap a parsed attribute value, collapsing to the bare-string form.
    pub fn from_parts(value: Value, index: Option<IndexExpr>) -> Self {
        match (value, index) {
            (Value::Literal(s), None) => Attr::Simple(s),
            (value, index) => Attr::Node { value, index },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_entry_collapses() {
        let entry = Entry::from_parts(Some(Value::Literal("Hello".into())), None, None);
        assert_eq!(entry, Entry::Simple("Hello".into()));
    }

    #[test]
    fn indexed_entry_stays_structured() {
        let entry = Entry::from_parts(
            Some(Value::Literal("Hello".into())),
            Some(IndexExpr::Plural("n".into())),
            None,
        );
        assert!(matches!(entry, Entry::Entity(_)));
    }

    #[test]
    fn hash_lookup() {
        let hash = Hash {
            items: vec![
                ("one".into(), Value::Literal("1".into())),
                ("other".into(), Value::Literal("x".into())),
            ],
            default_key: Some("other".into()),
        };
        assert!(hash.contains("one"));
        assert!(!hash.contains("two"));
        assert_eq!(hash.get("other"), Some(&Value::Literal("x".into())));
    }
}
