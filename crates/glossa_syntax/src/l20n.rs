//! Declarative resource grammar.
//!
//! Entities look like `<id "value">`, `<id { one: "x", *other: "y" }>` or
//! `<id[plural(n)] { ... }>`, with optional `key: value` attributes before
//! the closing `>`. The parser is a recursive descent over an explicit state
//! record; in lenient mode a malformed entity is reported and the cursor
//! skips to the next `<` or comment, so one bad entity never aborts the
//! resource.

use compact_str::CompactString;
use memchr::{memchr, memmem};
use rustc_hash::FxHashMap;

use glossa_tree::{Attr, Entry, EntryMap, Error, Fragment, Hash, IndexExpr, Value};

use crate::{emit_kind, Emit};

const MAX_PLACEABLES: usize = 100;

/// Parse a declarative-grammar resource.
pub fn parse_l20n(source: &str, emit: Option<Emit<'_>>) -> Result<EntryMap, Error> {
    Parser {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        entries: EntryMap::default(),
        emit,
    }
    .parse()
}

struct Parser<'s, 'e> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    entries: EntryMap,
    emit: Option<Emit<'e>>,
}

impl Parser<'_, '_> {
    fn parse(mut self) -> Result<EntryMap, Error> {
        self.skip_ws();
        while self.pos < self.bytes.len() {
            if let Err(err) = self.entry() {
                self.skip_junk();
                match self.emit.as_mut() {
                    Some(emit) => emit(emit_kind(&err), err),
                    None => return Err(err),
                }
            }
            if self.pos < self.bytes.len() {
                self.skip_ws();
            }
        }
        Ok(self.entries)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\n' | b'\t' | b'\r')) {
            self.pos += 1;
        }
    }

    fn require_ws(&mut self) -> bool {
        let start = self.pos;
        self.skip_ws();
        self.pos != start
    }

    fn entry(&mut self) -> Result<(), Error> {
        if self.peek() == Some(b'<') {
            self.pos += 1;
            let id = self.identifier()?;
            let index = if self.peek() == Some(b'[') {
                self.pos += 1;
                Some(self.index_expr()?)
            } else {
                None
            };
            return self.entity(id, index);
        }

        if self.source[self.pos..].starts_with("/*") {
            return self.comment();
        }

        Err(self.error("Invalid entry"))
    }

    fn entity(&mut self, id: CompactString, index: Option<IndexExpr>) -> Result<(), Error> {
        if !self.require_ws() {
            return Err(self.error("Expected white space"));
        }

        let ch = self.peek();
        let value = if index.is_some() {
            Some(self.value()?)
        } else {
            self.value_opt()?
        };

        let attrs = if value.is_none() {
            if ch == Some(b'>') {
                return Err(self.error("Expected \">\""));
            }
            Some(self.attributes()?)
        } else {
            let ws1 = self.require_ws();
            if self.peek() != Some(b'>') {
                if !ws1 {
                    return Err(self.error("Expected \">\""));
                }
                Some(self.attributes()?)
            } else {
                None
            }
        };

        if self.peek() != Some(b'>') {
            return Err(self.error("Expected \">\""));
        }
        self.pos += 1;

        if self.entries.contains_key(&id) {
            return Err(Error::Duplicate {
                what: "entry id",
                key: id,
            });
        }
        self.entries.insert(id, Entry::from_parts(value, index, attrs));
        Ok(())
    }

    fn value_opt(&mut self) -> Result<Option<Value>, Error> {
        match self.peek() {
            Some(q @ (b'\'' | b'"')) => Ok(Some(self.string(q)?)),
            Some(b'{') => Ok(Some(Value::Hash(self.hash()?))),
            _ => Ok(None),
        }
    }

    fn value(&mut self) -> Result<Value, Error> {
        match self.value_opt()? {
            Some(value) => Ok(value),
            None => Err(self.error("Unknown value type")),
        }
    }

    fn string(&mut self, quote: u8) -> Result<Value, Error> {
        self.pos += 1;
        let mut body: Vec<Fragment> = Vec::new();
        let mut buf = String::new();
        let mut frag_start = self.pos;
        let mut placeables = 0usize;

        loop {
            let mut i = self.pos;
            let at = loop {
                match self.bytes.get(i).copied() {
                    None => return Err(self.error("Unclosed string literal")),
                    Some(b) if b == quote || b == b'\\' => break i,
                    Some(b'{') if self.bytes.get(i + 1) == Some(&b'{') => break i,
                    Some(_) => i += 1,
                }
            };

            match self.bytes[at] {
                b if b == quote => {
                    buf.push_str(&self.source[frag_start..at]);
                    self.pos = at + 1;
                    if body.is_empty() {
                        return Ok(Value::Literal(buf.into()));
                    }
                    if !buf.is_empty() {
                        body.push(Fragment::Text(buf.into()));
                    }
                    return Ok(Value::Complex(body));
                }
                b'{' => {
                    if placeables > MAX_PLACEABLES - 1 {
                        return Err(Error::TooManyPlaceables {
                            count: placeables + 1,
                            max: MAX_PLACEABLES,
                        });
                    }
                    placeables += 1;

                    if at > frag_start || !buf.is_empty() {
                        buf.push_str(&self.source[frag_start..at]);
                        body.push(Fragment::Text(std::mem::take(&mut buf).into()));
                    }

                    self.pos = at + 2;
                    self.skip_ws();
                    let name = self.placeable_name()?;
                    self.skip_ws();
                    if !self.source[self.pos..].starts_with("}}") {
                        return Err(self.error("Expected \"}}\""));
                    }
                    self.pos += 2;
                    body.push(Fragment::Ref(name));
                    frag_start = self.pos;
                }
                _ => {
                    // backslash escape
                    buf.push_str(&self.source[frag_start..at]);
                    self.pos = at + 1;
                    match self.peek() {
                        Some(b'u') => {
                            let ch = self.unicode_char()?;
                            buf.push(ch);
                        }
                        Some(c) if c == quote || c == b'\\' => {
                            buf.push(c as char);
                            self.pos += 1;
                        }
                        _ if self.source[self.pos..].starts_with("{{") => {
                            buf.push_str("{{");
                            self.pos += 2;
                        }
                        _ => return Err(self.error("Illegal escape sequence")),
                    }
                    frag_start = self.pos;
                }
            }
        }
    }

    /// `\uXXXX`, cursor on the `u`.
    fn unicode_char(&mut self) -> Result<char, Error> {
        let start = self.pos + 1;
        for i in 0..4 {
            match self.bytes.get(start + i) {
                Some(b) if b.is_ascii_hexdigit() => {}
                _ => return Err(self.error("Illegal unicode escape sequence")),
            }
        }
        self.pos = start + 4;
        u32::from_str_radix(&self.source[start..start + 4], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("Illegal unicode escape sequence"))
    }

    fn placeable_name(&mut self) -> Result<CompactString, Error> {
        if matches!(self.peek(), Some(b'$' | b'@')) {
            self.pos += 1;
        }
        self.identifier()
    }

    fn index_expr(&mut self) -> Result<IndexExpr, Error> {
        self.skip_ws();
        let expr = if self.peek() == Some(b'@') {
            // long form: @cldr.plural(n)
            self.pos += 1;
            let glob = self.identifier()?;
            if glob != "cldr" || self.peek() != Some(b'.') {
                return Err(self.error("Malformed index"));
            }
            self.pos += 1;
            let prop = self.identifier()?;
            if prop != "plural" || self.peek() != Some(b'(') {
                return Err(self.error("Malformed index"));
            }
            IndexExpr::Plural(self.call_arg()?)
        } else {
            if self.peek() == Some(b'$') {
                self.pos += 1;
            }
            let name = self.identifier()?;
            if self.peek() == Some(b'(') {
                if name != "plural" {
                    return Err(self.error("Malformed index"));
                }
                IndexExpr::Plural(self.call_arg()?)
            } else {
                IndexExpr::Ref(name)
            }
        };

        self.skip_ws();
        if self.peek() != Some(b']') {
            return Err(self.error("Expected \"]\""));
        }
        self.pos += 1;
        Ok(expr)
    }

    /// `(arg)`, cursor on the opening parenthesis.
    fn call_arg(&mut self) -> Result<CompactString, Error> {
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b'$') {
            self.pos += 1;
        }
        let arg = self.identifier()?;
        self.skip_ws();
        if self.peek() != Some(b')') {
            return Err(self.error("Expected \")\""));
        }
        self.pos += 1;
        Ok(arg)
    }

    fn attributes(&mut self) -> Result<FxHashMap<CompactString, Attr>, Error> {
        let mut attrs = FxHashMap::default();
        loop {
            self.attribute(&mut attrs)?;
            let ws1 = self.require_ws();
            match self.peek() {
                Some(b'>') => break,
                _ if !ws1 => return Err(self.error("Expected \">\"")),
                _ => {}
            }
        }
        Ok(attrs)
    }

    fn attribute(&mut self, attrs: &mut FxHashMap<CompactString, Attr>) -> Result<(), Error> {
        let key = self.identifier()?;
        let index = if self.peek() == Some(b'[') {
            self.pos += 1;
            Some(self.index_expr()?)
        } else {
            None
        };
        self.skip_ws();
        if self.peek() != Some(b':') {
            return Err(self.error("Expected \":\""));
        }
        self.pos += 1;
        self.skip_ws();
        let value = self.value()?;

        if attrs.contains_key(&key) {
            return Err(Error::Duplicate {
                what: "attribute",
                key,
            });
        }
        attrs.insert(key, Attr::from_parts(value, index));
        Ok(())
    }

    fn hash(&mut self) -> Result<Hash, Error> {
        self.pos += 1;
        self.skip_ws();
        let mut hash = Hash::default();

        loop {
            let (key, value, default) = self.hash_item()?;
            if hash.contains(&key) {
                return Err(Error::Duplicate {
                    what: "hash key",
                    key,
                });
            }
            if default {
                if hash.default_key.is_some() {
                    return Err(self.error("Default item redefinition forbidden"));
                }
                hash.default_key = Some(key.clone());
            }
            hash.items.push((key, value));

            self.skip_ws();
            let comma = self.peek() == Some(b',');
            if comma {
                self.pos += 1;
                self.skip_ws();
            }
            if self.peek() == Some(b'}') {
                self.pos += 1;
                break;
            }
            if !comma {
                return Err(self.error("Expected \"}\""));
            }
        }

        Ok(hash)
    }

    fn hash_item(&mut self) -> Result<(CompactString, Value, bool), Error> {
        let default = self.peek() == Some(b'*');
        if default {
            self.pos += 1;
        }
        let key = self.identifier()?;
        self.skip_ws();
        if self.peek() != Some(b':') {
            return Err(self.error("Expected \":\""));
        }
        self.pos += 1;
        self.skip_ws();
        Ok((key, self.value()?, default))
    }

    fn identifier(&mut self) -> Result<CompactString, Error> {
        let start = self.pos;
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.pos += 1,
            _ => return Err(self.error("Identifier has to start with [a-zA-Z_]")),
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        Ok(self.source[start..self.pos].into())
    }

    fn comment(&mut self) -> Result<(), Error> {
        self.pos += 2;
        match memmem::find(&self.bytes[self.pos..], b"*/") {
            Some(offset) => {
                self.pos += offset + 2;
                Ok(())
            }
            None => Err(self.error("Comment without a closing tag")),
        }
    }

    /// Lenient-mode recovery: skip to the next entity or comment opener.
    fn skip_junk(&mut self) {
        let rest = &self.bytes[self.pos..];
        let next_entity = memchr(b'<', rest);
        let next_comment = memmem::find(rest, b"/*");
        let offset = match (next_entity, next_comment) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => rest.len(),
        };
        self.pos += offset;
    }

    fn error(&self, message: &str) -> Error {
        let pos = self.pos;
        let open = self.source[..pos].rfind('<');
        let close = self.source[..pos].rfind('>');
        let start = match (open, close) {
            (Some(o), Some(c)) if c > o => c + 1,
            (Some(o), _) => o,
            (None, Some(c)) => c + 1,
            (None, None) => 0,
        };
        let mut end = (pos + 10).min(self.source.len());
        while end > start && !self.source.is_char_boundary(end) {
            end -= 1;
        }
        let context = &self.source[start..end];
        Error::Parse {
            message: format!("{message} at pos {pos}: `{context}`"),
        }
    }
}
