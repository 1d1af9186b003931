//! Entity resolution.
//!
//! `format_entry` evaluates one entity against a language and an argument
//! map: literal values pass through, interpolated strings substitute their
//! placeables, variant hashes select a branch through the index expression.
//! An explicit in-progress set is created per top-level call and threaded
//! down the recursion, so a self-referencing entity fails with a cyclic
//! error that is recovered into a bracketed placeholder by the caller.

use std::cell::RefCell;
use std::rc::Rc;

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use glossa_locale::{plural_category, plural_rule, Language, PluralCategory, PluralRule};
use glossa_tree::{Attr, Entry, EntryMap, Error, Fragment, IndexExpr, Value};

const KNOWN_MACROS: &[&str] = &["plural"];
const MAX_PLACEABLE_LENGTH: usize = 2500;
const FSI: char = '\u{2068}';
const PDI: char = '\u{2069}';

/// Caller-supplied argument value. Only strings and finite numbers resolve;
/// a non-finite number is a type-class failure at resolution time.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(CompactString),
    Num(f64),
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.into())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s.into())
    }
}

impl From<f64> for ArgValue {
    fn from(n: f64) -> Self {
        ArgValue::Num(n)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        ArgValue::Num(n as f64)
    }
}

/// Arguments supplied with one resolve key.
pub type Args = FxHashMap<CompactString, ArgValue>;

/// Same-language entity lookup, implemented by the resolution scope.
pub(crate) trait EntryLookup {
    fn lookup(&self, lang: &Language, id: &str) -> Option<EntryRef>;
}

/// A matched entry plus the table that owns it. Holding the table keeps the
/// entry's address stable for the duration of a resolve, which is what the
/// cycle-detection set keys on.
pub(crate) struct EntryRef {
    map: Rc<EntryMap>,
    id: CompactString,
}

impl EntryRef {
    pub(crate) fn new(map: Rc<EntryMap>, id: &str) -> Self {
        EntryRef { map, id: id.into() }
    }

    pub(crate) fn entry(&self) -> &Entry {
        &self.map[&self.id]
    }
}

/// Everything one format call resolves against.
pub(crate) struct ResolveCtx<'a> {
    pub lang: &'a Language,
    pub args: Option<&'a Args>,
    pub source: &'a dyn EntryLookup,
    pub formatters: &'a NumberFormatters,
}

/// In-progress set plus the placeable errors recovered along the way.
#[derive(Default)]
pub(crate) struct ResolutionChain {
    active: FxHashSet<usize>,
    pub errors: Vec<Error>,
}

enum Resolved {
    Str(String),
    Num(f64),
    Rule(PluralRule),
    Empty,
}

/// Format one entry to a string.
pub(crate) fn format_entry(
    rcx: &ResolveCtx<'_>,
    entry: &Entry,
    chain: &mut ResolutionChain,
) -> Result<String, Error> {
    match entry {
        Entry::Simple(s) => Ok(s.to_string()),
        Entry::Entity(entity) => format_node(
            rcx,
            entity.value.as_ref(),
            entity.index.as_ref(),
            entity as *const _ as usize,
            chain,
        ),
    }
}

/// Format one attribute to a string.
pub(crate) fn format_attr(
    rcx: &ResolveCtx<'_>,
    attr: &Attr,
    chain: &mut ResolutionChain,
) -> Result<String, Error> {
    match attr {
        Attr::Simple(s) => Ok(s.to_string()),
        Attr::Node { value, index } => format_node(
            rcx,
            Some(value),
            index.as_ref(),
            attr as *const _ as usize,
            chain,
        ),
    }
}

fn format_node(
    rcx: &ResolveCtx<'_>,
    value: Option<&Value>,
    index: Option<&IndexExpr>,
    node: usize,
    chain: &mut ResolutionChain,
) -> Result<String, Error> {
    if !chain.active.insert(node) {
        return Err(Error::Cyclic);
    }
    let result = resolve_value(rcx, value, index, chain);
    chain.active.remove(&node);

    match result? {
        Resolved::Str(s) => Ok(s),
        Resolved::Num(n) => Ok(rcx.formatters.format(&rcx.lang.code, n)),
        Resolved::Rule(_) => Err(Error::Unresolved),
        Resolved::Empty => Ok(String::new()),
    }
}

fn resolve_value(
    rcx: &ResolveCtx<'_>,
    value: Option<&Value>,
    index: Option<&IndexExpr>,
    chain: &mut ResolutionChain,
) -> Result<Resolved, Error> {
    let Some(value) = value else {
        return Ok(Resolved::Empty);
    };

    match value {
        Value::Literal(s) => Ok(Resolved::Str(s.to_string())),
        Value::Complex(fragments) => interpolate(rcx, fragments, chain).map(Resolved::Str),
        Value::Hash(hash) => {
            if let Some(index) = index {
                let selector = resolve_selector(rcx, hash, index, chain)?;
                if let Some(branch) = hash.get(&selector) {
                    return resolve_value(rcx, Some(branch), None, chain);
                }
            }

            let default_key = hash.default_key.as_deref().unwrap_or("other");
            if let Some(branch) = hash.get(default_key) {
                return resolve_value(rcx, Some(branch), None, chain);
            }

            Err(Error::Unresolved)
        }
    }
}

fn interpolate(
    rcx: &ResolveCtx<'_>,
    fragments: &[Fragment],
    chain: &mut ResolutionChain,
) -> Result<String, Error> {
    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(s) => out.push_str(s),
            Fragment::Ref(id) => out.push_str(&sub_placeable(rcx, id, chain)?),
        }
    }
    Ok(out)
}

/// Substitute one placeable. A failing reference degrades to the literal
/// `{{ id }}` rendering and records the error; substituted strings carry
/// directional isolation marks so mixed-direction fragments cannot corrupt
/// the surrounding text.
fn sub_placeable(
    rcx: &ResolveCtx<'_>,
    id: &str,
    chain: &mut ResolutionChain,
) -> Result<String, Error> {
    let resolved = match resolve_identifier(rcx, id, chain) {
        Ok(resolved) => resolved,
        Err(err) => {
            chain.errors.push(err);
            return Ok(format!("{FSI}{{{{ {id} }}}}{PDI}"));
        }
    };

    match resolved {
        Resolved::Num(n) => Ok(rcx.formatters.format(&rcx.lang.code, n)),
        Resolved::Str(s) => {
            let len = s.chars().count();
            if len >= MAX_PLACEABLE_LENGTH {
                return Err(Error::OversizedPlaceable {
                    len,
                    max: MAX_PLACEABLE_LENGTH,
                });
            }
            Ok(format!("{FSI}{s}{PDI}"))
        }
        Resolved::Rule(_) | Resolved::Empty => Ok(format!("{FSI}{{{{ {id} }}}}{PDI}")),
    }
}

fn resolve_identifier(
    rcx: &ResolveCtx<'_>,
    id: &str,
    chain: &mut ResolutionChain,
) -> Result<Resolved, Error> {
    if KNOWN_MACROS.contains(&id) {
        return Ok(Resolved::Rule(plural_rule(&rcx.lang.code)));
    }

    if let Some(args) = rcx.args {
        if let Some(value) = args.get(id) {
            return match value {
                ArgValue::Str(s) => Ok(Resolved::Str(s.to_string())),
                ArgValue::Num(n) if n.is_finite() => Ok(Resolved::Num(*n)),
                ArgValue::Num(_) => Err(Error::InvalidArgType { id: id.into() }),
            };
        }
    }

    if id == "__proto__" {
        return Err(Error::IllegalId { id: id.into() });
    }

    if let Some(entry_ref) = rcx.source.lookup(rcx.lang, id) {
        return format_entry(rcx, entry_ref.entry(), chain).map(Resolved::Str);
    }

    Err(Error::UnknownReference { id: id.into() })
}

fn resolve_selector(
    rcx: &ResolveCtx<'_>,
    hash: &glossa_tree::Hash,
    index: &IndexExpr,
    chain: &mut ResolutionChain,
) -> Result<CompactString, Error> {
    match index {
        IndexExpr::Plural(arg_name) => {
            let arg = resolve_identifier(rcx, arg_name, chain)?;
            let n = match arg {
                Resolved::Num(n) => Some(n),
                _ => None,
            };

            // An exact 0/1/2 wins over the linguistic category, but only
            // when the literally-named branch exists.
            if let Some(n) = n {
                if n == 0.0 && hash.contains("zero") {
                    return Ok("zero".into());
                }
                if n == 1.0 && hash.contains("one") {
                    return Ok("one".into());
                }
                if n == 2.0 && hash.contains("two") {
                    return Ok("two".into());
                }
            }

            let category = match n {
                Some(n) => plural_category(&rcx.lang.code, n),
                None => PluralCategory::Other,
            };
            Ok(category.as_str().into())
        }
        IndexExpr::Ref(name) => match resolve_identifier(rcx, name, chain)? {
            Resolved::Rule(rule) => Ok(rule(f64::NAN).as_str().into()),
            Resolved::Str(s) => Ok(s.into()),
            Resolved::Num(n) => Ok(rcx.formatters.format(&rcx.lang.code, n).into()),
            Resolved::Empty => Ok(CompactString::const_new("")),
        },
    }
}

/// Per-language numeric formatters, grouping disabled, created once per
/// language and reused across formats.
#[derive(Default)]
pub(crate) struct NumberFormatters {
    cache: RefCell<FxHashMap<CompactString, Rc<NumberFormatter>>>,
}

impl NumberFormatters {
    pub(crate) fn format(&self, lang: &str, n: f64) -> String {
        self.get(lang).format(n)
    }

    fn get(&self, lang: &str) -> Rc<NumberFormatter> {
        if let Some(formatter) = self.cache.borrow().get(lang) {
            return Rc::clone(formatter);
        }
        let formatter = Rc::new(NumberFormatter);
        self.cache
            .borrow_mut()
            .insert(lang.into(), Rc::clone(&formatter));
        formatter
    }
}

struct NumberFormatter;

impl NumberFormatter {
    fn format(&self, n: f64) -> String {
        if n.fract() == 0.0 && n.abs() < 1e15 {
            format!("{}", n as i64)
        } else {
            n.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_locale::LangSource;
    use glossa_syntax::{parse_l20n, parse_properties};

    impl EntryLookup for Rc<EntryMap> {
        fn lookup(&self, _lang: &Language, id: &str) -> Option<EntryRef> {
            self.contains_key(id)
                .then(|| EntryRef::new(Rc::clone(self), id))
        }
    }

    fn lang(code: &str) -> Language {
        Language {
            code: code.into(),
            src: LangSource::App,
            dir: glossa_locale::Direction::Ltr,
        }
    }

    fn table_l20n(source: &str) -> Rc<EntryMap> {
        Rc::new(parse_l20n(source, None).expect("parse failed"))
    }

    fn table_properties(source: &str) -> Rc<EntryMap> {
        Rc::new(parse_properties(source, None).expect("parse failed"))
    }

    fn args(pairs: &[(&str, ArgValue)]) -> Args {
        pairs
            .iter()
            .map(|(k, v)| (CompactString::from(*k), v.clone()))
            .collect()
    }

    fn format(
        table: &Rc<EntryMap>,
        lang: &Language,
        args: Option<&Args>,
        id: &str,
    ) -> Result<String, Error> {
        let formatters = NumberFormatters::default();
        let rcx = ResolveCtx {
            lang,
            args,
            source: table,
            formatters: &formatters,
        };
        let entry_ref = table.lookup(lang, id).expect("entry present");
        let mut chain = ResolutionChain::default();
        format_entry(&rcx, entry_ref.entry(), &mut chain)
    }

    #[test]
    fn plain_strings_pass_through() {
        let table = table_l20n(r#"<a "A">"#);
        assert_eq!(format(&table, &lang("en-US"), None, "a").unwrap(), "A");
    }

    #[test]
    fn interpolation_substitutes_args_with_isolation() {
        let table = table_properties("greet = Hello, {{ name }}!");
        let args = args(&[("name", "Ada".into())]);
        assert_eq!(
            format(&table, &lang("en-US"), Some(&args), "greet").unwrap(),
            "Hello, \u{2068}Ada\u{2069}!"
        );
    }

    #[test]
    fn resolving_twice_is_pure() {
        let table = table_properties("greet = Hello, {{ name }}!");
        let args = args(&[("name", "Ada".into())]);
        let first = format(&table, &lang("en-US"), Some(&args), "greet").unwrap();
        let second = format(&table, &lang("en-US"), Some(&args), "greet").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn entity_references_resolve() {
        let table = table_l20n("<brand \"Firefox\">\n<about \"About {{ brand }}\">");
        assert_eq!(
            format(&table, &lang("en-US"), None, "about").unwrap(),
            "About \u{2068}Firefox\u{2069}"
        );
    }

    #[test]
    fn numeric_args_use_the_number_formatter() {
        let table = table_properties("unread = {{ n }} unread");
        let args = args(&[("n", 7.0.into())]);
        assert_eq!(
            format(&table, &lang("en-US"), Some(&args), "unread").unwrap(),
            "7 unread"
        );
    }

    #[test]
    fn unknown_reference_degrades_to_placeholder() {
        let table = table_properties("a = X {{ b }} Y");
        assert_eq!(
            format(&table, &lang("en-US"), None, "a").unwrap(),
            "X \u{2068}{{ b }}\u{2069} Y"
        );
    }

    #[test]
    fn unknown_reference_is_recorded() {
        let table = table_properties("a = X {{ b }} Y");
        let formatters = NumberFormatters::default();
        let l = lang("en-US");
        let rcx = ResolveCtx {
            lang: &l,
            args: None,
            source: &table,
            formatters: &formatters,
        };
        let entry_ref = table.lookup(&l, "a").expect("entry present");
        let mut chain = ResolutionChain::default();
        format_entry(&rcx, entry_ref.entry(), &mut chain).unwrap();
        assert_eq!(
            chain.errors,
            vec![Error::UnknownReference { id: "b".into() }]
        );
    }

    #[test]
    fn cyclic_reference_recovers_to_placeholder() {
        let table = table_properties("a = {{ a }}");
        assert_eq!(
            format(&table, &lang("en-US"), None, "a").unwrap(),
            "\u{2068}{{ a }}\u{2069}"
        );
    }

    #[test]
    fn mutual_cycle_recovers_too() {
        let table = table_properties("a = {{ b }}\nb = {{ a }}");
        let out = format(&table, &lang("en-US"), None, "a").unwrap();
        assert_eq!(out, "\u{2068}\u{2068}{{ a }}\u{2069}\u{2069}");
    }

    #[test]
    fn exact_zero_beats_linguistic_category() {
        let table = table_properties(
            "files = {[ plural(n) ]}\nfiles[zero] = none\nfiles[other] = many",
        );
        let args = args(&[("n", 0.0.into())]);
        // English maps 0 to `other`; the literal `zero` branch still wins.
        assert_eq!(
            format(&table, &lang("en-US"), Some(&args), "files").unwrap(),
            "none"
        );
    }

    #[test]
    fn override_skipped_when_branch_missing() {
        let table =
            table_properties("files = {[ plural(n) ]}\nfiles[one] = one\nfiles[other] = many");
        let args = args(&[("n", 0.0.into())]);
        assert_eq!(
            format(&table, &lang("en-US"), Some(&args), "files").unwrap(),
            "many"
        );
    }

    #[test]
    fn plural_category_selects_branch() {
        let table =
            table_properties("files = {[ plural(n) ]}\nfiles[one] = one file\nfiles[other] = {{ n }} files");
        let one = args(&[("n", 1.0.into())]);
        let five = args(&[("n", 5.0.into())]);
        assert_eq!(
            format(&table, &lang("en-US"), Some(&one), "files").unwrap(),
            "one file"
        );
        assert_eq!(
            format(&table, &lang("en-US"), Some(&five), "files").unwrap(),
            "5 files"
        );
    }

    #[test]
    fn declared_default_used_when_no_match() {
        let table = table_l20n(r#"<style { plain: "P", *fancy: "F" }>"#);
        assert_eq!(format(&table, &lang("en-US"), None, "style").unwrap(), "F");
    }

    #[test]
    fn hash_without_match_or_default_is_unresolved() {
        let table = table_l20n(r#"<style { plain: "P" }>"#);
        assert_eq!(
            format(&table, &lang("en-US"), None, "style"),
            Err(Error::Unresolved)
        );
    }

    #[test]
    fn selector_can_be_an_argument() {
        let table =
            table_properties("style = {[ mood ]}\nstyle[happy] = :)\nstyle[other] = :|");
        let happy = args(&[("mood", "happy".into())]);
        assert_eq!(
            format(&table, &lang("en-US"), Some(&happy), "style").unwrap(),
            ":)"
        );

        // No matching branch falls back to `other`.
        let sad = args(&[("mood", "sad".into())]);
        assert_eq!(
            format(&table, &lang("en-US"), Some(&sad), "style").unwrap(),
            ":|"
        );

        // A selector that cannot resolve at all fails the entity.
        assert_eq!(
            format(&table, &lang("en-US"), None, "style"),
            Err(Error::UnknownReference { id: "mood".into() })
        );
    }

    #[test]
    fn non_finite_number_is_a_type_error() {
        let table = table_properties("a = {{ n }}");
        let bad = args(&[("n", f64::NAN.into())]);
        // The failing placeable degrades, the entity still formats.
        assert_eq!(
            format(&table, &lang("en-US"), Some(&bad), "a").unwrap(),
            "\u{2068}{{ n }}\u{2069}"
        );
    }

    #[test]
    fn proto_is_rejected() {
        let table = table_properties("a = {{ __proto__ }}");
        assert_eq!(
            format(&table, &lang("en-US"), None, "a").unwrap(),
            "\u{2068}{{ __proto__ }}\u{2069}"
        );
    }

    #[test]
    fn oversized_placeable_fails_the_entity() {
        let big = "x".repeat(MAX_PLACEABLE_LENGTH);
        let table = table_properties(&format!("big = {big}\na = {{{{ big }}}}"));
        assert_eq!(
            format(&table, &lang("en-US"), None, "a"),
            Err(Error::OversizedPlaceable {
                len: MAX_PLACEABLE_LENGTH,
                max: MAX_PLACEABLE_LENGTH,
            })
        );
    }

    #[test]
    fn number_formatter_has_no_grouping() {
        let formatters = NumberFormatters::default();
        assert_eq!(formatters.format("en-US", 1234567.0), "1234567");
        assert_eq!(formatters.format("en-US", 2.5), "2.5");
        assert_eq!(formatters.format("en-US", -3.0), "-3");
    }
}
