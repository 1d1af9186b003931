//! Pseudo-locale synthesis.
//!
//! Pseudo-locales are built from the default language's entities at parse
//! time. The character transforms skip anything that must survive verbatim:
//! printf-style tokens, `{ ... }` placeables, HTML entities and tags.

use once_cell::sync::Lazy;
use regex::Regex;

/// Codes of the supported pseudo-locales.
pub const PSEUDO_CODES: &[&str] = &["qps-ploc", "qps-plocm"];

/// Whether a language code names a pseudo-locale.
pub fn is_pseudo(code: &str) -> bool {
    PSEUDO_CODES.contains(&code)
}

/// Look up a pseudo-locale by code.
pub fn pseudo_locale(code: &str) -> Option<&'static PseudoLocale> {
    match code {
        "qps-ploc" => Some(&*ACCENTED),
        "qps-plocm" => Some(&*MIRRORED),
        _ => None,
    }
}

/// One pseudo-locale: a code, a display name (itself pseudo-localized) and
/// the text transform applied to every entity of the default language.
pub struct PseudoLocale {
    pub code: &'static str,
    pub name: String,
    kind: Kind,
}

#[derive(Clone, Copy)]
enum Kind {
    Accented,
    Mirrored,
}

impl PseudoLocale {
    fn new(code: &'static str, name: &str, kind: Kind) -> Self {
        let mut locale = PseudoLocale {
            code,
            name: String::new(),
            kind,
        };
        locale.name = locale.process(name);
        locale
    }

    /// Transform translatable text, leaving excluded segments untouched.
    pub fn process(&self, val: &str) -> String {
        if val.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(val.len() * 2);
        let mut last = 0;
        for m in RE_EXCLUDED.find_iter(val) {
            self.transform_into(&mut out, &val[last..m.start()]);
            out.push_str(m.as_str());
            last = m.end();
        }
        self.transform_into(&mut out, &val[last..]);
        out
    }

    fn transform_into(&self, out: &mut String, part: &str) {
        let widened = match self.kind {
            Kind::Accented => double_vowels(part),
            Kind::Mirrored => wrap_words_rtl(part),
        };
        let map = match self.kind {
            Kind::Accented => &*ACCENTED_MAP,
            Kind::Mirrored => &*FLIPPED_MAP,
        };
        for ch in widened.chars() {
            if ch.is_ascii_alphabetic() {
                out.push(map[(ch as u32 - 65) as usize]);
            } else {
                out.push(ch);
            }
        }
    }
}

static ACCENTED: Lazy<PseudoLocale> =
    Lazy::new(|| PseudoLocale::new("qps-ploc", "Runtime Accented", Kind::Accented));

static MIRRORED: Lazy<PseudoLocale> =
    Lazy::new(|| PseudoLocale::new("qps-plocm", "Runtime Mirrored", Kind::Mirrored));

// Substitution tables indexed by ASCII code point minus 65 ('A'); the
// punctuation between 'Z' and 'a' maps to itself to keep the table dense.
static ACCENTED_MAP: Lazy<Vec<char>> = Lazy::new(|| {
    concat!(
        "ȦƁƇḒḖƑƓĦĪ", "ĴĶĿḾȠǾƤɊŘ", "ŞŦŬṼẆẊẎẐ", "[\\]^_`", "ȧƀƈḓḗƒɠħī", "ĵķŀḿƞǿƥɋř", "şŧŭṽẇẋẏẑ"
    )
    .chars()
    .collect()
});

static FLIPPED_MAP: Lazy<Vec<char>> = Lazy::new(|| {
    concat!(
        "∀ԐↃpƎɟפHIſ", "Ӽ˥WNOԀÒᴚS⊥∩Ʌ", "ＭXʎZ", "[\\]ᵥ_,", "ɐqɔpǝɟƃɥıɾ", "ʞʅɯuodbɹsʇnʌʍxʎz"
    )
    .chars()
    .collect()
});

static RE_VOWELS: Lazy<Regex> = Lazy::new(|| Regex::new("[aeiouAEIOU]").unwrap());
static RE_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\W0-9_]+").unwrap());
static RE_EXCLUDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[EO]?\w|\{\s*.+?\s*\}|&[#\w]+;|<\s*.+?\s*>").unwrap());

fn double_vowels(val: &str) -> String {
    RE_VOWELS
        .replace_all(val, |caps: &regex::Captures<'_>| {
            let m = &caps[0];
            format!("{}{}", m, m.to_lowercase())
        })
        .into_owned()
}

// RLO .. PDF around every word flips the rendering order without touching
// the underlying characters.
fn wrap_words_rtl(val: &str) -> String {
    RE_WORDS
        .replace_all(val, |caps: &regex::Captures<'_>| {
            format!("\u{202E}{}\u{202C}", &caps[0])
        })
        .into_owned()
}
