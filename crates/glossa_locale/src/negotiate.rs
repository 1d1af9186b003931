//! Language negotiation.
//!
//! Computes the fallback chain from the default language, the built-in
//! languages, installed language packs and the user's requested order. The
//! chain is at most two entries long: the best supported match followed by
//! the default language.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::pseudo::{is_pseudo, PSEUDO_CODES};

/// Where a language's resources come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LangSource {
    /// Built into the application package.
    App,
    /// Installed language pack.
    Extra,
    /// Synthesized from the default language.
    Pseudo,
}

impl LangSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            LangSource::App => "app",
            LangSource::Extra => "extra",
            LangSource::Pseudo => "pseudo",
        }
    }
}

/// Script direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ltr,
    Rtl,
}

/// One negotiated language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    pub code: CompactString,
    pub src: LangSource,
    pub dir: Direction,
}

impl Language {
    /// A built-in language with its direction derived from the code.
    pub fn app(code: impl Into<CompactString>) -> Self {
        let code = code.into();
        let dir = direction(&code);
        Language {
            code,
            src: LangSource::App,
            dir,
        }
    }
}

/// The fallback chain, most specific first, ending in the default language.
pub type LanguageChain = SmallVec<[Language; 2]>;

/// One installed language-pack record for a language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Langpack {
    /// Application version the pack targets.
    pub target: CompactString,
    /// Pack revision, compared against the built-in revision.
    pub revision: u32,
}

const RTL_CODES: &[&str] = &["ar", "he", "fa", "ps", "qps-plocm", "ur"];

/// Script direction for a language code.
pub fn direction(code: &str) -> Direction {
    if RTL_CODES.contains(&code) {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

/// Compute the new fallback chain and broadcast it if it changed.
///
/// `available_langs` maps built-in codes to their revision;
/// `additional_langs` maps codes to their installed language packs.
/// `on_change` is invoked with the new chain only when the code sequence
/// differs from `prev_langs`; an identical outcome is a no-op.
pub fn negotiate_languages<S: AsRef<str>>(
    mut on_change: impl FnMut(&LanguageChain),
    app_version: &str,
    default_lang: &str,
    available_langs: &FxHashMap<CompactString, u32>,
    additional_langs: &FxHashMap<CompactString, Vec<Langpack>>,
    prev_langs: &[Language],
    requested_langs: &[S],
) -> LanguageChain {
    let codes = prioritize_locales(default_lang, available_langs, additional_langs, requested_langs);

    let langs: LanguageChain = codes
        .iter()
        .map(|code| Language {
            code: code.clone(),
            src: lang_source(app_version, available_langs, additional_langs, code),
            dir: direction(code),
        })
        .collect();

    let changed = prev_langs.len() != langs.len()
        || prev_langs
            .iter()
            .zip(langs.iter())
            .any(|(a, b)| a.code != b.code);
    if changed {
        on_change(&langs);
    }

    langs
}

/// Pick the supported locale: the first requested code present in the pool.
/// No match, or a match equal to the default, collapses to the default alone.
fn prioritize_locales<S: AsRef<str>>(
    default_lang: &str,
    available_langs: &FxHashMap<CompactString, u32>,
    additional_langs: &FxHashMap<CompactString, Vec<Langpack>>,
    requested_langs: &[S],
) -> SmallVec<[CompactString; 2]> {
    let in_pool = |code: &str| {
        available_langs.contains_key(code)
            || additional_langs.contains_key(code)
            || PSEUDO_CODES.contains(&code)
    };

    let supported = requested_langs
        .iter()
        .map(|s| s.as_ref())
        .find(|code| in_pool(code));

    match supported {
        None => SmallVec::from_iter([CompactString::from(default_lang)]),
        Some(code) if code == default_lang => SmallVec::from_iter([CompactString::from(code)]),
        Some(code) => {
            SmallVec::from_iter([CompactString::from(code), CompactString::from(default_lang)])
        }
    }
}

fn matching_langpack<'a>(app_version: &str, packs: &'a [Langpack]) -> Option<&'a Langpack> {
    packs.iter().find(|pack| pack.target == app_version)
}

fn lang_source(
    app_version: &str,
    available_langs: &FxHashMap<CompactString, u32>,
    additional_langs: &FxHashMap<CompactString, Vec<Langpack>>,
    code: &str,
) -> LangSource {
    if let Some(packs) = additional_langs.get(code) {
        if let Some(pack) = matching_langpack(app_version, packs) {
            let newer = match available_langs.get(code) {
                None => true,
                Some(&revision) => pack.revision > revision,
            };
            if newer {
                return LangSource::Extra;
            }
        }
    }

    if is_pseudo(code) && !available_langs.contains_key(code) {
        return LangSource::Pseudo;
    }

    LangSource::App
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available(codes: &[(&str, u32)]) -> FxHashMap<CompactString, u32> {
        codes
            .iter()
            .map(|(code, rev)| (CompactString::from(*code), *rev))
            .collect()
    }

    fn no_packs() -> FxHashMap<CompactString, Vec<Langpack>> {
        FxHashMap::default()
    }

    #[test]
    fn requested_match_prepends_fallback() {
        let chain = negotiate_languages(
            |_| {},
            "2.5",
            "en-US",
            &available(&[("en-US", 1), ("fr", 1)]),
            &no_packs(),
            &[],
            &["fr"],
        );
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].code, "fr");
        assert_eq!(chain[0].src, LangSource::App);
        assert_eq!(chain[1].code, "en-US");
    }

    #[test]
    fn unavailable_request_collapses_to_default() {
        let chain = negotiate_languages(
            |_| {},
            "2.5",
            "en-US",
            &available(&[("en-US", 1), ("fr", 1)]),
            &no_packs(),
            &[],
            &["de"],
        );
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].code, "en-US");
    }

    #[test]
    fn requesting_the_default_stays_single() {
        let chain = negotiate_languages(
            |_| {},
            "2.5",
            "en-US",
            &available(&[("en-US", 1)]),
            &no_packs(),
            &[],
            &["en-US", "fr"],
        );
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].code, "en-US");
    }

    #[test]
    fn pseudo_locale_is_negotiable() {
        let chain = negotiate_languages(
            |_| {},
            "2.5",
            "en-US",
            &available(&[("en-US", 1)]),
            &no_packs(),
            &[],
            &["qps-plocm"],
        );
        assert_eq!(chain[0].code, "qps-plocm");
        assert_eq!(chain[0].src, LangSource::Pseudo);
        assert_eq!(chain[0].dir, Direction::Rtl);
    }

    #[test]
    fn newer_langpack_wins_over_builtin() {
        let mut additional = no_packs();
        additional.insert(
            "fr".into(),
            vec![Langpack {
                target: "2.5".into(),
                revision: 3,
            }],
        );

        let chain = negotiate_languages(
            |_| {},
            "2.5",
            "en-US",
            &available(&[("en-US", 1), ("fr", 2)]),
            &additional,
            &[],
            &["fr"],
        );
        assert_eq!(chain[0].src, LangSource::Extra);

        // A stale pack keeps the built-in resources.
        let chain = negotiate_languages(
            |_| {},
            "2.5",
            "en-US",
            &available(&[("en-US", 1), ("fr", 5)]),
            &additional,
            &[],
            &["fr"],
        );
        assert_eq!(chain[0].src, LangSource::App);
    }

    #[test]
    fn langpack_for_other_version_is_ignored() {
        let mut additional = no_packs();
        additional.insert(
            "de".into(),
            vec![Langpack {
                target: "2.4".into(),
                revision: 9,
            }],
        );

        let chain = negotiate_languages(
            |_| {},
            "2.5",
            "en-US",
            &available(&[("en-US", 1)]),
            &additional,
            &[],
            &["de"],
        );
        // The code is in the pool via the pack, but no matching pack for this
        // app version exists, so it is served as a built-in (and will miss).
        assert_eq!(chain[0].code, "de");
        assert_eq!(chain[0].src, LangSource::App);
    }

    #[test]
    fn broadcast_only_on_change() {
        let mut calls = 0;
        let avail = available(&[("en-US", 1), ("fr", 1)]);
        let prev = negotiate_languages(
            |_| calls += 1,
            "2.5",
            "en-US",
            &avail,
            &no_packs(),
            &[],
            &["fr"],
        );
        assert_eq!(calls, 1);

        // Same outcome, no broadcast.
        negotiate_languages(
            |_| calls += 1,
            "2.5",
            "en-US",
            &avail,
            &no_packs(),
            &prev,
            &["fr"],
        );
        assert_eq!(calls, 1);

        // Different outcome, broadcast again.
        negotiate_languages(
            |_| calls += 1,
            "2.5",
            "en-US",
            &avail,
            &no_packs(),
            &prev,
            &["de"],
        );
        assert_eq!(calls, 2);
    }
}
