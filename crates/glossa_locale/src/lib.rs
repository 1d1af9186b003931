//! Locale services for Glossa.
//!
//! Three independent pieces: the table-driven plural rule lookup, the
//! pseudo-locale character transforms, and the language negotiator that
//! computes the fallback chain.

pub mod negotiate;
pub mod plural;
pub mod pseudo;

pub use negotiate::{
    negotiate_languages, Direction, LangSource, Language, LanguageChain, Langpack,
};
pub use plural::{plural_category, plural_rule, PluralCategory, PluralRule};
pub use pseudo::{is_pseudo, pseudo_locale, PseudoLocale, PSEUDO_CODES};
