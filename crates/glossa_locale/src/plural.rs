//! Table-driven plural category lookup.
//!
//! This is not a CLDR evaluator: each language maps to one of a fixed set of
//! rule functions keyed by its primary subtag, and unmapped languages fall
//! back to `Other`. Rules operate on `f64` so that non-integral counts take
//! the `other` path of the integral guards naturally.

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Plural category tags shared by the rule table and variant hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

/// A plural rule: count in, category out.
pub type PluralRule = fn(f64) -> PluralCategory;

/// Look up the rule for a language code (primary subtag only).
pub fn plural_rule(code: &str) -> PluralRule {
    let primary = code.split('-').next().unwrap_or(code);
    match LOCALES_TO_RULES.get(primary) {
        Some(&index) => RULES[index as usize],
        None => rule_0,
    }
}

/// Compute the plural category of `n` in the given language.
pub fn plural_category(code: &str, n: f64) -> PluralCategory {
    plural_rule(code)(n)
}

fn is_in(n: f64, list: &[f64]) -> bool {
    list.contains(&n)
}

fn is_between(n: f64, start: f64, end: f64) -> bool {
    start <= n && n <= end
}

static RULES: [PluralRule; 25] = [
    rule_0, rule_1, rule_2, rule_3, rule_4, rule_5, rule_6, rule_7, rule_8, rule_9, rule_10,
    rule_11, rule_12, rule_13, rule_14, rule_15, rule_16, rule_17, rule_18, rule_19, rule_20,
    rule_21, rule_22, rule_23, rule_24,
];

fn rule_0(_n: f64) -> PluralCategory {
    PluralCategory::Other
}

fn rule_1(n: f64) -> PluralCategory {
    if is_between(n % 100.0, 3.0, 10.0) {
        return PluralCategory::Few;
    }
    if n == 0.0 {
        return PluralCategory::Zero;
    }
    if is_between(n % 100.0, 11.0, 99.0) {
        return PluralCategory::Many;
    }
    if n == 2.0 {
        return PluralCategory::Two;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_2(n: f64) -> PluralCategory {
    if n != 0.0 && n % 10.0 == 0.0 {
        return PluralCategory::Many;
    }
    if n == 2.0 {
        return PluralCategory::Two;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_3(n: f64) -> PluralCategory {
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_4(n: f64) -> PluralCategory {
    if is_between(n, 0.0, 1.0) {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_5(n: f64) -> PluralCategory {
    if is_between(n, 0.0, 2.0) && n != 2.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_6(n: f64) -> PluralCategory {
    if n == 0.0 {
        return PluralCategory::Zero;
    }
    if n % 10.0 == 1.0 && n % 100.0 != 11.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_7(n: f64) -> PluralCategory {
    if n == 2.0 {
        return PluralCategory::Two;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_8(n: f64) -> PluralCategory {
    if is_between(n, 3.0, 6.0) {
        return PluralCategory::Few;
    }
    if is_between(n, 7.0, 10.0) {
        return PluralCategory::Many;
    }
    if n == 2.0 {
        return PluralCategory::Two;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_9(n: f64) -> PluralCategory {
    if n == 0.0 || (n != 1.0 && is_between(n % 100.0, 1.0, 19.0)) {
        return PluralCategory::Few;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_10(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 2.0, 9.0) && !is_between(n % 100.0, 11.0, 19.0) {
        return PluralCategory::Few;
    }
    if n % 10.0 == 1.0 && !is_between(n % 100.0, 11.0, 19.0) {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_11(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 2.0, 4.0) && !is_between(n % 100.0, 12.0, 14.0) {
        return PluralCategory::Few;
    }
    if n % 10.0 == 0.0 || is_between(n % 10.0, 5.0, 9.0) || is_between(n % 100.0, 11.0, 14.0) {
        return PluralCategory::Many;
    }
    if n % 10.0 == 1.0 && n % 100.0 != 11.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_12(n: f64) -> PluralCategory {
    if is_between(n, 2.0, 4.0) {
        return PluralCategory::Few;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_13(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 2.0, 4.0) && !is_between(n % 100.0, 12.0, 14.0) {
        return PluralCategory::Few;
    }
    if (n != 1.0 && is_between(n % 10.0, 0.0, 1.0))
        || is_between(n % 10.0, 5.0, 9.0)
        || is_between(n % 100.0, 12.0, 14.0)
    {
        return PluralCategory::Many;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_14(n: f64) -> PluralCategory {
    if is_between(n % 100.0, 3.0, 4.0) {
        return PluralCategory::Few;
    }
    if n % 100.0 == 2.0 {
        return PluralCategory::Two;
    }
    if n % 100.0 == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_15(n: f64) -> PluralCategory {
    if n == 0.0 || is_between(n % 100.0, 2.0, 10.0) {
        return PluralCategory::Few;
    }
    if is_between(n % 100.0, 11.0, 19.0) {
        return PluralCategory::Many;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_16(n: f64) -> PluralCategory {
    if n % 10.0 == 1.0 && n != 11.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_17(n: f64) -> PluralCategory {
    if n == 3.0 {
        return PluralCategory::Few;
    }
    if n == 0.0 {
        return PluralCategory::Zero;
    }
    if n == 6.0 {
        return PluralCategory::Many;
    }
    if n == 2.0 {
        return PluralCategory::Two;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_18(n: f64) -> PluralCategory {
    if n == 0.0 {
        return PluralCategory::Zero;
    }
    if is_between(n, 0.0, 2.0) && n != 0.0 && n != 2.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_19(n: f64) -> PluralCategory {
    if is_between(n, 2.0, 10.0) {
        return PluralCategory::Few;
    }
    if is_between(n, 0.0, 1.0) {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_20(n: f64) -> PluralCategory {
    if (is_between(n % 10.0, 3.0, 4.0) || n % 10.0 == 9.0)
        && !(is_between(n % 100.0, 10.0, 19.0)
            || is_between(n % 100.0, 70.0, 79.0)
            || is_between(n % 100.0, 90.0, 99.0))
    {
        return PluralCategory::Few;
    }
    if n % 1_000_000.0 == 0.0 && n != 0.0 {
        return PluralCategory::Many;
    }
    if n % 10.0 == 2.0 && !is_in(n % 100.0, &[12.0, 72.0, 92.0]) {
        return PluralCategory::Two;
    }
    if n % 10.0 == 1.0 && !is_in(n % 100.0, &[11.0, 71.0, 91.0]) {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_21(n: f64) -> PluralCategory {
    if n == 0.0 {
        return PluralCategory::Zero;
    }
    if n == 1.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_22(n: f64) -> PluralCategory {
    if is_between(n, 0.0, 1.0) || is_between(n, 11.0, 99.0) {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_23(n: f64) -> PluralCategory {
    if is_between(n % 10.0, 1.0, 2.0) || n % 20.0 == 0.0 {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

fn rule_24(n: f64) -> PluralCategory {
    if is_between(n, 3.0, 10.0) || is_between(n, 13.0, 19.0) {
        return PluralCategory::Few;
    }
    if is_in(n, &[2.0, 12.0]) {
        return PluralCategory::Two;
    }
    if is_in(n, &[1.0, 11.0]) {
        return PluralCategory::One;
    }
    PluralCategory::Other
}

static LOCALES_TO_RULES: phf::Map<&'static str, u8> = phf_map! {
    "af" => 3, "ak" => 4, "am" => 4, "ar" => 1, "asa" => 3, "az" => 0,
    "be" => 11, "bem" => 3, "bez" => 3, "bg" => 3, "bh" => 4, "bm" => 0,
    "bn" => 3, "bo" => 0, "br" => 20, "brx" => 3, "bs" => 11, "ca" => 3,
    "cgg" => 3, "chr" => 3, "cs" => 12, "cy" => 17, "da" => 3, "de" => 3,
    "dv" => 3, "dz" => 0, "ee" => 3, "el" => 3, "en" => 3, "eo" => 3,
    "es" => 3, "et" => 3, "eu" => 3, "fa" => 0, "ff" => 5, "fi" => 3,
    "fil" => 4, "fo" => 3, "fr" => 5, "fur" => 3, "fy" => 3, "ga" => 8,
    "gd" => 24, "gl" => 3, "gsw" => 3, "gu" => 3, "guw" => 4, "gv" => 23,
    "ha" => 3, "haw" => 3, "he" => 2, "hi" => 4, "hr" => 11, "hu" => 0,
    "id" => 0, "ig" => 0, "ii" => 0, "is" => 3, "it" => 3, "iu" => 7,
    "ja" => 0, "jmc" => 3, "jv" => 0, "ka" => 0, "kab" => 5, "kaj" => 3,
    "kcg" => 3, "kde" => 0, "kea" => 0, "kk" => 3, "kl" => 3, "km" => 0,
    "kn" => 0, "ko" => 0, "ksb" => 3, "ksh" => 21, "ku" => 3, "kw" => 7,
    "lag" => 18, "lb" => 3, "lg" => 3, "ln" => 4, "lo" => 0, "lt" => 10,
    "lv" => 6, "mas" => 3, "mg" => 4, "mk" => 16, "ml" => 3, "mn" => 3,
    "mo" => 9, "mr" => 3, "ms" => 0, "mt" => 15, "my" => 0, "nah" => 3,
    "naq" => 7, "nb" => 3, "nd" => 3, "ne" => 3, "nl" => 3, "nn" => 3,
    "no" => 3, "nr" => 3, "nso" => 4, "ny" => 3, "nyn" => 3, "om" => 3,
    "or" => 3, "pa" => 3, "pap" => 3, "pl" => 13, "ps" => 3, "pt" => 3,
    "rm" => 3, "ro" => 9, "rof" => 3, "ru" => 11, "rwk" => 3, "sah" => 0,
    "saq" => 3, "se" => 7, "seh" => 3, "ses" => 0, "sg" => 0, "sh" => 11,
    "shi" => 19, "sk" => 12, "sl" => 14, "sma" => 7, "smi" => 7, "smj" => 7,
    "smn" => 7, "sms" => 7, "sn" => 3, "so" => 3, "sq" => 3, "sr" => 11,
    "ss" => 3, "ssy" => 3, "st" => 3, "sv" => 3, "sw" => 3, "syr" => 3,
    "ta" => 3, "te" => 3, "teo" => 3, "th" => 0, "ti" => 4, "tig" => 3,
    "tk" => 3, "tl" => 4, "tn" => 3, "to" => 0, "tr" => 0, "ts" => 3,
    "tzm" => 22, "uk" => 11, "ur" => 3, "ve" => 3, "vi" => 0, "vun" => 3,
    "wa" => 4, "wae" => 3, "wo" => 0, "xh" => 3, "xog" => 3, "yo" => 0,
    "zh" => 0, "zu" => 3,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_one_other() {
        assert_eq!(plural_category("en", 1.0), PluralCategory::One);
        assert_eq!(plural_category("en", 0.0), PluralCategory::Other);
        assert_eq!(plural_category("en", 2.0), PluralCategory::Other);
        assert_eq!(plural_category("en-US", 1.0), PluralCategory::One);
    }

    #[test]
    fn polish_few_many() {
        assert_eq!(plural_category("pl", 1.0), PluralCategory::One);
        assert_eq!(plural_category("pl", 2.0), PluralCategory::Few);
        assert_eq!(plural_category("pl", 5.0), PluralCategory::Many);
        assert_eq!(plural_category("pl", 12.0), PluralCategory::Many);
        assert_eq!(plural_category("pl", 22.0), PluralCategory::Few);
    }

    #[test]
    fn arabic_full_range() {
        assert_eq!(plural_category("ar", 0.0), PluralCategory::Zero);
        assert_eq!(plural_category("ar", 1.0), PluralCategory::One);
        assert_eq!(plural_category("ar", 2.0), PluralCategory::Two);
        assert_eq!(plural_category("ar", 3.0), PluralCategory::Few);
        assert_eq!(plural_category("ar", 11.0), PluralCategory::Many);
        assert_eq!(plural_category("ar", 100.0), PluralCategory::Other);
    }

    #[test]
    fn french_fractional_one() {
        assert_eq!(plural_category("fr", 0.0), PluralCategory::One);
        assert_eq!(plural_category("fr", 1.5), PluralCategory::One);
        assert_eq!(plural_category("fr", 2.0), PluralCategory::Other);
    }

    #[test]
    fn unknown_language_is_other() {
        assert_eq!(plural_category("tlh", 1.0), PluralCategory::Other);
        assert_eq!(plural_category("qps-ploc", 1.0), PluralCategory::Other);
    }

    #[test]
    fn russian_teens_are_many() {
        assert_eq!(plural_category("ru", 11.0), PluralCategory::Many);
        assert_eq!(plural_category("ru", 21.0), PluralCategory::One);
        assert_eq!(plural_category("ru", 23.0), PluralCategory::Few);
    }
}
