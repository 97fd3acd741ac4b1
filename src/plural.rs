//! Plural rules
//!
//! A numerus message in a `.ts` catalogue carries one `<numerusform>` per plural category of the
//! target language, in the order the language's rule defines. The rule also selects the category
//! for a count at runtime.
//!
//! The table follows the numerus rules of Qt Linguist, expressed with the CLDR category names
//! from [`Count`](../enum.Count.html). Only integer counts are supported, which is all `.ts`
//! catalogues can express anyway.

use locale_config::LanguageRange;
use std::collections::HashMap;
use std::fmt;
use super::Count;

/// Plural rule of one language.
///
/// Combines the list of categories the language distinguishes, in the order of `numerusform`
/// elements, with the function selecting the category for a count.
#[derive(Copy,Clone)]
pub struct PluralRule {
    _forms: &'static [Count],
    _select: fn(u64) -> Count,
}

impl PluralRule {
    /// Rule for languages that do not inflect for number, e.g. Vietnamese or Japanese.
    pub fn single() -> PluralRule { SINGLE }

    /// Rule distinguishing exactly one from everything else, as in English.
    pub fn english() -> PluralRule { ENGLISH }

    /// Look up the rule for a language.
    ///
    /// Only the primary language subtag is considered. Unknown and invariant languages get the
    /// English rule.
    pub fn for_language(lang: &LanguageRange) -> PluralRule {
        Self::for_tag(lang.as_ref())
    }

    /// Look up the rule for a language tag in either BCP 47 (`vi-VN`) or Unix (`vi_VN`) form.
    pub fn for_tag(tag: &str) -> PluralRule {
        let primary = tag.split(|c: char| c == '-' || c == '_' || c == '.' || c == '@')
            .next()
            .unwrap_or("")
            .to_lowercase();
        match RULES.get(primary.as_str()) {
            Some(rule) => *rule,
            None => ENGLISH,
        }
    }

    /// Categories of the language, in the order of `numerusform` elements.
    pub fn forms(&self) -> &'static [Count] { self._forms }

    /// Number of plural forms.
    pub fn len(&self) -> usize { self._forms.len() }

    /// Select the plural category for given count.
    pub fn select(&self, n: u64) -> Count { (self._select)(n) }

    /// Index of the `numerusform` used for given count.
    pub fn form_index(&self, n: u64) -> usize {
        let c = self.select(n);
        self._forms.iter().position(|f| *f == c).unwrap_or(0)
    }
}

impl fmt::Debug for PluralRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PluralRule").field("forms", &self._forms).finish()
    }
}

fn single(_: u64) -> Count { Count::Other }

fn english(n: u64) -> Count {
    if n == 1 { Count::One } else { Count::Other }
}

fn french(n: u64) -> Count {
    if n <= 1 { Count::One } else { Count::Other }
}

fn is_few_slavic(n: u64) -> bool {
    (2..5).contains(&(n % 10)) && !(12..15).contains(&(n % 100))
}

fn east_slavic(n: u64) -> Count {
    if n % 10 == 1 && n % 100 != 11 {
        Count::One
    } else if is_few_slavic(n) {
        Count::Few
    } else {
        Count::Many
    }
}

fn polish(n: u64) -> Count {
    if n == 1 {
        Count::One
    } else if is_few_slavic(n) {
        Count::Few
    } else {
        Count::Many
    }
}

fn czech(n: u64) -> Count {
    match n {
        1 => Count::One,
        2..=4 => Count::Few,
        _ => Count::Other,
    }
}

fn slovenian(n: u64) -> Count {
    match n % 100 {
        1 => Count::One,
        2 => Count::Two,
        3 | 4 => Count::Few,
        _ => Count::Other,
    }
}

fn lithuanian(n: u64) -> Count {
    if (11..20).contains(&(n % 100)) {
        Count::Other
    } else if n % 10 == 1 {
        Count::One
    } else if n % 10 >= 2 {
        Count::Few
    } else {
        Count::Other
    }
}

fn latvian(n: u64) -> Count {
    if n % 10 == 1 && n % 100 != 11 {
        Count::One
    } else if n != 0 {
        Count::Other
    } else {
        Count::Zero
    }
}

fn irish(n: u64) -> Count {
    match n {
        1 => Count::One,
        2 => Count::Two,
        _ => Count::Other,
    }
}

fn romanian(n: u64) -> Count {
    if n == 1 {
        Count::One
    } else if n == 0 || (1..20).contains(&(n % 100)) {
        Count::Few
    } else {
        Count::Other
    }
}

fn arabic(n: u64) -> Count {
    match n {
        0 => Count::Zero,
        1 => Count::One,
        2 => Count::Two,
        _ => match n % 100 {
            3..=10 => Count::Few,
            11..=99 => Count::Many,
            _ => Count::Other,
        },
    }
}

const SINGLE: PluralRule = PluralRule { _forms: &[Count::Other], _select: single };
const ENGLISH: PluralRule = PluralRule { _forms: &[Count::One, Count::Other], _select: english };

static TABLE: &[(PluralRule, &[&str])] = &[
    (SINGLE,
     &["bo", "dz", "fa", "fj", "gn", "hu", "id", "ja", "jv", "km", "ko", "lo", "ms", "my", "na",
       "om", "su", "th", "tr", "tt", "vi", "yo", "za", "zh"]),
    (ENGLISH,
     &["af", "az", "bg", "bn", "ca", "da", "de", "el", "en", "eo", "es", "et", "eu", "fi", "fo",
       "fy", "gl", "gu", "he", "hi", "is", "it", "kk", "kn", "ky", "ml", "mn", "mr", "nb", "ne",
       "nl", "nn", "no", "pa", "pt", "sq", "sv", "sw", "ta", "te", "ur"]),
    (PluralRule { _forms: &[Count::One, Count::Other], _select: french },
     &["fr", "hy", "oc", "ff", "ln"]),
    (PluralRule { _forms: &[Count::One, Count::Few, Count::Many], _select: east_slavic },
     &["be", "bs", "hr", "ru", "sr", "uk"]),
    (PluralRule { _forms: &[Count::One, Count::Few, Count::Many], _select: polish },
     &["pl"]),
    (PluralRule { _forms: &[Count::One, Count::Few, Count::Other], _select: czech },
     &["cs", "sk"]),
    (PluralRule { _forms: &[Count::One, Count::Two, Count::Few, Count::Other], _select: slovenian },
     &["sl"]),
    (PluralRule { _forms: &[Count::One, Count::Few, Count::Other], _select: lithuanian },
     &["lt"]),
    (PluralRule { _forms: &[Count::One, Count::Other, Count::Zero], _select: latvian },
     &["lv"]),
    (PluralRule { _forms: &[Count::One, Count::Two, Count::Other], _select: irish },
     &["ga"]),
    (PluralRule { _forms: &[Count::One, Count::Few, Count::Other], _select: romanian },
     &["mo", "ro"]),
    (PluralRule {
        _forms: &[Count::Zero, Count::One, Count::Two, Count::Few, Count::Many, Count::Other],
        _select: arabic },
     &["ar"]),
];

lazy_static!{
    static ref RULES: HashMap<&'static str, PluralRule> = TABLE.iter()
        .flat_map(|&(rule, langs)| langs.iter().map(move |l| (*l, rule)))
        .collect();
}
