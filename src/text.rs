//! Text normalization and German ordering.
//!
//! Search compares normalized forms so that `Schön`, `schon` and a full-width
//! `ＳＣＨＯＮ` typed on a Japanese keyboard all meet. Sorting follows German
//! dictionary habits: umlauts file under their base letter and `ß` under `ss`.

use std::cmp::Ordering;

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Letters that get their own bucket (and page anchor) in sorted lists
pub const SORT_ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Combining diacritical marks (U+0300..U+036F); kana voicing marks are kept.
fn is_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Strip diacritics and recompose what is left.
fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_diacritic(*c)).nfc().collect()
}

/// Fold width variants, drop diacritics, expand `ß` and lowercase.
fn fold(text: &str) -> String {
    let compat: String = text.nfkc().collect();
    strip_diacritics(&compat)
        .chars()
        .flat_map(|c| match c {
            'ß' => "ss".chars().collect::<Vec<_>>(),
            'ẞ' => "SS".chars().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect::<String>()
        .to_lowercase()
}

/// Canonical form used for every match in the search handlers
///
/// Compatibility-folds (full-width to ASCII), strips diacritics, expands `ß`,
/// lowercases, trims and collapses internal whitespace to single spaces.
///
/// # Examples
/// ```
/// use libretto::text::normalize_string;
///
/// assert_eq!(normalize_string("  Der  Rosenkavalier "), "der rosenkavalier");
/// assert_eq!(normalize_string("Süßes"), "susses");
/// ```
pub fn normalize_string(text: &str) -> String {
    let folded = fold(text);
    WHITESPACE_RUN.replace_all(folded.trim(), " ").into_owned()
}

/// Trimmed text with diacritics removed and `ß` expanded, case preserved.
pub fn normalize_german_for_sort(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    strip_diacritics(trimmed)
        .replace('ß', "ss")
        .replace('ẞ', "SS")
}

/// First letter of the sort form, upper-cased. `None` for blank text.
pub fn sort_letter(text: &str) -> Option<char> {
    normalize_german_for_sort(text)
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
}

/// Position of the letter bucket; anything outside A–Z sorts last.
fn letter_order(letter: Option<char>) -> usize {
    letter
        .and_then(|l| SORT_ALPHABET.iter().position(|&a| a == l))
        .unwrap_or(999)
}

/// German comparison at base strength: ignores case and diacritics.
fn compare_base(a: &str, b: &str) -> Ordering {
    fold(a.trim()).cmp(&fold(b.trim()))
}

/// Order used for the reference lists
///
/// Entries are bucketed by their initial letter first, then compared at base
/// strength. Entries equal at base strength compare equal, so a stable sort
/// keeps their sheet order.
pub fn compare_german(a: &str, b: &str) -> Ordering {
    letter_order(sort_letter(a))
        .cmp(&letter_order(sort_letter(b)))
        .then_with(|| compare_base(a, b))
}

/// Total German order: base strength first, raw text as tie-break.
pub fn compare_locale_de(a: &str, b: &str) -> Ordering {
    compare_base(a, b).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_width_case_and_diacritics() {
        assert_eq!(normalize_string("ＳＣＨÖＮ"), "schon");
        assert_eq!(normalize_string("Straße\t und\n Weg"), "strasse und weg");
        assert_eq!(normalize_string(""), "");
    }

    #[test]
    fn kana_voicing_marks_survive() {
        assert_eq!(normalize_string("ガラス パン"), "ガラス パン");
        assert_eq!(normalize_string("ｶﾞﾗｽ"), "ガラス");
        assert_eq!(normalize_german_for_sort("Übergänge"), "Ubergange");
    }

    #[test]
    fn sort_letter_uses_base_letter() {
        assert_eq!(sort_letter("Ärger"), Some('A'));
        assert_eq!(sort_letter("ßig"), Some('S'));
        assert_eq!(sort_letter("  "), None);
        assert_eq!(sort_letter("éclair"), Some('E'));
    }

    #[test]
    fn umlauts_file_under_base_letter() {
        let mut words = vec!["Zorn", "Äther", "Buch", "Abend", "«Zitat»"];
        words.sort_by(|a, b| compare_german(a, b));
        assert_eq!(words, vec!["Abend", "Äther", "Buch", "Zorn", "«Zitat»"]);
    }

    #[test]
    fn base_strength_ignores_case_and_accents() {
        assert_eq!(compare_german("Öl", "ol"), Ordering::Equal);
        assert_eq!(compare_locale_de("Öl", "ol"), "Öl".cmp("ol"));
        assert_eq!(compare_locale_de("Mutter", "Mütze"), Ordering::Less);
    }
}
