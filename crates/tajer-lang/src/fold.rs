// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text folding shared by every matching stage.
//!
//! Folded text is lowercase, has no diacritics (Latin accents, Arabic
//! tashkeel and hamza carriers are all stripped via NFD), no tatweel, no
//! punctuation, and single spaces between tokens. Lexicon entries are
//! folded the same way when compiled, so all comparisons happen on one form.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const TATWEEL: char = '\u{0640}';

/// Maps Arabic-Indic (U+0660..U+0669) and extended Arabic-Indic
/// (U+06F0..U+06F9) digits to ASCII digits. Every other char is kept.
pub fn fold_numerals(text: &str) -> String {
    text.chars().map(fold_digit).collect()
}

fn fold_digit(c: char) -> char {
    match c {
        '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
        '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
        _ => c,
    }
}

/// Full fold: numerals, lowercase, diacritics, Arabic letter variants,
/// punctuation to spaces, collapsed whitespace.
pub fn fold(text: &str) -> String {
    let stripped: String = fold_numerals(text)
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c) && *c != TATWEEL)
        .map(|c| match c {
            // alef maqsura and teh marbuta are spelled interchangeably
            '\u{0649}' => '\u{064A}',
            '\u{0629}' => '\u{0647}',
            c if c.is_alphanumeric() || c.is_whitespace() => c,
            _ => ' ',
        })
        .collect();
    collapse_whitespace(&stripped)
}

/// Trims and replaces every whitespace run with a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `text` has at least one letter in any script.
pub fn has_alphabetic(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Arabic-script letters, including presentation forms.
pub fn is_arabic_letter(c: char) -> bool {
    c.is_alphabetic()
        && matches!(
            c,
            '\u{0600}'..='\u{06FF}'
                | '\u{0750}'..='\u{077F}'
                | '\u{08A0}'..='\u{08FF}'
                | '\u{FB50}'..='\u{FDFF}'
                | '\u{FE70}'..='\u{FEFF}'
        )
}

/// Parses a bare menu number such as `3`, `٣` or ` 12. `.
///
/// Returns `None` when anything other than digits (and surrounding
/// whitespace or a trailing `.`/`)`) is present.
pub fn parse_number(text: &str) -> Option<u64> {
    let folded = fold_numerals(text);
    let trimmed = folded.trim().trim_end_matches(['.', ')']).trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
