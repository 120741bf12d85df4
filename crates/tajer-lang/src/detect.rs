// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message language detection.
//!
//! Arabic script decides on its own. Latin-script text is scored against
//! the lexicon's marker words, arabizi spelling (digits standing in for
//! Arabic letters) and French accents.

use std::sync::Arc;

use tajer_core::Language;

use crate::fold::{fold, has_alphabetic, is_arabic_letter};
use crate::lexicon::CompiledLexicon;

/// Digits used as letters in Lebanese transliteration (2=ء, 3=ع, 5=خ, 7=ح, 9=ق).
const ARABIZI_DIGITS: [char; 5] = ['2', '3', '5', '7', '9'];

const FRENCH_ACCENTS: &str = "éèêëàâçîïôûùœ";

#[derive(Debug, Clone)]
pub struct LanguageDetector {
    lexicon: Arc<CompiledLexicon>,
}

impl LanguageDetector {
    pub fn new(lexicon: Arc<CompiledLexicon>) -> Self {
        Self { lexicon }
    }

    /// Classifies `text`. Returns `None` when it carries no letters at all
    /// (menu digits, punctuation), leaving the caller's last known language
    /// in charge.
    pub fn detect(&self, text: &str) -> Option<Language> {
        if !has_alphabetic(text) {
            return None;
        }

        let arabic = text.chars().filter(|c| is_arabic_letter(*c)).count();
        let latin = text
            .chars()
            .filter(|c| c.is_alphabetic() && !is_arabic_letter(*c))
            .count();
        if arabic > 0 && arabic >= latin {
            return Some(Language::Ar);
        }

        let mut ar = 0;
        let mut en = 0;
        let mut fr = text
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.chars().any(|c| FRENCH_ACCENTS.contains(c)))
            .count();

        let markers = &self.lexicon.markers;
        let is_marker = |language: Language, token: &str| {
            markers.get(&language).is_some_and(|set| set.contains(token))
        };
        for token in fold(text).split(' ') {
            if is_arabizi(token) || is_marker(Language::Ar, token) {
                ar += 1;
            }
            if is_marker(Language::En, token) {
                en += 1;
            }
            if is_marker(Language::Fr, token) {
                fr += 1;
            }
        }

        // Ties go to the less common language: a single Lebanese or French
        // marker outweighs English filler.
        let language = if ar > 0 && ar >= fr && ar >= en {
            Language::Ar
        } else if fr > 0 && fr >= en {
            Language::Fr
        } else {
            Language::En
        };
        Some(language)
    }

    /// [`detect`](Self::detect), falling back to `previous` for messages
    /// without letters.
    pub fn resolve(&self, text: &str, previous: Language) -> Language {
        self.detect(text).unwrap_or(previous)
    }
}

/// `3andak`, `2alam`, `a7mar`: at least two ASCII letters plus a digit
/// that stands in for an Arabic letter.
fn is_arabizi(token: &str) -> bool {
    let letters = token.chars().filter(char::is_ascii_alphabetic).count();
    letters >= 2 && token.chars().any(|c| ARABIZI_DIGITS.contains(&c))
}
