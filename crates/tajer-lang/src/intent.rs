// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-phrase intent recognition.

use std::sync::Arc;

use tajer_core::Language;

use crate::fold::fold;
use crate::lexicon::{CompiledLexicon, IntentKind};

/// A recognized intent and the language its phrases belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentMatch {
    pub kind: IntentKind,
    /// Language whose phrases cover most of the message. `None` when the
    /// phrase is shared between languages ("stop", "ok").
    pub language: Option<Language>,
}

#[derive(Debug, Clone)]
pub struct IntentMatcher {
    lexicon: Arc<CompiledLexicon>,
}

impl IntentMatcher {
    pub fn new(lexicon: Arc<CompiledLexicon>) -> Self {
        Self { lexicon }
    }

    /// Checks `text` against one intent.
    pub fn matches(&self, kind: IntentKind, text: &str) -> Option<IntentMatch> {
        let folded = fold(text);
        let set = self.lexicon.intents.get(&kind)?;
        let hit = if kind.matches_anywhere() {
            set.all.is_match(&folded)
        } else {
            set.all.matches_whole(&folded)
        };
        if !hit {
            return None;
        }

        let mut best: Option<(Language, usize)> = None;
        let mut tied = false;
        for (language, matcher) in &set.per_language {
            let coverage = matcher.coverage(&folded);
            if coverage == 0 {
                continue;
            }
            match best {
                Some((_, top)) if coverage < top => {}
                Some((_, top)) if coverage == top => tied = true,
                _ => {
                    best = Some((*language, coverage));
                    tied = false;
                }
            }
        }

        Some(IntentMatch {
            kind,
            language: if tied { None } else { best.map(|(l, _)| l) },
        })
    }

    /// True when `text` matches `kind`.
    pub fn is(&self, kind: IntentKind, text: &str) -> bool {
        self.matches(kind, text).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::lexicon::Lexicon;

    static MATCHER: LazyLock<IntentMatcher> = LazyLock::new(|| {
        IntentMatcher::new(Arc::new(Lexicon::builtin().unwrap().compile().unwrap()))
    });

    #[test]
    fn greetings_carry_their_language() {
        let cases = [
            ("Hello!", Language::En),
            ("good morning", Language::En),
            ("Bonjour", Language::Fr),
            ("salut", Language::Fr),
            ("مرحبا", Language::Ar),
            ("السلام عليكم", Language::Ar),
            ("marhaba", Language::Ar),
            ("kifak", Language::Ar),
        ];
        for (text, language) in cases {
            let m = MATCHER
                .matches(IntentKind::Greeting, text)
                .unwrap_or_else(|| panic!("{text} is a greeting"));
            assert_eq!(m.language, Some(language), "{text}");
        }
    }

    #[test]
    fn greeting_must_be_the_whole_message() {
        assert!(!MATCHER.is(IntentKind::Greeting, "hello do you have pens"));
        assert!(!MATCHER.is(IntentKind::Greeting, "high"));
        assert!(MATCHER.is(IntentKind::Greeting, "hi hello"));
    }

    #[test]
    fn faq_matches_anywhere() {
        assert!(MATCHER.is(IntentKind::FaqHours, "what are your opening hours?"));
        assert!(MATCHER.is(IntentKind::FaqDelivery, "do you do delivery to Jounieh"));
        assert!(MATCHER.is(IntentKind::FaqLocation, "وين المحل"));
        assert!(!MATCHER.is(IntentKind::FaqDelivery, "pens"));
    }

    #[test]
    fn mixed_language_whole_match_has_no_language() {
        let m = MATCHER.matches(IntentKind::Greeting, "hello salam").unwrap();
        assert_eq!(m.language, None);
    }

    #[test]
    fn navigation_words() {
        assert!(MATCHER.is(IntentKind::Next, "next"));
        assert!(MATCHER.is(IntentKind::Next, "Suivant"));
        assert!(MATCHER.is(IntentKind::Previous, "السابق"));
        assert!(MATCHER.is(IntentKind::Skip, "non"));
        assert!(MATCHER.is(IntentKind::Cancel, "إلغاء"));
        assert!(MATCHER.is(IntentKind::OrderHistory, "my orders"));
        assert!(MATCHER.is(IntentKind::ProductList, "produits"));
        assert!(!MATCHER.is(IntentKind::Next, "next pen"));
    }

    #[test]
    fn single_letters_do_not_page() {
        for letter in ["n", "p", "N", "P"] {
            assert!(!MATCHER.is(IntentKind::Next, letter), "{letter}");
            assert!(!MATCHER.is(IntentKind::Previous, letter), "{letter}");
        }
        assert!(MATCHER.is(IntentKind::Next, "next page"));
    }
}
