// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rewrites free text into a canonical catalog search phrase.
//!
//! Stages run in a fixed order: fold (numerals first), phrase stripping,
//! filler stripping, term translation, modifier extraction. Each stage is
//! public so it can be exercised on its own.

use std::sync::Arc;

use crate::fold::{collapse_whitespace, fold};
use crate::lexicon::{CompiledLexicon, SortDirective};

/// Output of [`Normalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Canonical search term. May be empty.
    pub term: String,
    /// Sort hint found in the text, if any.
    pub directive: Option<SortDirective>,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    lexicon: Arc<CompiledLexicon>,
}

impl Normalizer {
    pub fn new(lexicon: Arc<CompiledLexicon>) -> Self {
        Self { lexicon }
    }

    /// Removes request phrases ("do you have", "avez-vous", "هل يوجد").
    pub fn strip_phrases(&self, folded: &str) -> String {
        self.lexicon.phrases.strip(folded)
    }

    /// Removes single filler words on word boundaries only.
    pub fn strip_fillers(&self, folded: &str) -> String {
        self.lexicon.fillers.strip(folded)
    }

    /// Replaces known vocabulary with canonical terms. Unknown tokens pass
    /// through, so mixed-language queries keep their catalog-language words.
    pub fn translate(&self, folded: &str) -> String {
        let mut text = collapse_whitespace(folded);
        for (pattern, to) in &self.lexicon.phrase_terms {
            text = pattern
                .replace_all(&text, regex::NoExpand(to.as_str()))
                .into_owned();
        }

        let terms = &self.lexicon.token_terms;
        text.split_whitespace()
            .map(|token| {
                terms
                    .iter()
                    .find(|t| t.from == token)
                    .or_else(|| terms.iter().find(|t| t.matches(token)))
                    .map_or(token, |t| t.to.as_str())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Strips sort modifiers. The leftmost one decides the directive.
    pub fn extract_modifier(&self, folded: &str) -> (String, Option<SortDirective>) {
        let modifiers = &self.lexicon.modifiers;
        match modifiers
            .find(folded)
            .and_then(|m| self.lexicon.directives.get(m).copied())
        {
            Some(directive) => (modifiers.strip(folded), Some(directive)),
            None => (collapse_whitespace(folded), None),
        }
    }

    /// Runs every stage until the text stops changing.
    ///
    /// A pass that changes anything either drops tokens or turns a token
    /// into an inert canonical term, so the pass budget grows with the
    /// token count. The budget also stops a lexicon whose rules cycle.
    pub fn normalize(&self, text: &str) -> NormalizedQuery {
        let mut current = fold(text);
        let mut directive = None;
        let max_passes = current.split(' ').count() * 2 + 2;

        for _ in 0..max_passes {
            let stripped = self.strip_fillers(&self.strip_phrases(&current));
            let (term, found) = self.extract_modifier(&self.translate(&stripped));
            directive = directive.or(found);
            if term == current {
                break;
            }
            current = term;
        }

        NormalizedQuery {
            term: current,
            directive,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use proptest::prelude::*;

    use super::*;
    use crate::lexicon::Lexicon;

    static NORMALIZER: LazyLock<Normalizer> = LazyLock::new(|| {
        Normalizer::new(Arc::new(Lexicon::builtin().unwrap().compile().unwrap()))
    });

    fn term(text: &str) -> String {
        NORMALIZER.normalize(text).term
    }

    #[test]
    fn english_request_reduces_to_product() {
        assert_eq!(term("Do you have pens?"), "pens");
        assert_eq!(term("I want a notebook please"), "notebook");
    }

    #[test]
    fn french_request_translates() {
        assert_eq!(term("Avez-vous des stylos bleus ?"), "pen blue");
        assert_eq!(term("je cherche un cahier s'il vous plaît"), "notebook");
        assert_eq!(term("sac à dos"), "backpack");
    }

    #[test]
    fn arabizi_request_translates() {
        assert_eq!(term("fi 3andak 2alam a7mar?"), "pen red");
        assert_eq!(term("badde daftar"), "notebook");
    }

    #[test]
    fn arabic_request_translates_through_articles() {
        assert_eq!(term("هل يوجد أقلام"), "pen");
        assert_eq!(term("بدي القلم الأزرق"), "pen blue");
        assert_eq!(term("آلة حاسبة"), "calculator");
    }

    #[test]
    fn unknown_words_pass_through() {
        assert_eq!(term("stylo parker"), "pen parker");
        assert_eq!(term("staedtler"), "staedtler");
    }

    #[test]
    fn salam_is_not_a_pen() {
        assert_eq!(term("salam"), "salam");
    }

    #[test]
    fn vertical_is_not_green() {
        assert_eq!(term("vertical file"), "vertical file");
    }

    #[test]
    fn filler_fragments_do_not_break_product_words() {
        for word in ["marker", "file", "label", "mallet", "final", "mask", "shift"] {
            assert_eq!(term(&format!("ma {word} fi")), word, "input around {word}");
            assert_eq!(term(word), word);
        }
    }

    #[test]
    fn numerals_are_folded_first() {
        assert_eq!(term("دفتر ٢٠٠ ورقة"), "notebook 200 paper");
    }

    #[test]
    fn modifier_sets_directive() {
        let q = NORMALIZER.normalize("cheapest pen");
        assert_eq!(q.term, "pen");
        assert_eq!(q.directive, Some(SortDirective::Cheapest));

        let q = NORMALIZER.normalize("le stylo le plus cher");
        assert_eq!(q.term, "pen");
        assert_eq!(q.directive, Some(SortDirective::MostExpensive));

        let q = NORMALIZER.normalize("أحسن دفتر");
        assert_eq!(q.term, "notebook");
        assert_eq!(q.directive, Some(SortDirective::Best));
    }

    #[test]
    fn modifier_alone_leaves_empty_term() {
        let q = NORMALIZER.normalize("cheapest");
        assert_eq!(q.term, "");
        assert_eq!(q.directive, Some(SortDirective::Cheapest));
    }

    #[test]
    fn leftmost_modifier_wins() {
        let q = NORMALIZER.normalize("cheap or expensive pens");
        assert_eq!(q.directive, Some(SortDirective::Cheapest));
    }

    #[test]
    fn stages_are_usable_on_their_own() {
        assert_eq!(NORMALIZER.strip_phrases("do you have pens"), "pens");
        assert_eq!(NORMALIZER.strip_fillers("i want pens"), "pens");
        assert_eq!(NORMALIZER.translate("stylos rouges"), "pen red");
        assert_eq!(
            NORMALIZER.extract_modifier("best pen"),
            ("pen".to_string(), Some(SortDirective::Best))
        );
    }

    const VOCAB: &[&str] = &[
        "do", "you", "have", "avez", "vous", "des", "stylo", "stylos", "2alam", "قلم", "القلم",
        "cheapest", "plus", "cher", "moins", "ma", "fi", "marker", "file", "sac", "a", "dos",
        "taille", "crayon", "هل", "يوجد", "٣", "12", "pen", "blue", "vert", "verte", "parker",
        "badde", "3andak", "i", "want", "best", "أرخص", "school", "bag", "il", "y",
    ];

    proptest! {
        #[test]
        fn normalize_is_idempotent(words in prop::collection::vec(prop::sample::select(VOCAB), 0..8)) {
            let once = NORMALIZER.normalize(&words.join(" "));
            let twice = NORMALIZER.normalize(&once.term);
            prop_assert_eq!(&twice.term, &once.term);
        }

        #[test]
        fn normalize_is_idempotent_on_free_text(text in "[a-z0-9 ]{0,40}") {
            let once = NORMALIZER.normalize(&text);
            prop_assert_eq!(NORMALIZER.normalize(&once.term).term, once.term);
        }
    }
}
