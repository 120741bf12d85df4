// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The versioned lookup tables behind detection, intents and normalization.
//!
//! A [`Lexicon`] is plain data, deserialized from TOML. The built-in table
//! ships in `lexicon/default.toml`; a shop can replace it with its own file.
//! [`Lexicon::compile`] folds every entry and builds the matchers once.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use tajer_core::Language;

use crate::fold::{fold, is_arabic_letter};
use crate::phrase::PhraseMatcher;

/// Lexicon format version this build understands.
pub const LEXICON_VERSION: u32 = 1;

const BUILTIN: &str = include_str!("../lexicon/default.toml");

/// Errors raised while loading or compiling a lexicon.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("failed to read lexicon {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid lexicon: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unsupported lexicon version {found}, expected {}", LEXICON_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("lexicon entry produced an invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result-ordering hint extracted from a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortDirective {
    /// Ascending price.
    Cheapest,
    /// Descending price.
    MostExpensive,
    /// In-stock first, then descending price.
    Best,
}

/// Universal and contextual intents recognized from fixed phrase sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    Help,
    ProductList,
    Cancel,
    OrderHistory,
    Next,
    Previous,
    Skip,
    FaqHours,
    FaqLocation,
    FaqDelivery,
    FaqContact,
}

impl IntentKind {
    /// FAQ intents fire when a phrase appears anywhere; the rest need the
    /// whole message to be made of their phrases.
    pub fn matches_anywhere(self) -> bool {
        matches!(
            self,
            IntentKind::FaqHours
                | IntentKind::FaqLocation
                | IntentKind::FaqDelivery
                | IntentKind::FaqContact
        )
    }
}

/// Phrases grouped by the language they signal.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PhraseSet {
    #[serde(default)]
    pub ar: Vec<String>,
    #[serde(default)]
    pub en: Vec<String>,
    #[serde(default)]
    pub fr: Vec<String>,
}

impl PhraseSet {
    fn for_language(&self, language: Language) -> &[String] {
        match language {
            Language::Ar => &self.ar,
            Language::En => &self.en,
            Language::Fr => &self.fr,
        }
    }

    fn all(&self) -> impl Iterator<Item = &String> {
        self.ar.iter().chain(&self.en).chain(&self.fr)
    }
}

/// Phrase sets for every [`IntentKind`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntentPhrases {
    #[serde(default)]
    pub greeting: PhraseSet,
    #[serde(default)]
    pub help: PhraseSet,
    #[serde(default)]
    pub product_list: PhraseSet,
    #[serde(default)]
    pub cancel: PhraseSet,
    #[serde(default)]
    pub order_history: PhraseSet,
    #[serde(default)]
    pub next: PhraseSet,
    #[serde(default)]
    pub previous: PhraseSet,
    #[serde(default)]
    pub skip: PhraseSet,
    #[serde(default)]
    pub faq_hours: PhraseSet,
    #[serde(default)]
    pub faq_location: PhraseSet,
    #[serde(default)]
    pub faq_delivery: PhraseSet,
    #[serde(default)]
    pub faq_contact: PhraseSet,
}

impl IntentPhrases {
    fn get(&self, kind: IntentKind) -> &PhraseSet {
        match kind {
            IntentKind::Greeting => &self.greeting,
            IntentKind::Help => &self.help,
            IntentKind::ProductList => &self.product_list,
            IntentKind::Cancel => &self.cancel,
            IntentKind::OrderHistory => &self.order_history,
            IntentKind::Next => &self.next,
            IntentKind::Previous => &self.previous,
            IntentKind::Skip => &self.skip,
            IntentKind::FaqHours => &self.faq_hours,
            IntentKind::FaqLocation => &self.faq_location,
            IntentKind::FaqDelivery => &self.faq_delivery,
            IntentKind::FaqContact => &self.faq_contact,
        }
    }
}

/// Maps shop vocabulary in any language to the catalog's canonical term.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TermRule {
    pub from: String,
    pub to: String,
    /// Language the source word belongs to; feeds detection when set.
    #[serde(default)]
    pub lang: Option<Language>,
}

/// A word or phrase that asks for a particular ordering.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModifierRule {
    pub token: String,
    pub directive: SortDirective,
}

/// Serialized lexicon, as written in TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Lexicon {
    pub version: u32,

    /// Multi-word request phrases removed before search ("do you have").
    #[serde(default)]
    pub phrases: Vec<String>,

    /// Single filler words removed before search.
    #[serde(default)]
    pub fillers: Vec<String>,

    /// Translation rules, applied after phrase and filler stripping.
    #[serde(default)]
    pub terms: Vec<TermRule>,

    /// Sort modifiers, extracted last.
    #[serde(default)]
    pub modifiers: Vec<ModifierRule>,

    /// Words that signal a language when seen in Latin-script text.
    #[serde(default)]
    pub markers: PhraseSet,

    #[serde(default)]
    pub intents: IntentPhrases,
}

impl Lexicon {
    /// The lexicon compiled into the binary.
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LexiconError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Folds every entry and builds the matchers.
    pub fn compile(&self) -> Result<CompiledLexicon, LexiconError> {
        if self.version != LEXICON_VERSION {
            return Err(LexiconError::UnsupportedVersion {
                found: self.version,
            });
        }

        let mut phrase_terms = Vec::new();
        let mut token_terms = Vec::new();
        for rule in &self.terms {
            let from = fold(&rule.from);
            let to = fold(&rule.to);
            if from.is_empty() || to.is_empty() {
                continue;
            }
            if from.contains(' ') {
                phrase_terms.push((from, to));
            } else {
                token_terms.push(TokenTerm {
                    arabic: from.chars().any(is_arabic_letter),
                    from,
                    to,
                });
            }
        }
        phrase_terms.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        let phrase_terms = phrase_terms
            .into_iter()
            .map(|(from, to)| {
                Regex::new(&format!(r"\b{}\b", regex::escape(&from))).map(|re| (re, to))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut directives = HashMap::new();
        for rule in &self.modifiers {
            directives.entry(fold(&rule.token)).or_insert(rule.directive);
        }
        let modifier_phrases: Vec<&String> = directives.keys().collect();
        let modifiers = PhraseMatcher::new(&modifier_phrases)?;

        let mut markers = HashMap::new();
        for language in Language::ALL {
            let mut set: HashSet<String> = self
                .markers
                .for_language(language)
                .iter()
                .map(|m| fold(m))
                .collect();
            set.extend(
                self.terms
                    .iter()
                    .filter(|t| t.lang == Some(language))
                    .flat_map(|t| {
                        fold(&t.from)
                            .split(' ')
                            .filter(|w| w.chars().count() > 1)
                            .map(str::to_string)
                            .collect::<Vec<_>>()
                    }),
            );
            set.remove("");
            markers.insert(language, set);
        }

        let mut intents = HashMap::new();
        for kind in IntentKind::iter() {
            let set = self.intents.get(kind);
            let per_language = Language::ALL
                .iter()
                .map(|&language| {
                    PhraseMatcher::new(set.for_language(language)).map(|m| (language, m))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let all: Vec<&String> = set.all().collect();
            intents.insert(
                kind,
                IntentSet {
                    all: PhraseMatcher::new(&all)?,
                    per_language,
                },
            );
        }

        Ok(CompiledLexicon {
            version: self.version,
            phrases: PhraseMatcher::new(&self.phrases)?,
            fillers: PhraseMatcher::new(&self.fillers)?,
            phrase_terms,
            token_terms,
            modifiers,
            directives,
            markers,
            intents,
        })
    }
}

/// Single-word translation rule, folded.
#[derive(Debug, Clone)]
pub(crate) struct TokenTerm {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) arabic: bool,
}

/// Latin word endings accepted on top of a dictionary word (plural, feminine).
const LATIN_SUFFIXES: [&str; 4] = ["s", "e", "es", "x"];

impl TokenTerm {
    /// Arabic-script words match anywhere inside a token so attached
    /// articles and prepositions (ال, و, ب) don't hide them. Latin words
    /// match the whole token or the token minus a plural/feminine ending,
    /// which keeps `vert` out of `vertical`.
    pub(crate) fn matches(&self, token: &str) -> bool {
        if token == self.from {
            return true;
        }
        if self.arabic {
            return self.from.chars().count() >= 3 && token.contains(self.from.as_str());
        }
        LATIN_SUFFIXES
            .iter()
            .any(|suffix| token.strip_suffix(*suffix) == Some(self.from.as_str()))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct IntentSet {
    pub(crate) all: PhraseMatcher,
    pub(crate) per_language: Vec<(Language, PhraseMatcher)>,
}

/// A lexicon ready for matching. Shared behind an `Arc` by the detector,
/// the normalizer and the intent matcher.
#[derive(Debug, Clone)]
pub struct CompiledLexicon {
    pub(crate) version: u32,
    pub(crate) phrases: PhraseMatcher,
    pub(crate) fillers: PhraseMatcher,
    pub(crate) phrase_terms: Vec<(Regex, String)>,
    pub(crate) token_terms: Vec<TokenTerm>,
    pub(crate) modifiers: PhraseMatcher,
    pub(crate) directives: HashMap<String, SortDirective>,
    pub(crate) markers: HashMap<Language, HashSet<String>>,
    pub(crate) intents: HashMap<IntentKind, IntentSet>,
}

impl CompiledLexicon {
    pub fn version(&self) -> u32 {
        self.version
    }
}
