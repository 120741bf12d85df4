// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language handling for the Tajer dialogue engine.
//!
//! Everything here is driven by one [`Lexicon`]: a versioned TOML table of
//! request phrases, filler words, term translations, sort modifiers,
//! language markers and intent phrases. The lexicon is compiled once and
//! shared by the [`LanguageDetector`], the [`Normalizer`] and the
//! [`IntentMatcher`].

pub mod detect;
pub mod fold;
pub mod intent;
pub mod lexicon;
pub mod normalize;
pub mod phrase;

use std::path::Path;
use std::sync::Arc;

pub use detect::LanguageDetector;
pub use fold::{fold, fold_numerals, has_alphabetic, parse_number};
pub use intent::{IntentMatch, IntentMatcher};
pub use lexicon::{CompiledLexicon, IntentKind, Lexicon, LexiconError, SortDirective};
pub use normalize::{NormalizedQuery, Normalizer};
pub use phrase::PhraseMatcher;

/// Loads the lexicon at `path`, or the built-in one, and compiles it.
pub fn load_lexicon(path: Option<&Path>) -> Result<Arc<CompiledLexicon>, LexiconError> {
    let lexicon = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading lexicon override");
            Lexicon::load(path)?
        }
        None => Lexicon::builtin()?,
    };
    Ok(Arc::new(lexicon.compile()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lexicon_loads() {
        let lexicon = load_lexicon(None).unwrap();
        assert_eq!(lexicon.version(), lexicon::LEXICON_VERSION);
    }

    #[test]
    fn missing_override_file_is_an_io_error() {
        let err = load_lexicon(Some(Path::new("/nonexistent/lexicon.toml"))).unwrap_err();
        assert!(matches!(err, LexiconError::Io { .. }));
    }
}
