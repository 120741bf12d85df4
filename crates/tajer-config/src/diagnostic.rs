// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for configuration problems.
//!
//! Figment extraction errors, validation failures and the problems found
//! while building the dialogue engine (an unreadable lexicon override, an
//! unusable custom answer pattern) all become a [`ConfigError`]. Where the
//! offending TOML is at hand the diagnostic points into it.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use tajer_core::TajerError;
use thiserror::Error;

/// Jaro-Winkler score a known key needs before it is offered as a fix.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// TOML files read for the current load, as `(display path, content)`.
pub type TomlSources = [(String, String)];

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(tajer::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[dialogue]`-style table name, or `the top level`.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not recognized here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(tajer::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("set here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(tajer::config::missing_key),
        help("add `{key} = <value>` to tajer.toml")
    )]
    MissingKey { key: String },

    /// A value that deserialized fine but makes no sense for the bot.
    #[error("{key}: {message}")]
    #[diagnostic(code(tajer::config::validation))]
    Validation { key: String, message: String },

    /// A `[[custom_answers]]` pattern that can never match a message.
    #[error("custom_answers[{index}] pattern `{pattern}` is unusable: {reason}")]
    #[diagnostic(
        code(tajer::config::custom_answer),
        help("patterns match whole words of the message after case and accent folding")
    )]
    CustomAnswer {
        index: usize,
        pattern: String,
        reason: String,
        #[label("this pattern")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// The `dialogue.lexicon_path` override could not be used.
    #[error("cannot load lexicon `{path}`: {reason}")]
    #[diagnostic(
        code(tajer::config::lexicon),
        help("fix the file or remove `dialogue.lexicon_path` to use the built-in lexicon")
    )]
    Lexicon {
        path: String,
        reason: String,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("{0}")]
    #[diagnostic(code(tajer::config::other))]
    Other(String),
}

impl ConfigError {
    pub fn validation(key: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn custom_answer(index: usize, pattern: &str, reason: impl Display) -> Self {
        Self::CustomAnswer {
            index,
            pattern: pattern.to_string(),
            reason: reason.to_string(),
            span: None,
            src: None,
        }
    }

    /// Lexicon failure. With a byte `span` the file is read back so the
    /// report can show the offending lines.
    pub fn lexicon(path: &Path, reason: impl Display, span: Option<Range<usize>>) -> Self {
        let display = path.display().to_string();
        let (span, src) = match span.zip(std::fs::read_to_string(path).ok()) {
            Some((range, content)) if range.end <= content.len() => (
                Some(SourceSpan::from(range)),
                Some(NamedSource::new(&display, content)),
            ),
            _ => (None, None),
        };
        Self::Lexicon {
            path: display,
            reason: reason.to_string(),
            span,
            src,
        }
    }

    /// Points a custom answer diagnostic at its pattern in `sources`.
    /// Other variants are returned unchanged.
    pub fn with_sources(self, sources: &TomlSources) -> Self {
        match self {
            Self::CustomAnswer {
                index,
                pattern,
                reason,
                span: None,
                src: None,
            } => {
                let found = sources.iter().find_map(|(name, content)| {
                    find_custom_pattern(content, index, &pattern).map(|offset| (name, content, offset))
                });
                let (span, src) = match found {
                    Some((name, content, offset)) => (
                        Some(SourceSpan::new(offset.into(), pattern.len() + 2)),
                        Some(NamedSource::new(name, content.clone())),
                    ),
                    None => (None, None),
                };
                Self::CustomAnswer {
                    index,
                    pattern,
                    reason,
                    span,
                    src,
                }
            }
            other => other,
        }
    }
}

impl From<ConfigError> for TajerError {
    fn from(err: ConfigError) -> Self {
        TajerError::Config(render_plain(&err))
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Converts every error inside a `figment::Error` into a diagnostic.
pub fn figment_to_config_errors(err: figment::Error, sources: &TomlSources) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let table: Vec<String> = error.path.iter().map(ToString::to_string).collect();
            let file = origin_file(&error);
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(sources, file.as_deref(), &table, field);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: section_name(&table),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(&table, field),
                },
                Kind::InvalidType(actual, expected) => {
                    // For type errors the path ends with the key itself.
                    let (parent, key) = match table.split_last() {
                        Some((key, parent)) => (parent, key.as_str()),
                        None => (&table[..0], ""),
                    };
                    let (span, src) = locate(sources, file.as_deref(), parent, key);
                    ConfigError::InvalidType {
                        key: table.join("."),
                        found: actual.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn origin_file(error: &figment::Error) -> Option<String> {
    match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => Some(path.display().to_string()),
        _ => None,
    }
}

fn section_name(table: &[String]) -> String {
    if table.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{}]", table.join("."))
    }
}

fn dotted(table: &[String], key: &str) -> String {
    table
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(key))
        .collect::<Vec<_>>()
        .join(".")
}

/// Span of `key` under `table`, searched in the file figment blamed, or in
/// every source when figment did not say.
fn locate(
    sources: &TomlSources,
    file: Option<&str>,
    table: &[String],
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    if key.is_empty() {
        return (None, None);
    }
    sources
        .iter()
        .filter(|(name, _)| file.is_none_or(|f| f == name))
        .find_map(|(name, content)| {
            let offset = find_key_offset(content, table, key)?;
            Some((
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(name, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Table path named by a `[a.b]` or `[[a.b]]` header line.
fn header_path(line: &str) -> Option<Vec<String>> {
    let inner = line
        .strip_prefix("[[")
        .and_then(|rest| rest.split("]]").next())
        .or_else(|| line.strip_prefix('[').and_then(|rest| rest.split(']').next()))?;
    Some(
        inner
            .split('.')
            .map(|part| part.trim().trim_matches('"').to_string())
            .collect(),
    )
}

/// Byte offset of `key` declared directly under `table` in TOML `content`.
///
/// Array indices in `table` are ignored, so `["custom_answers", "0"]`
/// matches any `[[custom_answers]]` block.
pub fn find_key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let wanted: Vec<&str> = table
        .iter()
        .map(String::as_str)
        .filter(|part| !part.chars().all(|c| c.is_ascii_digit()))
        .collect();
    let mut current: Vec<String> = Vec::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(path) = header_path(trimmed) {
            current = path;
        } else if current.iter().map(String::as_str).eq(wanted.iter().copied()) {
            let declares_key = trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if declares_key {
                return Some(offset + line.len() - trimmed.len());
            }
        }
        offset += line.len();
    }
    None
}

/// Byte offset of the quoted `pattern` inside the `index`-th
/// `[[custom_answers]]` block.
pub fn find_custom_pattern(content: &str, index: usize, pattern: &str) -> Option<usize> {
    let quoted = [format!("\"{pattern}\""), format!("'{pattern}'")];
    let mut blocks_seen = 0;
    let mut inside = false;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(path) = header_path(trimmed) {
            inside = trimmed.starts_with("[[") && path == ["custom_answers"];
            if inside {
                blocks_seen += 1;
            }
        } else if inside && blocks_seen == index + 1 {
            if let Some(found) = quoted.iter().find_map(|q| line.find(q.as_str())) {
                return Some(offset + found);
            }
        }
        offset += line.len();
    }
    None
}

/// Closest known key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Report text without colors, for errors that travel as strings.
fn render_plain(error: &ConfigError) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut buf = String::new();
    match handler.render_report(&mut buf, error) {
        Ok(()) => buf,
        Err(_) => error.to_string(),
    }
}

/// Prints each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP_TOML: &str = "\
[shop]
name = \"Abou Karim\"

[dialogue]
page_sise = 5

[[custom_answers]]
patterns = [\"parking\"]
answer = \"Behind the shop.\"

[[custom_answers]]
patterns = [\"wrap\", \"???\"]
answer = \"Free gift wrap.\"
";

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn suggests_the_closest_key() {
        let valid = &["name", "log_level", "default_language"];
        assert_eq!(suggest_key("nmae", valid), Some("name".to_string()));
        let valid = &["access_token", "phone_number_id", "verify_token"];
        assert_eq!(suggest_key("acces_token", valid), Some("access_token".to_string()));
        assert_eq!(suggest_key("zzzzzz", &["page_size", "max_quantity"]), None);
    }

    #[test]
    fn key_offset_respects_the_table() {
        let o = find_key_offset(SHOP_TOML, &path(&["dialogue"]), "page_sise").unwrap();
        assert_eq!(&SHOP_TOML[o..o + 9], "page_sise");
        assert_eq!(find_key_offset(SHOP_TOML, &path(&["shop"]), "page_sise"), None);
        let o = find_key_offset(SHOP_TOML, &[], "name");
        assert_eq!(o, None, "name lives under [shop], not the top level");
    }

    #[test]
    fn key_offset_skips_array_indices() {
        let o = find_key_offset(SHOP_TOML, &path(&["custom_answers", "1"]), "answer").unwrap();
        assert!(SHOP_TOML[o..].starts_with("answer = \"Behind"));
    }

    #[test]
    fn custom_pattern_is_found_in_its_own_block() {
        let o = find_custom_pattern(SHOP_TOML, 1, "???").unwrap();
        assert_eq!(&SHOP_TOML[o..o + 5], "\"???\"");
        assert_eq!(find_custom_pattern(SHOP_TOML, 0, "???"), None);
        assert_eq!(find_custom_pattern(SHOP_TOML, 2, "wrap"), None);
    }

    #[test]
    fn custom_answer_error_gains_a_span() {
        let sources = vec![("tajer.toml".to_string(), SHOP_TOML.to_string())];
        let error = ConfigError::custom_answer(1, "???", "has no letters or digits")
            .with_sources(&sources);
        let ConfigError::CustomAnswer { span, src, .. } = &error else {
            panic!("expected a custom answer error, got {error:?}");
        };
        assert!(span.is_some());
        assert!(src.is_some());
        let report = render_plain(&error);
        assert!(report.contains("custom_answers[1]"), "{report}");
        assert!(report.contains("tajer.toml"), "{report}");
    }

    #[test]
    fn lexicon_error_without_file_has_no_source() {
        let error = ConfigError::lexicon(Path::new("/nonexistent/lexicon.toml"), "not found", Some(0..3));
        assert!(matches!(error, ConfigError::Lexicon { span: None, src: None, .. }));
        assert!(error.help().is_some());
    }

    #[test]
    fn lexicon_error_points_into_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lexicon.toml");
        std::fs::write(&file, "version = 1\n[intents.greeting\n").unwrap();
        let error = ConfigError::lexicon(&file, "unclosed table", Some(12..29));
        assert!(matches!(error, ConfigError::Lexicon { span: Some(_), src: Some(_), .. }));
        let err: TajerError = error.into();
        let TajerError::Config(report) = err else {
            panic!("expected a config error");
        };
        assert!(report.contains("dialogue.lexicon_path"), "{report}");
        assert!(report.contains("[intents.greeting"), "{report}");
    }
}
