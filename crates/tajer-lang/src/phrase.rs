// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-phrase matching on folded text.

use regex::Regex;

use crate::fold::{collapse_whitespace, fold};

/// Matches any of a set of phrases on word boundaries.
///
/// Phrases are folded on construction and tried longest first, so
/// "do you have" wins over "do you" at the same position. Word boundaries
/// are Unicode-aware: `ma` never matches inside `marker`, and `قلم`
/// never matches inside `اقلام`.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    regex: Option<Regex>,
}

impl PhraseMatcher {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Result<Self, regex::Error> {
        let mut folded: Vec<String> = phrases
            .iter()
            .map(|p| fold(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        folded.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        folded.dedup();

        if folded.is_empty() {
            return Ok(Self { regex: None });
        }
        let alternation = folded
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(r"\b(?:{alternation})\b"))?;
        Ok(Self { regex: Some(regex) })
    }

    /// True when any phrase occurs in `folded`.
    pub fn is_match(&self, folded: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(folded))
    }

    /// True when `folded` consists of nothing but phrases from this set.
    pub fn matches_whole(&self, folded: &str) -> bool {
        !folded.trim().is_empty() && self.is_match(folded) && self.strip(folded).is_empty()
    }

    /// Total chars covered by matches. Used to weigh competing sets.
    pub fn coverage(&self, folded: &str) -> usize {
        self.regex.as_ref().map_or(0, |re| {
            re.find_iter(folded).map(|m| m.as_str().chars().count()).sum()
        })
    }

    /// The leftmost match, if any.
    pub fn find<'t>(&self, folded: &'t str) -> Option<&'t str> {
        self.regex
            .as_ref()
            .and_then(|re| re.find(folded))
            .map(|m| m.as_str())
    }

    /// Removes every match, repeating until nothing more is removed.
    pub fn strip(&self, folded: &str) -> String {
        let Some(re) = &self.regex else {
            return collapse_whitespace(folded);
        };
        let mut current = collapse_whitespace(folded);
        loop {
            let next = collapse_whitespace(&re.replace_all(&current, " "));
            if next == current {
                return current;
            }
            current = next;
        }
    }
}
