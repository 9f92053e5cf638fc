//! Keyword extraction.
//!
//! A note's keywords are every `%%marked%%` phrase (lowercased) plus every word
//! of the body that is already a known keyword. Markers are non-greedy, so
//! `%%a%% and %%b%%` yields `a` and `b`.

use regex::Regex;
use std::collections::BTreeSet;
use unicode_segmentation::UnicodeSegmentation;

pub const MARKER_PATTERN: &str = "%%(.+?)%%";

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    marker: Regex,
}

impl KeywordExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            marker: Regex::new(MARKER_PATTERN)?,
        })
    }

    /// Explicitly marked keywords only.
    pub fn marked(&self, body: &str) -> BTreeSet<String> {
        self.marker
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Marked keywords plus body words found in `known`.
    pub fn extract(&self, body: &str, known: &BTreeSet<String>) -> BTreeSet<String> {
        let mut out = self.marked(body);
        if !known.is_empty() {
            out.extend(
                body.unicode_words()
                    .map(str::to_lowercase)
                    .filter(|w| known.contains(w)),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn markers_are_lowercased_and_non_greedy() {
        let x = KeywordExtractor::new().unwrap();
        assert_eq!(
            x.marked("%%Python%% and %%Big Data%% but not %%"),
            set(&["big data", "python"])
        );
    }

    #[test]
    fn known_words_are_picked_up() {
        let x = KeywordExtractor::new().unwrap();
        let known = set(&["rust", "milk"]);
        assert_eq!(
            x.extract("Learning Rust, then buy milk. %%Cargo%%", &known),
            set(&["cargo", "milk", "rust"])
        );
    }

    #[test]
    fn partial_words_do_not_match() {
        let x = KeywordExtractor::new().unwrap();
        let known = set(&["rust"]);
        assert!(x.extract("trusty crustacean", &known).is_empty());
    }
}
