//! Shared model types for the note browser.
//!
//! * [`DisplayItem`] is the read-only projection of a stored note that the
//!   widgets render. It carries no storage identity; once constructed it is
//!   never mutated.
//! * [`KeywordSet`] collects the lowercase keywords used for highlighting.
//!   Keywords are only ever added.
//! * [`Layout`] splits the terminal into the index and detail columns.

pub mod layout;

pub use layout::{Layout, LayoutRegion};

use chrono::{DateTime, Local, NaiveDate};
use std::collections::BTreeSet;

/// Renderable projection of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    body: String,
    created: DateTime<Local>,
    topics: Vec<String>,
    due: Option<NaiveDate>,
}

impl DisplayItem {
    pub fn new(body: impl Into<String>, created: DateTime<Local>) -> Self {
        Self {
            body: body.into(),
            created,
            topics: Vec::new(),
            due: None,
        }
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_due(mut self, due: Option<NaiveDate>) -> Self {
        self.due = due;
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created(&self) -> DateTime<Local> {
        self.created
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn due(&self) -> Option<NaiveDate> {
        self.due
    }

    /// First line of the body, used for index rows.
    pub fn summary(&self) -> &str {
        self.body.lines().next().unwrap_or("")
    }
}

/// Lowercase keywords. Insertion normalizes case; there is no removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    words: BTreeSet<String>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyword. Returns `true` if it was not present. Blank keywords are
    /// ignored.
    pub fn insert(&mut self, keyword: &str) -> bool {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.words.insert(trimmed.to_lowercase())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.words.contains(&keyword.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> Extend<S> for KeywordSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for word in iter {
            self.insert(word.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn display_item_builders() {
        let due = NaiveDate::from_ymd_opt(2024, 4, 1);
        let item = DisplayItem::new("first\nsecond", at(9))
            .with_topics(["work", "home"])
            .with_due(due);
        assert_eq!(item.summary(), "first");
        assert_eq!(item.topics(), ["work".to_string(), "home".to_string()]);
        assert_eq!(item.due(), due);
        assert_eq!(item.created(), at(9));
    }

    #[test]
    fn empty_body_summary() {
        assert_eq!(DisplayItem::new("", at(1)).summary(), "");
    }

    #[test]
    fn keywords_are_lowercased_and_deduped() {
        let mut set = KeywordSet::new();
        assert!(set.insert("Python"));
        assert!(!set.insert("python"));
        assert!(!set.insert("   "));
        assert!(set.contains("PYTHON"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["python"]);
    }

    #[test]
    fn keywords_collect() {
        let set: KeywordSet = ["Rust", "rust", "Go"].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
