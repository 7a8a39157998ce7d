use std::fmt;

use crate::errors::{Result, WikiError};

/// Ordered `key: value` annotations from a page header.
///
/// Keys are case-sensitive and unique; inserting an existing key replaces its
/// value in place. Values never contain line breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value, validating the key and flattening line breaks
    /// in the value.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() || key.contains([':', '\n', '\r']) {
            return Err(WikiError::InvalidMetadata(format!("bad key {:?}", key)));
        }
        let value = value.replace(['\r', '\n'], " ");
        self.set_unchecked(key.to_string(), value.trim().to_string());
        Ok(())
    }

    /// Used by the parser, which only ever produces single-line keys and values.
    pub(crate) fn set_unchecked(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `tags` value split on commas, trimmed, empty tokens dropped
    pub fn tags(&self) -> Vec<String> {
        self.get("tags")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Serialized header block: one `key: value` line per entry
impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_and_keeps_position() {
        let mut meta = Metadata::new();
        meta.insert("title", "One").unwrap();
        meta.insert("tags", "a").unwrap();
        meta.insert("title", "Two").unwrap();
        let keys: Vec<_> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["title", "tags"]);
        assert_eq!(meta.get("title"), Some("Two"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut meta = Metadata::new();
        meta.insert("Title", "x").unwrap();
        assert_eq!(meta.get("title"), None);
    }

    #[test]
    fn rejects_keys_that_would_not_round_trip() {
        let mut meta = Metadata::new();
        assert!(meta.insert("", "x").is_err());
        assert!(meta.insert("a:b", "x").is_err());
        assert!(meta.insert("a\nb", "x").is_err());
    }

    #[test]
    fn flattens_newlines_in_values() {
        let mut meta = Metadata::new();
        meta.insert("summary", "line one\nline two").unwrap();
        assert_eq!(meta.get("summary"), Some("line one line two"));
    }

    #[test]
    fn splits_tags() {
        let mut meta = Metadata::new();
        meta.insert("tags", "tag1, tag2,, tag3 ").unwrap();
        assert_eq!(meta.tags(), vec!["tag1", "tag2", "tag3"]);
        assert!(Metadata::new().tags().is_empty());
    }

    #[test]
    fn displays_as_header_lines() {
        let mut meta = Metadata::new();
        meta.insert("title", "Home").unwrap();
        meta.insert("tags", "a, b").unwrap();
        assert_eq!(meta.to_string(), "title: Home\ntags: a, b\n");
    }
}
