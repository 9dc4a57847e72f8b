//! Denylist of location names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::location::{normalize_name, LocationRecord};

/// Set of normalized (lowercased, trimmed) names that must never be shown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blocklist {
    names: BTreeSet<String>,
}

impl Blocklist {
    /// An empty blocklist; blocks nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a blocklist from raw names, normalizing and dropping blanks.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| normalize_name(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// True if `name` is blocked (compared normalized).
    pub fn contains(&self, name: &str) -> bool {
        !self.names.is_empty() && self.names.contains(&normalize_name(name))
    }

    /// True if the record's identity is blocked.
    pub fn blocks(&self, record: &LocationRecord) -> bool {
        self.contains(&record.location)
    }

    /// Splits records into `(allowed, blocked)`, preserving order.
    pub fn partition(&self, records: Vec<LocationRecord>) -> (Vec<LocationRecord>, Vec<LocationRecord>) {
        if self.names.is_empty() {
            return (records, Vec::new());
        }
        records.into_iter().partition(|r| !self.blocks(r))
    }

    /// Number of blocked names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing is blocked.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Blocked names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names_normalizes() {
        let list = Blocklist::from_names(["  Cafe X ", "", "   ", "LIBRARY"]);
        assert_eq!(list.len(), 2);
        assert!(list.contains("cafe x"));
        assert!(list.contains("Library "));
        assert!(!list.contains("Park"));
    }

    #[test]
    fn test_partition_preserves_order() {
        let list = Blocklist::from_names(["b"]);
        let records = ["A", "B", "C"]
            .iter()
            .map(|n| LocationRecord::new(*n).unwrap())
            .collect();
        let (kept, blocked) = list.partition(records);
        let kept: Vec<_> = kept.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(kept, vec!["A", "C"]);
        assert_eq!(blocked.len(), 1);
    }

    #[test]
    fn test_empty_blocks_nothing() {
        let list = Blocklist::new();
        assert!(list.is_empty());
        assert!(!list.contains(""));
    }

    #[test]
    fn test_serde_transparent() {
        let list = Blocklist::from_names(["b", "a"]);
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["a","b"]"#);
    }
}
