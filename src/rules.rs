//! Suffix list text → immutable rule snapshot.
//!
//! This stage is pure: obtaining the text (file or network) lives in
//! [`crate::source`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{DomainError, Result, SourceErrorKind};
use crate::types::{RuleKind, RuleRecord};

/// Immutable set of suffix rules, one map per rule kind.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    normal: HashMap<String, RuleRecord>,
    wildcard: HashMap<String, RuleRecord>,
    exception: HashMap<String, RuleRecord>,
}

impl RuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from rules; later duplicates of the same (kind, name)
    /// replace earlier ones.
    pub fn from_rules(rules: impl IntoIterator<Item = RuleRecord>) -> Self {
        let mut store = Self::new();
        for rule in rules {
            store.insert(rule);
        }
        store
    }

    fn insert(&mut self, rule: RuleRecord) {
        let key = rule.key();
        self.map_mut(rule.kind).insert(key, rule);
    }

    fn map(&self, kind: RuleKind) -> &HashMap<String, RuleRecord> {
        match kind {
            RuleKind::Normal => &self.normal,
            RuleKind::Wildcard => &self.wildcard,
            RuleKind::Exception => &self.exception,
        }
    }

    fn map_mut(&mut self, kind: RuleKind) -> &mut HashMap<String, RuleRecord> {
        match kind {
            RuleKind::Normal => &mut self.normal,
            RuleKind::Wildcard => &mut self.wildcard,
            RuleKind::Exception => &mut self.exception,
        }
    }

    /// Case-insensitive lookup of a suffix for one rule kind
    pub fn get(&self, kind: RuleKind, name: &str) -> Option<&RuleRecord> {
        let map = self.map(kind);
        // Avoid the allocation when the caller already lowercased.
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            map.get(&name.to_lowercase())
        } else {
            map.get(name)
        }
    }

    /// Number of rules of one kind
    pub fn count(&self, kind: RuleKind) -> usize {
        self.map(kind).len()
    }

    /// Total number of rules
    pub fn len(&self) -> usize {
        RuleKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate all rules (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &RuleRecord> {
        self.normal
            .values()
            .chain(self.wildcard.values())
            .chain(self.exception.values())
    }
}

/// Parse suffix list text into a rule store.
pub fn parse_rules(text: &str) -> RuleStore {
    let store = RuleStore::from_rules(text.lines().filter_map(RuleRecord::from_line));
    debug!(
        "Loaded {} rules ({} normal, {} wildcard, {} exception)",
        store.len(),
        store.count(RuleKind::Normal),
        store.count(RuleKind::Wildcard),
        store.count(RuleKind::Exception)
    );
    store
}

/// Parse raw suffix list bytes; the data must be UTF-8.
pub fn parse_rules_from_bytes(bytes: &[u8]) -> Result<RuleStore> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| {
        DomainError::source_unavailable(
            SourceErrorKind::InvalidData,
            format!("Rule list is not valid UTF-8: {}", e),
        )
    })?;
    Ok(parse_rules(text))
}

/// Parse a suffix list file.
pub fn parse_rules_from_file(path: impl AsRef<Path>) -> Result<RuleStore> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        DomainError::source_unavailable(
            SourceErrorKind::FileError,
            format!("Failed to read rules file '{}': {}", path.display(), e),
        )
    })?;
    parse_rules_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
// ===BEGIN ICANN DOMAINS===

// com : https://www.verisign.com
com

// uk
*.uk
!parliament.uk

*.ck
!www.ck
";

    #[test]
    fn test_parse_sample() {
        let store = parse_rules(SAMPLE);
        assert_eq!(store.len(), 5);
        assert_eq!(store.count(RuleKind::Normal), 1);
        assert_eq!(store.count(RuleKind::Wildcard), 2);
        assert_eq!(store.count(RuleKind::Exception), 2);
        assert!(store.get(RuleKind::Normal, "com").is_some());
        assert!(store.get(RuleKind::Wildcard, "uk").is_some());
        assert!(store.get(RuleKind::Exception, "parliament.uk").is_some());
        assert!(store.get(RuleKind::Normal, "uk").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let store = parse_rules("Co.UK\n");
        let rule = store.get(RuleKind::Normal, "CO.uk").unwrap();
        assert_eq!(rule.name, "Co.UK");
        assert!(store.get(RuleKind::Normal, "co.uk").is_some());
    }

    #[test]
    fn test_duplicates_overwrite() {
        let store = parse_rules("com\nCOM\n");
        assert_eq!(store.count(RuleKind::Normal), 1);
        assert_eq!(store.get(RuleKind::Normal, "com").unwrap().name, "COM");
    }

    #[test]
    fn test_same_name_different_kinds_coexist() {
        let store = parse_rules("ck\n*.ck\n");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_empty_input_is_valid() {
        let store = parse_rules("// only comments\n\n");
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_crlf_lines() {
        let store = parse_rules("com\r\n*.uk\r\n");
        assert!(store.get(RuleKind::Normal, "com").is_some());
        assert!(store.get(RuleKind::Wildcard, "uk").is_some());
    }

    #[test]
    fn test_from_bytes_rejects_invalid_utf8() {
        let err = parse_rules_from_bytes(&[b'c', 0xff, b'm']).unwrap_err();
        assert_eq!(err.source_kind(), Some(SourceErrorKind::InvalidData));
    }

    #[test]
    fn test_from_bytes_strips_bom() {
        let store = parse_rules_from_bytes(b"\xEF\xBB\xBFcom\n").unwrap();
        assert!(store.get(RuleKind::Normal, "com").is_some());
    }

    #[test]
    fn test_from_missing_file() {
        let err = parse_rules_from_file("/nonexistent/public_suffix_list.dat").unwrap_err();
        assert_eq!(err.source_kind(), Some(SourceErrorKind::FileError));
    }
}
