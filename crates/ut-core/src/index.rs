//! Compiled rule store
//!
//! Patterns live in an arena; two maps point into it:
//!
//! - `signatures`: 8-byte signature -> pattern, first registration wins
//! - `full_patterns`: whole fixed-up pattern -> pattern, scanned linearly
//!   when no signature confirms a match

use std::collections::HashMap;

use crate::types::{FilterPattern, PatternId};

/// Sizes of the index, for logging and CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub patterns: usize,
    pub signatures: usize,
    pub full_patterns: usize,
}

#[derive(Debug, Default)]
pub struct RuleIndex {
    patterns: Vec<FilterPattern>,
    signatures: HashMap<String, PatternId>,
    full_patterns: HashMap<String, PatternId>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pattern under the given signatures and, optionally, under
    /// `full_key` in the pattern map.
    ///
    /// Signatures already owned by another pattern are left untouched, and
    /// so is an existing `full_key` entry. Returns the new pattern id, or
    /// `None` when nothing would point at the pattern.
    pub fn insert(
        &mut self,
        pattern: FilterPattern,
        signatures: &[&str],
        full_key: Option<&str>,
    ) -> Option<PatternId> {
        let free_signatures: Vec<&str> = signatures
            .iter()
            .copied()
            .filter(|sig| !self.signatures.contains_key(*sig))
            .collect();
        let full_key = full_key.filter(|key| !self.full_patterns.contains_key(*key));

        if free_signatures.is_empty() && full_key.is_none() {
            return None;
        }

        let id = self.patterns.len();
        self.patterns.push(pattern);

        for sig in free_signatures {
            self.signatures.entry(sig.to_string()).or_insert(id);
        }
        if let Some(key) = full_key {
            self.full_patterns.insert(key.to_string(), id);
        }

        Some(id)
    }

    /// Look up the pattern owning `signature`.
    #[inline]
    pub fn signature(&self, signature: &str) -> Option<PatternId> {
        self.signatures.get(signature).copied()
    }

    #[inline]
    pub fn has_signature(&self, signature: &str) -> bool {
        self.signatures.contains_key(signature)
    }

    #[inline]
    pub fn has_full_pattern(&self, key: &str) -> bool {
        self.full_patterns.contains_key(key)
    }

    #[inline]
    pub fn pattern(&self, id: PatternId) -> Option<&FilterPattern> {
        self.patterns.get(id)
    }

    /// Iterate the pattern map. Order is unspecified.
    pub fn full_patterns(&self) -> impl Iterator<Item = (&str, PatternId)> {
        self.full_patterns.iter().map(|(key, id)| (key.as_str(), *id))
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn full_pattern_count(&self) -> usize {
        self.full_patterns.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty() && self.full_patterns.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            patterns: self.patterns.len(),
            signatures: self.signatures.len(),
            full_patterns: self.full_patterns.len(),
        }
    }

    /// Drop every compiled rule.
    pub fn clear(&mut self) {
        self.patterns.clear();
        self.signatures.clear();
        self.full_patterns.clear();
    }
}
