//! Per-URL decision memo.

use std::collections::HashMap;

/// Request URL -> blocked. Grows for the lifetime of the rule set; cleared
/// together with the index on reload.
#[derive(Debug, Default)]
pub struct DecisionCache {
    decisions: HashMap<String, bool>,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, url: &str) -> Option<bool> {
        self.decisions.get(url).copied()
    }

    pub fn insert(&mut self, url: &str, blocked: bool) {
        self.decisions.insert(url.to_string(), blocked);
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn clear(&mut self) {
        self.decisions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_clears_decisions() {
        let mut cache = DecisionCache::new();
        assert_eq!(cache.get("http://a.com/x.js"), None);

        cache.insert("http://a.com/x.js", true);
        cache.insert("http://a.com/y.js", false);
        assert_eq!(cache.get("http://a.com/x.js"), Some(true));
        assert_eq!(cache.get("http://a.com/y.js"), Some(false));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
