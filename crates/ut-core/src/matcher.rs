//! Core Matching Engine
//!
//! Every resource load goes through here. The order is:
//!
//! 1. `Document` loads are always allowed
//! 2. decision cache
//! 3. signature-windowed lookup into the index
//! 4. linear scan of the pattern map (expensive, rarely reached)

use std::collections::HashSet;

use log::debug;

use crate::cache::DecisionCache;
use crate::fixup::{fixup_regexp, signature_windows};
use crate::index::RuleIndex;
use crate::types::{PatternId, ResourceType};

/// Counters for matcher activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Queries that reached the cache lookup
    pub queries: u64,
    pub cache_hits: u64,
    /// Individual regex evaluations, against request or page URL
    pub regex_evaluations: u64,
}

/// The core matching engine.
pub struct Matcher<'a> {
    index: &'a RuleIndex,
    cache: &'a mut DecisionCache,
    stats: &'a mut MatchStats,
}

impl<'a> Matcher<'a> {
    pub fn new(index: &'a RuleIndex, cache: &'a mut DecisionCache, stats: &'a mut MatchStats) -> Self {
        Self { index, cache, stats }
    }

    /// Decide whether `request_url` should be blocked.
    ///
    /// `page_url` is the referring page; when absent, third-party rules
    /// apply unconditionally. An empty request URL is never blocked.
    pub fn should_block(
        &mut self,
        request_url: &str,
        page_url: Option<&str>,
        resource_type: ResourceType,
    ) -> bool {
        if resource_type == ResourceType::Document || request_url.is_empty() {
            return false;
        }

        self.stats.queries += 1;
        if let Some(blocked) = self.cache.get(request_url) {
            self.stats.cache_hits += 1;
            return blocked;
        }

        let blocked = self.matched_by_signature(request_url, page_url)
            || self.matched_by_pattern(request_url, page_url);

        self.cache.insert(request_url, blocked);
        blocked
    }

    fn matched_by_signature(&mut self, request_url: &str, page_url: Option<&str>) -> bool {
        // Signatures are fixed-up patterns, so the URL goes through the same fixup.
        let uri = fixup_regexp("", request_url);
        let mut rejected: HashSet<PatternId> = HashSet::new();

        for window in signature_windows(&uri) {
            let id = match self.index.signature(window) {
                Some(id) => id,
                None => continue,
            };
            if rejected.contains(&id) {
                continue;
            }
            if self.check_rule(id, request_url, page_url) {
                return true;
            }
            rejected.insert(id);
        }

        false
    }

    fn matched_by_pattern(&mut self, request_url: &str, page_url: Option<&str>) -> bool {
        let index = self.index;
        index
            .full_patterns()
            .any(|(_, id)| self.check_rule(id, request_url, page_url))
    }

    /// A rule confirms a block when its regex matches the request URL and,
    /// for third-party rules, does not also match the page URL.
    fn check_rule(&mut self, id: PatternId, request_url: &str, page_url: Option<&str>) -> bool {
        let pattern = match self.index.pattern(id) {
            Some(pattern) => pattern,
            None => return false,
        };

        self.stats.regex_evaluations += 1;
        if !pattern.regex().is_match(request_url) {
            return false;
        }

        if pattern.is_third_party() {
            if let Some(page_url) = page_url {
                self.stats.regex_evaluations += 1;
                if pattern.regex().is_match(page_url) {
                    return false;
                }
            }
        }

        debug!("blocked {} by '{}'", request_url, pattern.raw_pattern());
        true
    }
}
