use ut_core::{DecisionCache, MatchStats, Matcher, ResourceType, RuleIndex};

use crate::hider::ElementHiding;
use crate::parser::FilterListLoader;

struct Engine {
    index: RuleIndex,
    cache: DecisionCache,
    stats: MatchStats,
}

impl Engine {
    fn from_list(text: &str) -> Self {
        let mut index = RuleIndex::new();
        let mut hiding = ElementHiding::new();
        FilterListLoader::new(&mut index, &mut hiding).load_str(text);
        Self {
            index,
            cache: DecisionCache::new(),
            stats: MatchStats::default(),
        }
    }

    fn blocks(&mut self, url: &str, page: Option<&str>, ty: ResourceType) -> bool {
        Matcher::new(&self.index, &mut self.cache, &mut self.stats).should_block(url, page, ty)
    }
}

#[test]
fn host_rule_blocks_matching_request() {
    let mut engine = Engine::from_list("||ads.example.com^\n");
    assert!(engine.blocks(
        "http://ads.example.com/banner.js",
        Some("http://example.com/"),
        ResourceType::Script
    ));
}

#[test]
fn host_anchor_still_matches_as_substring() {
    // `||` and `^` are dropped by the fixup, so the rule is a plain substring.
    let mut engine = Engine::from_list("||ads.example.com^\n");
    assert!(engine.blocks("http://notads.example.com/x.js", None, ResourceType::Script));
    assert!(!engine.blocks("http://example.com/x.js", None, ResourceType::Script));
}

#[test]
fn regex_literal_rule() {
    let mut engine = Engine::from_list("/banner\\d+\\.gif/\n");
    assert!(engine.blocks("http://x.com/banner42.gif", None, ResourceType::Image));
    assert!(!engine.blocks("http://x.com/bannerXX.gif", None, ResourceType::Image));
}

#[test]
fn left_anchor_is_honored() {
    let mut engine = Engine::from_list("|http://ads.\n");
    assert!(engine.blocks("http://ads.example.com/a.js", None, ResourceType::Script));
    assert!(!engine.blocks("https://x.com/?u=http://ads.example.com", None, ResourceType::Script));
}

#[test]
fn wildcard_rule_via_pattern_map() {
    let mut engine = Engine::from_list("/ads/*/banner\n");
    assert!(engine.blocks("http://x.com/ads/big/banner.png", None, ResourceType::Image));
    assert!(!engine.blocks("http://x.com/ads/banner.png", None, ResourceType::Image));
}

#[test]
fn third_party_rule_exemption() {
    let mut engine = Engine::from_list("||tracker.example.net^$script,third-party\n");
    assert!(!engine.blocks(
        "http://tracker.example.net/t.js",
        Some("http://tracker.example.net/dashboard"),
        ResourceType::Script
    ));

    let mut engine = Engine::from_list("||tracker.example.net^$script,third-party\n");
    assert!(engine.blocks(
        "http://tracker.example.net/t.js",
        Some("http://news.example.org/"),
        ResourceType::Script
    ));
}

#[test]
fn document_loads_are_immune() {
    let mut engine = Engine::from_list("||ads.example.com^\n*\n/banner\\d+\\.gif/\n");
    for url in ["http://ads.example.com/", "http://x.com/banner1.gif", "http://anything.org/"] {
        assert!(!engine.blocks(url, None, ResourceType::Document));
    }
}

#[test]
fn unsupported_rules_never_block() {
    let mut engine = Engine::from_list("@@ads.example.com\nads.js$domain=example.com\nframe.html$subdocument\n");
    assert!(engine.index.is_empty());
    assert!(!engine.blocks("http://ads.example.com/ads.js", None, ResourceType::Script));
    assert!(!engine.blocks("http://x.com/frame.html", None, ResourceType::Subdocument));
}

#[test]
fn element_hiding_lines_do_not_block() {
    let mut engine = Engine::from_list("##.ad\nexample.com##.promo\n");
    assert!(engine.index.is_empty());
    assert!(!engine.blocks("http://example.com/.ad", None, ResourceType::Other));
}

#[test]
fn repeated_query_is_cached() {
    let mut engine = Engine::from_list("||ads.example.com^\n/ads/*/banner\n");
    let first = engine.blocks("http://cdn.example.org/app.js", None, ResourceType::Script);
    let evaluations = engine.stats.regex_evaluations;
    let second = engine.blocks("http://cdn.example.org/app.js", None, ResourceType::Script);
    assert_eq!(first, second);
    assert_eq!(engine.stats.regex_evaluations, evaluations);
}
