use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};

use ut_core::index::RuleIndex;

use crate::compiler::{compile_rule, CompileOutcome, RuleType};
use crate::error::CompileError;
use crate::hider::ElementHiding;

/// Longest line the loader accepts, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 2000;

/// Classification of one filter-list line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or `!` comment
    Comment,
    /// `@@` exception rule
    Whitelist,
    /// `[Adblock Plus 2.0]`-style section tag
    Section,
    /// Rule restricted with `domain=`
    DomainScoped,
    /// Leading space
    Blank,
    /// `##selector` or `#selector`
    ElementHider(&'a str),
    /// `domains##selector` or `domains#selector`
    DomainHider { line: &'a str, separator: &'static str },
    /// `#@#` element-hiding exception
    HiderException,
    /// URL rule with anchor consumed
    Rule {
        body: &'a str,
        prefix: &'static str,
        rule_type: RuleType,
    },
}

/// Classify a line with trailing whitespace already stripped.
pub fn classify_line(line: &str) -> LineKind<'_> {
    if line.is_empty() || line.starts_with('!') {
        return LineKind::Comment;
    }
    if line.starts_with("@@") {
        return LineKind::Whitelist;
    }
    if line.starts_with('[') {
        return LineKind::Section;
    }
    if line.contains("domain=") {
        return LineKind::DomainScoped;
    }
    if line.starts_with(' ') || line.trim().is_empty() {
        return LineKind::Blank;
    }
    if line.contains("#@#") {
        return LineKind::HiderException;
    }
    if let Some(selector) = line.strip_prefix("##") {
        return LineKind::ElementHider(selector);
    }
    if let Some(selector) = line.strip_prefix('#') {
        return LineKind::ElementHider(selector);
    }
    if line.contains("##") {
        return LineKind::DomainHider { line, separator: "##" };
    }
    if line.contains('#') {
        return LineKind::DomainHider { line, separator: "#" };
    }
    if let Some(body) = line.strip_prefix("||") {
        return LineKind::Rule { body, prefix: "", rule_type: RuleType::FullUri };
    }
    if let Some(body) = line.strip_prefix('|') {
        return LineKind::Rule { body, prefix: "^", rule_type: RuleType::FullUri };
    }
    LineKind::Rule { body: line, prefix: "", rule_type: RuleType::Uri }
}

/// Counters for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub lines: usize,
    pub rules: usize,
    /// Rules whose every index slot was already taken
    pub shadowed: usize,
    pub comments: usize,
    pub whitelist: usize,
    pub sections: usize,
    pub domain_scoped: usize,
    pub subdocument: usize,
    pub hider_accepted: usize,
    pub hider_rejected: usize,
    pub invalid: usize,
    pub too_long: usize,
}

impl LoadStats {
    pub fn merge(&mut self, other: &LoadStats) {
        self.lines += other.lines;
        self.rules += other.rules;
        self.shadowed += other.shadowed;
        self.comments += other.comments;
        self.whitelist += other.whitelist;
        self.sections += other.sections;
        self.domain_scoped += other.domain_scoped;
        self.subdocument += other.subdocument;
        self.hider_accepted += other.hider_accepted;
        self.hider_rejected += other.hider_rejected;
        self.invalid += other.invalid;
        self.too_long += other.too_long;
    }
}

/// Feeds filter-list text into a rule index.
pub struct FilterListLoader<'a> {
    index: &'a mut RuleIndex,
    hiding: &'a mut ElementHiding,
    max_line_len: usize,
}

impl<'a> FilterListLoader<'a> {
    pub fn new(index: &'a mut RuleIndex, hiding: &'a mut ElementHiding) -> Self {
        Self {
            index,
            hiding,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Load a filter-list file. Fails only if the file cannot be read.
    pub fn load_file(&mut self, path: &Path) -> io::Result<LoadStats> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let stats = self.load_str(&text);
        debug!(
            "loaded {}: {} lines, {} rules, {} invalid",
            path.display(),
            stats.lines,
            stats.rules,
            stats.invalid
        );
        Ok(stats)
    }

    /// Load filter-list text. Bad lines are counted and skipped.
    pub fn load_str(&mut self, text: &str) -> LoadStats {
        let mut stats = LoadStats::default();

        for (lineno, raw_line) in text.lines().enumerate() {
            stats.lines += 1;
            let line = raw_line.trim_end();

            if line.len() > self.max_line_len {
                debug!("line {}: {}", lineno + 1, CompileError::LineTooLong(line.len()));
                stats.too_long += 1;
                continue;
            }

            self.load_line(line, lineno + 1, &mut stats);
        }

        stats
    }

    fn load_line(&mut self, line: &str, lineno: usize, stats: &mut LoadStats) {
        match classify_line(line) {
            LineKind::Comment | LineKind::Blank => stats.comments += 1,
            LineKind::Whitelist => stats.whitelist += 1,
            LineKind::Section => stats.sections += 1,
            LineKind::DomainScoped => stats.domain_scoped += 1,
            LineKind::HiderException => stats.hider_rejected += 1,
            LineKind::ElementHider(selector) => {
                if self.hiding.add_generic(selector) {
                    stats.hider_accepted += 1;
                } else {
                    stats.hider_rejected += 1;
                }
            }
            LineKind::DomainHider { line, separator } => {
                if self.hiding.add_per_domain(line, separator) {
                    stats.hider_accepted += 1;
                } else {
                    stats.hider_rejected += 1;
                }
            }
            LineKind::Rule { body, prefix, rule_type } => {
                match compile_rule(self.index, body, prefix, rule_type) {
                    Ok(CompileOutcome::Indexed { .. }) => stats.rules += 1,
                    Ok(CompileOutcome::Shadowed) => stats.shadowed += 1,
                    Err(CompileError::Subdocument) => stats.subdocument += 1,
                    Err(err @ CompileError::InvalidRegex { .. }) => {
                        warn!("line {}: {}", lineno, err);
                        stats.invalid += 1;
                    }
                    Err(err) => {
                        debug!("line {}: {}", lineno, err);
                        stats.invalid += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> (RuleIndex, ElementHiding, LoadStats) {
        let mut index = RuleIndex::new();
        let mut hiding = ElementHiding::new();
        let stats = FilterListLoader::new(&mut index, &mut hiding).load_str(text);
        (index, hiding, stats)
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(classify_line(""), LineKind::Comment);
        assert_eq!(classify_line("! Title: EasyList"), LineKind::Comment);
        assert_eq!(classify_line("@@||example.com^"), LineKind::Whitelist);
        assert_eq!(classify_line("[Adblock Plus 2.0]"), LineKind::Section);
        assert_eq!(classify_line("ads.js$domain=example.com"), LineKind::DomainScoped);
        assert_eq!(classify_line(" ads"), LineKind::Blank);
        assert_eq!(classify_line("##.ad"), LineKind::ElementHider(".ad"));
        assert_eq!(classify_line("#.ad"), LineKind::ElementHider(".ad"));
        assert_eq!(classify_line("example.com#@#.ad"), LineKind::HiderException);
        assert_eq!(
            classify_line("example.com##.ad"),
            LineKind::DomainHider { line: "example.com##.ad", separator: "##" }
        );
        assert_eq!(
            classify_line("example.com#.ad"),
            LineKind::DomainHider { line: "example.com#.ad", separator: "#" }
        );
        assert_eq!(
            classify_line("||ads.example.com^"),
            LineKind::Rule { body: "ads.example.com^", prefix: "", rule_type: RuleType::FullUri }
        );
        assert_eq!(
            classify_line("|http://ads."),
            LineKind::Rule { body: "http://ads.", prefix: "^", rule_type: RuleType::FullUri }
        );
        assert_eq!(
            classify_line("/banner/"),
            LineKind::Rule { body: "/banner/", prefix: "", rule_type: RuleType::Uri }
        );
    }

    #[test]
    fn unsupported_rules_add_nothing() {
        let (index, _, stats) = load("@@ads.example.com\nads.js$domain=example.com\nframe.html$subdocument\n");
        assert_eq!(index.signature_count(), 0);
        assert_eq!(index.full_pattern_count(), 0);
        assert_eq!(stats.whitelist, 1);
        assert_eq!(stats.domain_scoped, 1);
        assert_eq!(stats.subdocument, 1);
    }

    #[test]
    fn bad_lines_do_not_abort_load() {
        let (index, _, stats) = load("adserver(\n||ads.example.com^\n");
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.rules, 1);
        assert!(index.has_signature("ads.exam"));
    }

    #[test]
    fn strips_trailing_whitespace() {
        let (index, _, _) = load("||ads.example.com^   \r\n");
        assert!(index.has_signature("mple.com"));
    }

    #[test]
    fn skips_long_lines() {
        let long = format!("{}\n||ads.example.com^\n", "a".repeat(DEFAULT_MAX_LINE_LEN + 1));
        let (index, _, stats) = load(&long);
        assert_eq!(stats.too_long, 1);
        assert_eq!(stats.rules, 1);
        assert_eq!(index.pattern_count(), 1);
    }

    #[test]
    fn collects_element_hiding() {
        let (index, hiding, stats) = load("##.ad-banner\nexample.com##.promo\n##div:has(.x)\n");
        assert!(index.is_empty());
        assert_eq!(stats.hider_accepted, 2);
        assert_eq!(stats.hider_rejected, 1);
        assert_eq!(hiding.css_for("example.com"), ".ad-banner , .promo");
    }

    #[test]
    fn custom_line_limit() {
        let mut index = RuleIndex::new();
        let mut hiding = ElementHiding::new();
        let stats = FilterListLoader::new(&mut index, &mut hiding)
            .with_max_line_len(10)
            .load_str("||ads.example.com^\n/ads/\n");
        assert_eq!(stats.too_long, 1);
        assert_eq!(stats.rules, 1);
    }

    #[test]
    fn loading_same_list_twice_changes_nothing() {
        let list = "||ads.example.com^\n/ads/*/banner\n|http://tracker.\n/ad.js\n";
        let mut index = RuleIndex::new();
        let mut hiding = ElementHiding::new();

        FilterListLoader::new(&mut index, &mut hiding).load_str(list);
        let before = index.stats();
        let again = FilterListLoader::new(&mut index, &mut hiding).load_str(list);

        assert_eq!(index.stats(), before);
        assert_eq!(again.rules, 0);
        assert_eq!(again.shadowed, 4);
    }

    #[test]
    fn stats_merge() {
        let (_, _, a) = load("||ads.example.com^\n! c\n");
        let (_, _, b) = load("/ads/\n");
        let mut total = a;
        total.merge(&b);
        assert_eq!(total.lines, 3);
        assert_eq!(total.rules, 2);
        assert_eq!(total.comments, 1);
    }
}
