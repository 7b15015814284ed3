use log::debug;

use ut_core::fixup::{fixup_regexp, signature_windows};
use ut_core::index::RuleIndex;
use ut_core::types::{FilterPattern, PatternId};

use crate::error::CompileError;

/// Type tag of a rule: unanchored (`"uri"`) or anchored (`"fulluri"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    Uri,
    FullUri,
}

impl RuleType {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Uri => "uri",
            Self::FullUri => "fulluri",
        }
    }
}

/// Where a compiled rule ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Indexed {
        id: PatternId,
        signatures: usize,
        full_pattern: bool,
    },
    /// Every slot the rule could occupy was already taken.
    Shadowed,
}

/// Compile one URL rule (anchor already consumed) into `index`.
///
/// `prefix` is `"^"` for `|`-anchored rules and empty otherwise.
pub fn compile_rule(
    index: &mut RuleIndex,
    line: &str,
    prefix: &str,
    rule_type: RuleType,
) -> Result<CompileOutcome, CompileError> {
    if rule_type == RuleType::Uri {
        if let Some((body, options)) = split_regex_literal(line) {
            let options = join_options(rule_type, options);
            check_options(&options)?;
            return compile_regex_literal(index, line, body, options);
        }
    }

    let (pattern, options) = split_options(line, rule_type);
    if pattern.is_empty() {
        return Err(CompileError::EmptyPattern);
    }
    check_options(&options)?;

    let fixed = fixup_regexp(prefix, &pattern);
    if fixed.len() == prefix.len() {
        return Err(CompileError::EmptyPattern);
    }

    let compiled = compile_pattern(&fixed, options)?;

    if is_regex_syntax(&fixed) {
        return Ok(insert(index, compiled, &[], Some(&fixed)));
    }

    let mut signatures: Vec<&str> = Vec::new();
    let mut usable = 0usize;
    let mut full_pattern = false;
    for window in signature_windows(&fixed) {
        if !window.contains('*') {
            usable += 1;
            if !index.has_signature(window) && !signatures.contains(&window) {
                signatures.push(window);
            }
        } else if window.starts_with('*') && !index.has_full_pattern(&fixed) {
            full_pattern = true;
        }
    }

    // Several signatures cover the rule; the pattern map entry is redundant.
    if signatures.len() > 1 {
        full_pattern = false;
    }
    // Too short or all wildcards: the pattern map is the only way to reach it.
    // Usable windows that are all taken leave the rule shadowed.
    if usable == 0 && !index.has_full_pattern(&fixed) {
        full_pattern = true;
    }

    let full_key = if full_pattern { Some(fixed.as_str()) } else { None };
    Ok(insert(index, compiled, &signatures, full_key))
}

fn insert(
    index: &mut RuleIndex,
    pattern: FilterPattern,
    signatures: &[&str],
    full_key: Option<&str>,
) -> CompileOutcome {
    match index.insert(pattern, signatures, full_key) {
        Some(id) => CompileOutcome::Indexed {
            id,
            signatures: signatures.len(),
            full_pattern: full_key.is_some(),
        },
        None => CompileOutcome::Shadowed,
    }
}

fn compile_regex_literal(
    index: &mut RuleIndex,
    key: &str,
    body: &str,
    options: String,
) -> Result<CompileOutcome, CompileError> {
    if body.is_empty() {
        return Err(CompileError::EmptyPattern);
    }
    let compiled = compile_pattern(body, options)?;
    debug!("regex rule '{}'", body);
    Ok(insert(index, compiled, &[], Some(key)))
}

fn compile_pattern(pattern: &str, options: String) -> Result<FilterPattern, CompileError> {
    FilterPattern::compile(pattern, Some(options)).map_err(|source| CompileError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn check_options(options: &str) -> Result<(), CompileError> {
    if options.to_ascii_lowercase().contains("subdocument") {
        return Err(CompileError::Subdocument);
    }
    Ok(())
}

/// Split `pattern$options`. With three or more `$` segments the second one
/// still belongs to the pattern.
pub fn split_options(line: &str, rule_type: RuleType) -> (String, String) {
    let parts: Vec<&str> = line.split('$').collect();
    match parts.as_slice() {
        [pattern] => (pattern.to_string(), rule_type.tag().to_string()),
        [pattern, options] => (pattern.to_string(), join_options(rule_type, Some(options))),
        [first, second, rest @ ..] => {
            let options = rest.join(",");
            (format!("{first}{second}"), join_options(rule_type, Some(&options)))
        }
        [] => (String::new(), rule_type.tag().to_string()),
    }
}

fn join_options(rule_type: RuleType, options: Option<&str>) -> String {
    match options {
        Some(options) if !options.is_empty() => format!("{},{}", rule_type.tag(), options),
        _ => rule_type.tag().to_string(),
    }
}

/// `/body/` or `/body/$options`, where the body looks like a regex.
fn split_regex_literal(line: &str) -> Option<(&str, Option<&str>)> {
    if !line.starts_with('/') || line.len() < 3 {
        return None;
    }

    let (literal, options) = if line.ends_with('/') {
        (line, None)
    } else {
        let pos = line.rfind("/$")?;
        (&line[..=pos], Some(&line[pos + 2..]))
    };

    if literal.len() < 3 {
        return None;
    }
    let body = &literal[1..literal.len() - 1];
    if !body.contains(|c| matches!(c, '\\' | '(' | ')' | '[' | ']' | '{' | '}' | '$' | '^' | '+' | '?' | '|')) {
        return None;
    }
    Some((body, options))
}

/// A fixed-up pattern of the form `/.*[^$*].*/` is a regex on its own.
fn is_regex_syntax(fixed: &str) -> bool {
    if fixed.len() < 3 || !fixed.starts_with('/') || !fixed.ends_with('/') {
        return false;
    }
    fixed[1..fixed.len() - 1].contains(['^', '$', '*'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(index: &mut RuleIndex, line: &str) -> Result<CompileOutcome, CompileError> {
        compile_rule(index, line, "", RuleType::Uri)
    }

    #[test]
    fn splits_options() {
        assert_eq!(
            split_options("ads.js$script,third-party", RuleType::Uri),
            ("ads.js".to_string(), "uri,script,third-party".to_string())
        );
        assert_eq!(
            split_options("ads.js", RuleType::FullUri),
            ("ads.js".to_string(), "fulluri".to_string())
        );
        assert_eq!(
            split_options("a$b$image", RuleType::Uri),
            ("ab".to_string(), "uri,image".to_string())
        );
    }

    #[test]
    fn indexes_long_pattern_by_signatures() {
        let mut index = RuleIndex::new();
        let outcome = compile(&mut index, "adserver.example").unwrap();
        match outcome {
            CompileOutcome::Indexed { signatures, full_pattern, .. } => {
                assert_eq!(signatures, 9);
                assert!(!full_pattern);
            }
            CompileOutcome::Shadowed => panic!("rule should be indexed"),
        }
        assert!(index.has_signature("adserver"));
        assert!(index.has_signature(".example"));
        assert_eq!(index.full_pattern_count(), 0);
    }

    #[test]
    fn short_pattern_goes_to_pattern_map() {
        let mut index = RuleIndex::new();
        compile(&mut index, "/ads/").unwrap();
        assert_eq!(index.signature_count(), 0);
        assert!(index.has_full_pattern("/ads/"));
    }

    #[test]
    fn wildcard_only_pattern_goes_to_pattern_map() {
        let mut index = RuleIndex::new();
        compile(&mut index, "a*b*c*d*e").unwrap();
        assert_eq!(index.signature_count(), 0);
        assert!(index.has_full_pattern("a.*b.*c.*d.*e"));
    }

    #[test]
    fn single_signature_keeps_pattern_entry() {
        // "ad.*banners1" has one '*'-free window, and one starting with '*'.
        let mut index = RuleIndex::new();
        compile(&mut index, "ad*banners1").unwrap();
        assert!(index.has_signature("banners1"));
        assert_eq!(index.signature_count(), 1);
        assert!(index.has_full_pattern("ad.*banners1"));
    }

    #[test]
    fn many_signatures_drop_pattern_entry() {
        let mut index = RuleIndex::new();
        compile(&mut index, "ad*bannerserver").unwrap();
        assert!(index.signature_count() > 1);
        assert!(!index.has_full_pattern("ad.*bannerserver"));
    }

    #[test]
    fn first_rule_keeps_shared_signature() {
        let mut index = RuleIndex::new();
        let first = compile(&mut index, "adserver").unwrap();
        let second = compile(&mut index, "adserver").unwrap();
        assert!(matches!(first, CompileOutcome::Indexed { .. }));
        assert_eq!(second, CompileOutcome::Shadowed);
        assert_eq!(index.pattern_count(), 1);
        assert_eq!(index.full_pattern_count(), 0);
    }

    #[test]
    fn overlapping_rule_is_shadowed_not_moved_to_pattern_map() {
        let mut index = RuleIndex::new();
        compile(&mut index, "adserver.example").unwrap();
        // Every window of the second rule is already owned by the first.
        let second = compile(&mut index, "server.example").unwrap();
        assert_eq!(second, CompileOutcome::Shadowed);
        assert_eq!(index.full_pattern_count(), 0);
    }

    #[test]
    fn recompiling_wildcard_rule_adds_nothing() {
        let mut index = RuleIndex::new();
        compile(&mut index, "ad*banners1").unwrap();
        let before = index.stats();
        assert_eq!(compile(&mut index, "ad*banners1").unwrap(), CompileOutcome::Shadowed);
        assert_eq!(index.stats(), before);
    }

    #[test]
    fn short_rule_stays_reachable_once() {
        let mut index = RuleIndex::new();
        let first = compile(&mut index, "/ad.js").unwrap();
        assert!(matches!(first, CompileOutcome::Indexed { full_pattern: true, .. }));
        assert_eq!(compile(&mut index, "/ad.js").unwrap(), CompileOutcome::Shadowed);
        assert_eq!(index.full_pattern_count(), 1);
    }

    #[test]
    fn regex_syntax_after_fixup_goes_to_pattern_map() {
        let mut index = RuleIndex::new();
        compile(&mut index, "/ads/*/banner/").unwrap();
        assert!(index.has_full_pattern("/ads/.*/banner/"));
        assert_eq!(index.signature_count(), 0);
    }

    #[test]
    fn regex_literal_is_compiled_verbatim() {
        let mut index = RuleIndex::new();
        compile(&mut index, "/banner\\d+\\.gif/").unwrap();
        assert!(index.has_full_pattern("/banner\\d+\\.gif/"));
        let (_, id) = index.full_patterns().next().unwrap();
        let pattern = index.pattern(id).unwrap();
        assert!(pattern.regex().is_match("http://x.com/banner42.gif"));
        assert!(!pattern.regex().is_match("http://x.com/bannerXX.gif"));
    }

    #[test]
    fn regex_literal_with_options() {
        let mut index = RuleIndex::new();
        compile(&mut index, "/ad[0-9]+\\.js/$script,third-party").unwrap();
        let (_, id) = index.full_patterns().next().unwrap();
        let pattern = index.pattern(id).unwrap();
        assert_eq!(pattern.options(), Some("uri,script,third-party"));
        assert!(pattern.is_third_party());
    }

    #[test]
    fn subdocument_rules_are_rejected() {
        let mut index = RuleIndex::new();
        let err = compile(&mut index, "frame.html$SubDocument").unwrap_err();
        assert!(matches!(err, CompileError::Subdocument));
        assert!(index.is_empty());
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let mut index = RuleIndex::new();
        let err = compile(&mut index, "adserver(tracking").unwrap_err();
        assert!(matches!(err, CompileError::InvalidRegex { .. }));
        assert!(index.is_empty());
    }

    #[test]
    fn anchor_only_rule_is_empty() {
        let mut index = RuleIndex::new();
        let err = compile_rule(&mut index, "^", "^", RuleType::FullUri).unwrap_err();
        assert!(matches!(err, CompileError::EmptyPattern));
        let err = compile(&mut index, "$script").unwrap_err();
        assert!(matches!(err, CompileError::EmptyPattern));
    }

    #[test]
    fn left_anchor_prefixes_pattern() {
        let mut index = RuleIndex::new();
        compile_rule(&mut index, "http://ads.", "^", RuleType::FullUri).unwrap();
        let id = index.signature("ttp://ad").unwrap();
        let pattern = index.pattern(id).unwrap();
        assert_eq!(pattern.raw_pattern(), "^http://ads.");
        assert_eq!(pattern.options(), Some("fulluri"));
    }
}
