//! Glob fixup and signature windows
//!
//! Filter-list patterns are turned into regex fragments by a small
//! transliteration. Request URLs go through the same routine before they
//! are windowed, so that their windows line up with pattern signatures.

/// Length of a signature window, in bytes.
pub const SIGNATURE_SIZE: usize = 8;

/// Translate a filter-list glob into a regex fragment, prefixed by `prefix`.
///
/// - a leading `*` is dropped
/// - `*` becomes `.*`, `?` becomes `\?`
/// - `|`, `^` and `+` are dropped
/// - everything else is copied as is, regex metacharacters included
/// - one trailing `.*` is trimmed
///
/// FIXME: `^` should match a separator or a port (`:[0-9]+`); as written,
/// `bla.com^` also matches `bla.com.au/`.
pub fn fixup_regexp(prefix: &str, src: &str) -> String {
    let src = src.strip_prefix('*').unwrap_or(src);

    let mut out = String::with_capacity(prefix.len() + src.len() + 8);
    out.push_str(prefix);

    for ch in src.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push_str("\\?"),
            '|' | '^' | '+' => {}
            _ => out.push(ch),
        }
    }

    if out.ends_with(".*") {
        out.truncate(out.len() - 2);
    }

    out
}

/// Iterate the `SIGNATURE_SIZE`-byte windows of `s`, from the end towards
/// the start. Windows that would split a UTF-8 character are skipped.
pub fn signature_windows(s: &str) -> impl Iterator<Item = &str> {
    let last = s.len().checked_sub(SIGNATURE_SIZE);
    last.into_iter()
        .flat_map(|last| (0..=last).rev())
        .filter_map(move |pos| s.get(pos..pos + SIGNATURE_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_wildcards() {
        assert_eq!(fixup_regexp("", "ads*banner"), "ads.*banner");
        assert_eq!(fixup_regexp("", "*ads*banner*"), "ads.*banner");
        assert_eq!(fixup_regexp("", "page?id="), "page\\?id=");
    }

    #[test]
    fn drops_anchor_tokens() {
        assert_eq!(fixup_regexp("", "ads.example.com^"), "ads.example.com");
        assert_eq!(fixup_regexp("", "ads|"), "ads");
        assert_eq!(fixup_regexp("", "a+b"), "ab");
    }

    #[test]
    fn applies_prefix() {
        assert_eq!(fixup_regexp("^", "http://ads."), "^http://ads.");
    }

    #[test]
    fn keeps_regex_metacharacters() {
        assert_eq!(fixup_regexp("", "/ad[0-9].gif"), "/ad[0-9].gif");
    }

    #[test]
    fn trims_only_one_trailing_wildcard() {
        assert_eq!(fixup_regexp("", "ads**"), "ads.*");
    }

    #[test]
    fn fixup_is_idempotent_on_literals() {
        for url in [
            "http://example.com/banner.js",
            "https://cdn.example.org/path/to/file.css",
            "/static/ads/",
        ] {
            let once = fixup_regexp("", url);
            assert_eq!(fixup_regexp("", &once), once);
        }
    }

    #[test]
    fn windows_run_from_end_to_start() {
        let windows: Vec<&str> = signature_windows("0123456789").collect();
        assert_eq!(windows, vec!["23456789", "12345678", "01234567"]);
    }

    #[test]
    fn windows_empty_for_short_input() {
        assert_eq!(signature_windows("short").count(), 0);
        assert_eq!(signature_windows("12345678").count(), 1);
    }

    #[test]
    fn windows_skip_split_characters() {
        // "é" is two bytes; windows cutting through it are skipped.
        let windows: Vec<&str> = signature_windows("abcdefgé").collect();
        assert_eq!(windows, vec!["bcdefgé"]);
    }
}
