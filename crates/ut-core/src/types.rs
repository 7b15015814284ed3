//! Core type definitions for the URI tester
//!
//! These types are shared by the compiler (which produces patterns) and
//! the matcher (which evaluates them per request).

use regex::Regex;

// =============================================================================
// Resource Types
// =============================================================================

/// Kind of resource a page wants to load, as reported by the request hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceType {
    #[default]
    Other,
    Script,
    Image,
    Stylesheet,
    Object,
    /// Top-level navigation. Never blocked.
    Document,
    /// iframe/frame
    Subdocument,
    Refresh,
    Xbl,
    Ping,
    Xhr,
    ObjectSubrequest,
}

impl ResourceType {
    /// Parse from a browser request type name. Unknown names map to `Other`.
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "script" => Self::Script,
            "image" | "img" => Self::Image,
            "stylesheet" | "css" => Self::Stylesheet,
            "object" => Self::Object,
            "document" | "main_frame" => Self::Document,
            "subdocument" | "sub_frame" => Self::Subdocument,
            "refresh" => Self::Refresh,
            "xbl" => Self::Xbl,
            "ping" => Self::Ping,
            "xmlhttprequest" | "xhr" => Self::Xhr,
            "object_subrequest" | "object-subrequest" => Self::ObjectSubrequest,
            _ => Self::Other,
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Script => "script",
            Self::Image => "image",
            Self::Stylesheet => "stylesheet",
            Self::Object => "object",
            Self::Document => "document",
            Self::Subdocument => "subdocument",
            Self::Refresh => "refresh",
            Self::Xbl => "xbl",
            Self::Ping => "ping",
            Self::Xhr => "xmlhttprequest",
            Self::ObjectSubrequest => "object_subrequest",
        }
    }
}

// =============================================================================
// Pattern Flags
// =============================================================================

bitflags::bitflags! {
    /// Flags derived from a rule's options string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PatternFlags: u8 {
        /// Rule was anchored (`||` or `|`) and tagged "fulluri"
        const FULL_URI = 1 << 0;
        /// `$third-party`
        const THIRD_PARTY = 1 << 1;
    }
}

impl PatternFlags {
    /// Derive flags from a comma-joined options string such as
    /// `"uri,script,third-party"`.
    pub fn from_options(options: &str) -> Self {
        let mut flags = Self::empty();
        for token in options.split(',') {
            let token = token.trim();
            if token.eq_ignore_ascii_case("fulluri") {
                flags |= Self::FULL_URI;
            } else if token.eq_ignore_ascii_case("third-party") {
                flags |= Self::THIRD_PARTY;
            }
        }
        flags
    }
}

// =============================================================================
// Filter Pattern
// =============================================================================

/// Index of a pattern inside a [`crate::RuleIndex`].
pub type PatternId = usize;

/// A compiled filter rule. Immutable once inserted into an index.
#[derive(Debug, Clone)]
pub struct FilterPattern {
    regex: Regex,
    raw_pattern: String,
    options: Option<String>,
    flags: PatternFlags,
}

impl FilterPattern {
    /// Create a pattern from an already compiled regex.
    pub fn new(regex: Regex, raw_pattern: impl Into<String>, options: Option<String>) -> Self {
        let flags = options
            .as_deref()
            .map(PatternFlags::from_options)
            .unwrap_or_else(PatternFlags::empty);
        Self {
            regex,
            raw_pattern: raw_pattern.into(),
            options,
            flags,
        }
    }

    /// Compile `raw_pattern` as a regex. Fails only on invalid regex syntax.
    pub fn compile(raw_pattern: &str, options: Option<String>) -> Result<Self, regex::Error> {
        let regex = Regex::new(raw_pattern)?;
        Ok(Self::new(regex, raw_pattern, options))
    }

    #[inline]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The fixed-up pattern string the regex was built from.
    #[inline]
    pub fn raw_pattern(&self) -> &str {
        &self.raw_pattern
    }

    #[inline]
    pub fn options(&self) -> Option<&str> {
        self.options.as_deref()
    }

    #[inline]
    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    #[inline]
    pub fn is_third_party(&self) -> bool {
        self.flags.contains(PatternFlags::THIRD_PARTY)
    }
}
