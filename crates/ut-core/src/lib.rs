//! URI Tester Core Library
//!
//! This crate provides the rule index and matching engine for the URI
//! tester content blocker.
//!
//! # Architecture
//!
//! Filter patterns are compiled to regexes and indexed by short fixed-length
//! signatures. A request is first checked against the signatures found in
//! its own URL; only when none of them confirms a block is the (small) set
//! of signature-less patterns scanned. Decisions are memoized per URL.
//!
//! # Modules
//!
//! - `fixup`: glob-to-regex translation and signature windows
//! - `index`: compiled rule store
//! - `cache`: per-URL decision memo
//! - `matcher`: request matching
//! - `types`: shared type definitions

pub mod cache;
pub mod fixup;
pub mod index;
pub mod matcher;
pub mod types;

// Re-export commonly used types
pub use cache::DecisionCache;
pub use fixup::{fixup_regexp, signature_windows, SIGNATURE_SIZE};
pub use index::{IndexStats, RuleIndex};
pub use matcher::{MatchStats, Matcher};
pub use types::{FilterPattern, PatternFlags, PatternId, ResourceType};
