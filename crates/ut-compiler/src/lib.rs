//! URI Tester Filter List Compiler
//!
//! This crate turns EasyList-style filter lists into a [`ut_core::RuleIndex`].

pub mod compiler;
pub mod error;
pub mod hider;
pub mod parser;

pub use compiler::{compile_rule, CompileOutcome, RuleType};
pub use error::CompileError;
pub use hider::ElementHiding;
pub use parser::{classify_line, FilterListLoader, LineKind, LoadStats, DEFAULT_MAX_LINE_LEN};

#[cfg(test)]
mod scenarios;
