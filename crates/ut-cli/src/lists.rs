use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use ut_compiler::{ElementHiding, FilterListLoader, LoadStats};
use ut_core::RuleIndex;

/// Rules compiled from local filter-list files.
pub struct CompiledLists {
    pub index: RuleIndex,
    pub hiding: ElementHiding,
    pub stats: LoadStats,
    pub total_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct CompileReport {
    pub lists: usize,
    pub lines: usize,
    pub rules: usize,
    pub shadowed: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub too_long: usize,
    pub signatures: usize,
    pub full_patterns: usize,
    pub hider_generic: usize,
    pub hider_domains: usize,
    pub total_ms: f64,
}

pub fn compile_lists(inputs: &[String], verbose: bool, max_line_len: usize) -> Result<CompiledLists, String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    let start = Instant::now();
    let mut index = RuleIndex::new();
    let mut hiding = ElementHiding::new();
    let mut stats = LoadStats::default();

    for (list_id, path) in inputs.iter().enumerate() {
        let list_stats = FilterListLoader::new(&mut index, &mut hiding)
            .with_max_line_len(max_line_len)
            .load_file(Path::new(path))
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?;

        if verbose {
            println!(
                "  [{}] {} - {} lines, {} rules",
                list_id,
                Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
                list_stats.lines,
                list_stats.rules
            );
        }

        stats.merge(&list_stats);
    }

    Ok(CompiledLists {
        index,
        hiding,
        stats,
        total_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

impl CompiledLists {
    pub fn report(&self, lists: usize) -> CompileReport {
        let s = &self.stats;
        CompileReport {
            lists,
            lines: s.lines,
            rules: s.rules,
            shadowed: s.shadowed,
            skipped: s.comments + s.whitelist + s.sections + s.domain_scoped + s.subdocument,
            invalid: s.invalid,
            too_long: s.too_long,
            signatures: self.index.signature_count(),
            full_patterns: self.index.full_pattern_count(),
            hider_generic: self.hiding.generic_count(),
            hider_domains: self.hiding.domain_count(),
            total_ms: self.total_ms,
        }
    }
}
