use std::time::Instant;

use ut_core::{DecisionCache, MatchStats, Matcher, ResourceType};

use crate::lists::CompiledLists;

pub struct BenchOptions {
    pub iterations: usize,
    pub urls: Vec<String>,
}

/// Request mix used when no URL file is given.
const SAMPLE_REQUESTS: &[(&str, ResourceType)] = &[
    ("http://ads.example.com/banner.js", ResourceType::Script),
    ("https://cdn.example.org/app.js", ResourceType::Script),
    ("https://static.example.net/img/logo.png", ResourceType::Image),
    ("http://tracker.example.net/pixel.gif?id=42", ResourceType::Image),
    ("https://news.example.org/style.css", ResourceType::Stylesheet),
    ("https://api.example.com/v1/items?page=3", ResourceType::Xhr),
];

#[derive(Debug, Clone, Copy)]
pub struct BenchResult {
    pub queries: u64,
    pub blocked: u64,
    pub cold_ns_per_op: f64,
    pub cached_ns_per_op: f64,
    pub stats: MatchStats,
}

pub fn run(compiled: &CompiledLists, options: &BenchOptions) -> BenchResult {
    let requests: Vec<(&str, ResourceType)> = if options.urls.is_empty() {
        SAMPLE_REQUESTS.to_vec()
    } else {
        options.urls.iter().map(|u| (u.as_str(), ResourceType::Other)).collect()
    };
    let iterations = options.iterations.max(1);

    let mut stats = MatchStats::default();
    let mut blocked = 0u64;

    // Fresh cache per pass.
    let start = Instant::now();
    for _ in 0..iterations {
        let mut cache = DecisionCache::new();
        let mut matcher = Matcher::new(&compiled.index, &mut cache, &mut stats);
        for (url, ty) in &requests {
            if matcher.should_block(url, Some("https://page.example.com/"), *ty) {
                blocked += 1;
            }
        }
    }
    let cold = start.elapsed();

    let mut cache = DecisionCache::new();
    let start = Instant::now();
    for _ in 0..iterations {
        let mut matcher = Matcher::new(&compiled.index, &mut cache, &mut stats);
        for (url, ty) in &requests {
            std::hint::black_box(matcher.should_block(url, Some("https://page.example.com/"), *ty));
        }
    }
    let cached = start.elapsed();

    let ops = (iterations * requests.len()).max(1) as f64;
    BenchResult {
        queries: (iterations * requests.len()) as u64,
        blocked,
        cold_ns_per_op: cold.as_nanos() as f64 / ops,
        cached_ns_per_op: cached.as_nanos() as f64 / ops,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ut_compiler::{ElementHiding, FilterListLoader, LoadStats};
    use ut_core::RuleIndex;

    #[test]
    fn counts_blocked_requests() {
        let mut index = RuleIndex::new();
        let mut hiding = ElementHiding::new();
        FilterListLoader::new(&mut index, &mut hiding).load_str("||ads.example.com^\n");
        let compiled = CompiledLists {
            index,
            hiding,
            stats: LoadStats::default(),
            total_ms: 0.0,
        };

        let result = run(&compiled, &BenchOptions { iterations: 3, urls: Vec::new() });
        assert_eq!(result.queries, 3 * SAMPLE_REQUESTS.len() as u64);
        assert_eq!(result.blocked, 3);
        assert_eq!(result.stats.queries, 2 * result.queries);
    }
}
