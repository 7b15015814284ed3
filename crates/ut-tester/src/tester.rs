//! The URI tester facade.
//!
//! Owns the rule index, the decision cache and the subscription list, and
//! drives loading of every subscribed filter list:
//!
//! ```text
//! LoadingSubscriptions -> Compiling -> Ready
//!                            ^          |
//!                            +- Reloading
//! ```
//!
//! Sources compile independently; queries are answered at any point with
//! whatever rules have been compiled so far.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info, warn};

use ut_compiler::{ElementHiding, FilterListLoader, LoadStats};
use ut_core::{DecisionCache, IndexStats, MatchStats, Matcher, ResourceType, RuleIndex};

use crate::config::{UriTesterConfig, FILTERS_LIST_FILE};
use crate::error::UriTesterError;
use crate::provider::{FetchCompletion, FetchRequest, FileProvider};
use crate::subscriptions::{
    is_fresh, read_filters, remove_cache_files, source_location, write_filters, SourceLocation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TesterState {
    LoadingSubscriptions,
    /// At least one fetch is still outstanding
    Compiling,
    Ready,
    Reloading,
}

pub struct UriTester<P> {
    config: UriTesterConfig,
    adblock_dir: PathBuf,
    provider: P,
    filters: Vec<String>,
    index: RuleIndex,
    cache: DecisionCache,
    hiding: ElementHiding,
    match_stats: MatchStats,
    load_stats: LoadStats,
    generation: u64,
    pending: HashSet<String>,
    state: TesterState,
}

impl<P: FileProvider> UriTester<P> {
    /// Create the cache directory, read the subscription list and start
    /// loading every source.
    pub fn new(config: UriTesterConfig, provider: P) -> Result<Self, UriTesterError> {
        let adblock_dir = config.adblock_dir();
        create_private_dir(&adblock_dir).map_err(|e| UriTesterError::io(&adblock_dir, e))?;

        let mut tester = Self {
            config,
            adblock_dir,
            provider,
            filters: Vec::new(),
            index: RuleIndex::new(),
            cache: DecisionCache::new(),
            hiding: ElementHiding::new(),
            match_stats: MatchStats::default(),
            load_stats: LoadStats::default(),
            generation: 0,
            pending: HashSet::new(),
            state: TesterState::LoadingSubscriptions,
        };

        tester.filters = tester.read_subscriptions();
        tester.load_subscriptions();
        Ok(tester)
    }

    /// True if the load should be blocked. Never touches the disk.
    pub fn test_uri(
        &mut self,
        request_url: &str,
        page_url: Option<&str>,
        resource_type: ResourceType,
    ) -> bool {
        let page_url = page_url.filter(|page| !page.is_empty());
        Matcher::new(&self.index, &mut self.cache, &mut self.match_stats)
            .should_block(request_url, page_url, resource_type)
    }

    /// True if the load may proceed.
    pub fn should_load(
        &mut self,
        request_url: &str,
        page_url: Option<&str>,
        resource_type: ResourceType,
    ) -> bool {
        !self.test_uri(request_url, page_url, resource_type)
    }

    /// Replace the subscriptions and persist them. Rules are not
    /// recompiled until [`UriTester::reload`] is called.
    pub fn set_filters(&mut self, filters: Vec<String>) -> Result<(), UriTesterError> {
        self.filters = filters;
        let path = self.filters_list_path();
        write_filters(&path, &self.filters).map_err(|e| UriTesterError::io(&path, e))
    }

    pub fn get_filters(&self) -> &[String] {
        &self.filters
    }

    /// Drop every cached filter list and compiled rule, then load all
    /// subscriptions again.
    pub fn reload(&mut self) {
        self.set_state(TesterState::Reloading);
        remove_cache_files(&self.adblock_dir);

        self.index.clear();
        self.cache.clear();
        self.hiding.clear();
        self.load_stats = LoadStats::default();
        self.pending.clear();
        self.generation += 1;

        info!("reloading {} filter list(s), generation {}", self.filters.len(), self.generation);
        self.load_subscriptions();
    }

    /// Handle the end of a fetch started by this tester.
    ///
    /// Completions from an earlier generation, or for a source that is no
    /// longer subscribed, are ignored.
    pub fn complete_fetch(&mut self, completion: &FetchCompletion) {
        let request = &completion.request;
        if request.generation != self.generation {
            debug!(
                "ignoring fetch of {} from generation {} (now {})",
                request.source_url, request.generation, self.generation
            );
            return;
        }

        self.pending.remove(&request.source_url);
        if self.pending.is_empty() {
            self.set_state(TesterState::Ready);
        }

        if !self.filters.contains(&request.source_url) {
            debug!("ignoring fetch of unsubscribed {}", request.source_url);
            return;
        }
        if !completion.success {
            warn!("fetching {} failed, no new rules from it", request.source_url);
            return;
        }

        self.load_path(&request.source_url, &request.destination);
    }

    pub fn state(&self) -> TesterState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_fetches(&self) -> usize {
        self.pending.len()
    }

    pub fn index_stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn match_stats(&self) -> MatchStats {
        self.match_stats
    }

    /// Totals over every load of the current generation.
    pub fn load_stats(&self) -> LoadStats {
        self.load_stats
    }

    pub fn cached_decisions(&self) -> usize {
        self.cache.len()
    }

    pub fn element_hiding(&self) -> &ElementHiding {
        &self.hiding
    }

    pub fn config(&self) -> &UriTesterConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    fn filters_list_path(&self) -> PathBuf {
        self.adblock_dir.join(FILTERS_LIST_FILE)
    }

    fn read_subscriptions(&self) -> Vec<String> {
        let path = self.filters_list_path();
        match read_filters(&path) {
            Ok(Some(filters)) => filters,
            Ok(None) => self.config.default_filters.clone(),
            Err(e) => {
                warn!("cannot read {}: {}, using default filters", path.display(), e);
                self.config.default_filters.clone()
            }
        }
    }

    fn load_subscriptions(&mut self) {
        self.set_state(TesterState::Compiling);

        let now = SystemTime::now();
        for url in self.filters.clone() {
            self.load_source(&url, now);
        }

        if self.pending.is_empty() {
            self.set_state(TesterState::Ready);
        }
    }

    /// Compile whatever local copy exists, and ask for a refetch if it is
    /// stale or missing.
    fn load_source(&mut self, url: &str, now: SystemTime) {
        let path = match source_location(&self.adblock_dir, url) {
            SourceLocation::Local(path) => {
                self.load_path(url, &path);
                return;
            }
            SourceLocation::Cached(path) => path,
        };

        let fresh = is_fresh(&path, self.config.freshness(), now);
        if path.exists() {
            self.load_path(url, &path);
        }
        if fresh {
            return;
        }

        debug!("{} is stale, fetching into {}", url, path.display());
        self.pending.insert(url.to_string());
        self.provider.fetch(FetchRequest {
            source_url: url.to_string(),
            destination: path,
            generation: self.generation,
        });
    }

    fn load_path(&mut self, url: &str, path: &Path) {
        let result = FilterListLoader::new(&mut self.index, &mut self.hiding)
            .with_max_line_len(self.config.max_line_len)
            .load_file(path);

        match result {
            Ok(stats) => {
                info!(
                    "compiled {}: {} rules ({} invalid, {} skipped lines)",
                    url,
                    stats.rules,
                    stats.invalid,
                    stats.lines.saturating_sub(stats.rules + stats.invalid)
                );
                self.load_stats.merge(&stats);
            }
            Err(e) => warn!("cannot read {} for {}: {}", path.display(), url, e),
        }
    }

    /// Remove everything in the adblock directory except the subscription list.
    fn set_state(&mut self, state: TesterState) {
        if self.state != state {
            debug!("state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}
