use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ut_compiler::DEFAULT_MAX_LINE_LEN;

use crate::error::UriTesterError;

/// Subscription used when no list file exists yet.
pub const DEFAULT_FILTER_URL: &str = "https://easylist-downloads.adblockplus.org/easylist.txt";

/// Subdirectory of the data directory owned by the engine.
pub const ADBLOCK_DIR: &str = "adblock";

/// Subscription list file, kept inside [`ADBLOCK_DIR`].
pub const FILTERS_LIST_FILE: &str = "filters.list";

/// 24 hours.
pub const DEFAULT_FRESHNESS_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UriTesterConfig {
    /// Application data directory; cache files go to `<data_dir>/adblock/`.
    pub data_dir: PathBuf,
    /// How long a cached filter list is used before it is refetched.
    pub freshness_secs: u64,
    /// Subscriptions used when no subscription list file exists.
    pub default_filters: Vec<String>,
    /// Filter-list lines longer than this are skipped.
    pub max_line_len: usize,
}

impl Default for UriTesterConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("uri-tester"))
            .unwrap_or_else(|| PathBuf::from("uri-tester-data"));
        Self {
            data_dir,
            freshness_secs: DEFAULT_FRESHNESS_SECS,
            default_filters: vec![DEFAULT_FILTER_URL.to_string()],
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl UriTesterConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, UriTesterError> {
        let text = fs::read_to_string(path).map_err(|e| UriTesterError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| UriTesterError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn adblock_dir(&self) -> PathBuf {
        self.data_dir.join(ADBLOCK_DIR)
    }

    pub fn filters_list_path(&self) -> PathBuf {
        self.adblock_dir().join(FILTERS_LIST_FILE)
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}
