//! Subscription list file and per-source cache files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::warn;
use url::Url;

use crate::config::FILTERS_LIST_FILE;

/// Parse a `url;url;` list. Segments are trimmed, empty ones dropped.
pub fn parse_filters(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serialize subscriptions, each followed by `;`.
pub fn serialize_filters(filters: &[String]) -> String {
    filters.iter().map(|url| format!("{url};")).collect()
}

/// Read the subscription list; `None` if the file does not exist.
pub fn read_filters(path: &Path) -> io::Result<Option<Vec<String>>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(parse_filters(&text))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn write_filters(path: &Path, filters: &[String]) -> io::Result<()> {
    fs::write(path, serialize_filters(filters))
}

/// Where the text of a subscription lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// `file:` source, read in place and never fetched
    Local(PathBuf),
    /// Remote source, cached under the adblock directory
    Cached(PathBuf),
}

impl SourceLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Local(path) | Self::Cached(path) => path,
        }
    }
}

pub fn source_location(adblock_dir: &Path, url: &str) -> SourceLocation {
    if url.starts_with("file:") {
        let path = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.to_file_path().ok())
            .unwrap_or_else(|| PathBuf::from(url.trim_start_matches("file://")));
        return SourceLocation::Local(path);
    }
    SourceLocation::Cached(adblock_dir.join(cache_file_name(url)))
}

/// MD5 hex digest of the source URL.
pub fn cache_file_name(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// A cache file is fresh if it was modified less than `freshness` ago.
/// Missing or unreadable files are stale.
pub fn is_fresh(path: &Path, freshness: Duration, now: SystemTime) -> bool {
    let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    match now.duration_since(modified) {
        Ok(age) => age < freshness,
        // mtime in the future
        Err(_) => true,
    }
}

/// Delete every cached filter list in `adblock_dir`, keeping the
/// subscription list. Failures are logged and skipped.
pub fn remove_cache_files(adblock_dir: &Path) {
    let entries = match fs::read_dir(adblock_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot list {}: {}", adblock_dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_name() == FILTERS_LIST_FILE || !path.is_file() {
            continue;
        }
        if let Err(e) = fs::remove_file(&path) {
            warn!("cannot remove {}: {}", path.display(), e);
        }
    }
}
