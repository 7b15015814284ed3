//! Filter-list fetching.
//!
//! The tester never waits on the network. It hands a [`FetchRequest`] to a
//! [`FileProvider`]; the host later feeds the matching [`FetchCompletion`]
//! back into [`crate::UriTester::complete_fetch`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::UriTesterError;

/// Default HTTP request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Ask for `source_url` to be stored at `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub source_url: String,
    pub destination: PathBuf,
    /// Reload generation the request belongs to
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCompletion {
    pub request: FetchRequest,
    pub success: bool,
}

/// Retrieves filter lists. On success the destination must be overwritten
/// with the new content.
pub trait FileProvider {
    fn fetch(&mut self, request: FetchRequest);
}

impl<P: FileProvider + ?Sized> FileProvider for Box<P> {
    fn fetch(&mut self, request: FetchRequest) {
        (**self).fetch(request)
    }
}

/// Fetches over HTTP(S) on a tokio runtime and reports completions on a
/// channel.
pub struct HttpFileProvider {
    runtime: Handle,
    client: reqwest::Client,
    completions: UnboundedSender<FetchCompletion>,
}

impl HttpFileProvider {
    pub fn new(runtime: Handle) -> Result<(Self, UnboundedReceiver<FetchCompletion>), UriTesterError> {
        Self::with_timeout(runtime, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        runtime: Handle,
        timeout: Duration,
    ) -> Result<(Self, UnboundedReceiver<FetchCompletion>), UriTesterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UriTesterError::Http(format!("failed to build HTTP client: {e}")))?;
        let (tx, rx) = unbounded_channel();
        Ok((
            Self {
                runtime,
                client,
                completions: tx,
            },
            rx,
        ))
    }
}

impl FileProvider for HttpFileProvider {
    fn fetch(&mut self, request: FetchRequest) {
        let client = self.client.clone();
        let completions = self.completions.clone();

        self.runtime.spawn(async move {
            let tmp_path = temp_path(&request.destination, request.generation);
            let success = match download(&client, &request.source_url, &request.destination, &tmp_path).await {
                Ok(bytes) => {
                    debug!("fetched {} ({} bytes)", request.source_url, bytes);
                    true
                }
                Err(e) => {
                    warn!("failed to fetch {}: {}", request.source_url, e);
                    false
                }
            };
            // The receiver is gone when the host shut down; nothing to report to.
            let _ = completions.send(FetchCompletion { request, success });
        });
    }
}

async fn download(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    tmp_path: &Path,
) -> Result<usize, UriTesterError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| UriTesterError::Http(format!("request failed for {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(UriTesterError::Http(format!("HTTP {status} for {url}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| UriTesterError::Http(format!("failed to read body of {url}: {e}")))?;

    write_atomic(destination, tmp_path, &body)
        .await
        .map_err(|e| UriTesterError::io(destination, e))?;
    Ok(body.len())
}

/// Temp file next to `destination`, distinct for every fetch of this process.
fn temp_path(destination: &Path, generation: u64) -> PathBuf {
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.{}.tmp", std::process::id(), generation, seq));
    destination.with_file_name(name)
}

/// Write to `tmp_path`, then rename it over `path`.
async fn write_atomic(path: &Path, tmp_path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if let Err(e) = tokio::fs::write(tmp_path, content).await {
        let _ = tokio::fs::remove_file(tmp_path).await;
        return Err(e);
    }
    #[cfg(target_os = "windows")]
    {
        let _ = tokio::fs::remove_file(path).await;
    }
    tokio::fs::rename(tmp_path, path).await
}
