use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use log::debug;
use parking_lot::RwLock;

use crate::error::{DomainError, Result, SourceErrorKind};

/// Trait for retrieving the raw suffix list from a remote location
pub trait RuleFetcher: Send + Sync {
    /// Fetch the list body from `url`
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP fetcher backed by `ureq`
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl RuleFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);

        let response = ureq::get(url).call().map_err(|e| {
            DomainError::source_unavailable(
                SourceErrorKind::DownloadFailed,
                format!("Download failed: {}", e),
            )
        })?;

        let (_, body) = response.into_parts();
        let mut reader = body.into_reader();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|e| {
            DomainError::source_unavailable(
                SourceErrorKind::DownloadFailed,
                format!("Failed to read response body: {}", e),
            )
        })?;

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

/// Fetcher for caches that never go to the network; every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NilFetcher;

impl RuleFetcher for NilFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(DomainError::source_unavailable(
            SourceErrorKind::NotConfigured,
            format!("No fetcher configured (requested: {})", url),
        ))
    }
}

/// In-memory fetcher for testing and offline use.
///
/// Counts every call, and can be switched into a failing mode to simulate
/// an unreachable endpoint.
pub struct MemoryFetcher {
    body: RwLock<String>,
    failing: AtomicBool,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MemoryFetcher {
    /// Create a fetcher that always returns `body`
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: RwLock::new(body.into()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep for `delay` inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the body returned by later fetches
    pub fn set_body(&self, body: impl Into<String>) {
        *self.body.write() = body.into();
    }

    /// Make later fetches fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of fetch calls so far, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RuleFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::source_unavailable(
                SourceErrorKind::DownloadFailed,
                format!("Download failed: {} unreachable", url),
            ));
        }
        Ok(self.body.read().as_bytes().to_vec())
    }
}
