use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use log::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::{DomainError, Result, SourceErrorKind};

use super::fetch::RuleFetcher;

/// Where a resolved rule list came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOrigin {
    /// Read from the local cache file (possibly just refreshed)
    File(PathBuf),
    /// Fetched from the remote URL without file caching
    Remote,
}

/// Raw rule list bytes plus how they were obtained
#[derive(Debug)]
pub struct ResolvedRules {
    pub bytes: Vec<u8>,
    pub origin: RuleOrigin,
    /// Set when an expired cache file could not be refreshed and the old
    /// content was used instead
    pub refresh_error: Option<DomainError>,
}

/// Resolves the suffix list from the cache file or the remote URL,
/// applying the expiration policy to the cache file.
pub struct RuleSource {
    config: CacheConfig,
    fetcher: Arc<dyn RuleFetcher>,
}

impl RuleSource {
    pub fn new(config: CacheConfig, fetcher: Arc<dyn RuleFetcher>) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Obtain the raw list.
    ///
    /// A failed fetch is fatal when no cache file exists yet. When an
    /// expired cache file cannot be refreshed, its old content is returned
    /// and the failure is reported in [`ResolvedRules::refresh_error`].
    pub fn resolve(&self) -> Result<ResolvedRules> {
        let path = match self.config.file_location {
            Some(ref path) => path,
            None => {
                info!(
                    "Fetching suffix list from {} (file cache disabled)",
                    self.config.remote_url
                );
                let bytes = self.fetcher.fetch(&self.config.remote_url)?;
                return Ok(ResolvedRules {
                    bytes,
                    origin: RuleOrigin::Remote,
                    refresh_error: None,
                });
            }
        };

        debug!("Checking cache file: {}", path.display());

        let mut refresh_error = None;
        if !path.exists() {
            debug!("Cache file does not exist (yet)");
            self.download(path)?;
        } else if self.is_expired(path) {
            debug!("Cache file is older than {} days", self.config.expire_days);
            if let Err(e) = self.download(path) {
                warn!(
                    "Refresh of {} failed, using existing file: {}",
                    path.display(),
                    e
                );
                refresh_error = Some(into_stale(e));
            }
        }

        let bytes = fs::read(path).map_err(|e| {
            DomainError::source_unavailable(
                SourceErrorKind::FileError,
                format!("Failed to read cache file '{}': {}", path.display(), e),
            )
        })?;

        Ok(ResolvedRules {
            bytes,
            origin: RuleOrigin::File(path.clone()),
            refresh_error,
        })
    }

    /// Check whether the cache file's last write is older than the
    /// expiration period
    pub fn is_expired(&self, path: &Path) -> bool {
        let Some(interval) = self.config.expire_interval() else {
            return false;
        };
        match fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(mtime) => SystemTime::now()
                .duration_since(mtime)
                .map(|age| age > interval)
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    /// Fetch the list and replace the cache file.
    ///
    /// The body is written to a sibling temp file first and renamed over
    /// the target, so a failure leaves the previous file intact.
    fn download(&self, path: &Path) -> Result<()> {
        let url = &self.config.remote_url;
        info!("Downloading {} from {}", path.display(), url);

        let bytes = self.fetcher.fetch(url)?;

        if let Err(e) = std::str::from_utf8(&bytes) {
            return Err(DomainError::source_unavailable(
                SourceErrorKind::InvalidData,
                format!("Verification failed, body is not UTF-8: {}", e),
            ));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = temp_path(path);
        if let Err(e) = write_file(&tmp_path, &bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

/// Re-tag a fetch failure as a failed refresh of existing data
pub(crate) fn into_stale(err: DomainError) -> DomainError {
    match err {
        DomainError::RuleSourceUnavailable { kind, message }
        | DomainError::StaleButUnrefreshable { kind, message } => {
            DomainError::StaleButUnrefreshable { kind, message }
        }
        DomainError::IoError(e) => DomainError::StaleButUnrefreshable {
            kind: SourceErrorKind::FileError,
            message: e.to_string(),
        },
        other => DomainError::StaleButUnrefreshable {
            kind: SourceErrorKind::DownloadFailed,
            message: other.to_string(),
        },
    }
}
