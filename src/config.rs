use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Default remote location of the suffix list
pub const DEFAULT_RULES_URL: &str = "https://publicsuffix.org/list/effective_tld_names.dat";

/// Default cache file name, relative to the working directory
pub const DEFAULT_RULES_FILE: &str = "publicsuffix.txt";

/// Default expiration period: 1 day
pub const DEFAULT_EXPIRE_DAYS: u32 = 1;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Rule cache configuration.
///
/// ```
/// use domain_parser_r::CacheConfig;
///
/// let config = CacheConfig::new()
///     .with_file_location("/var/cache/psl/publicsuffix.txt")
///     .with_expire_days(7);
/// assert_eq!(config.expire_days, 7);
///
/// let network_only = CacheConfig::new().without_file_cache();
/// assert!(network_only.file_location.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Local cache file; `None` disables file caching (network only)
    pub file_location: Option<PathBuf>,
    /// Days before the rules are reloaded; 0 never expires
    pub expire_days: u32,
    /// Remote suffix list URL
    pub remote_url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file_location: Some(PathBuf::from(DEFAULT_RULES_FILE)),
            expire_days: DEFAULT_EXPIRE_DAYS,
            remote_url: DEFAULT_RULES_URL.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache file location
    pub fn with_file_location(mut self, path: impl AsRef<Path>) -> Self {
        self.file_location = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disable the cache file; rules are fetched from the network on every rebuild
    pub fn without_file_cache(mut self) -> Self {
        self.file_location = None;
        self
    }

    /// Set expiration period in days (0 disables expiration)
    pub fn with_expire_days(mut self, days: u32) -> Self {
        self.expire_days = days;
        self
    }

    /// Set a custom remote URL
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = url.into();
        self
    }

    /// Expiration period, or `None` when expiration is disabled
    pub fn expire_interval(&self) -> Option<Duration> {
        if self.expire_days == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.expire_days) * SECS_PER_DAY))
        }
    }

    /// Check that the config can produce rules at all
    pub fn validate(&self) -> Result<()> {
        if self.remote_url.trim().is_empty() {
            return Err(DomainError::ConfigError(
                "remote_url must not be empty".to_string(),
            ));
        }
        if let Some(ref path) = self.file_location {
            if path.as_os_str().is_empty() {
                return Err(DomainError::ConfigError(
                    "file_location must not be empty (use null to disable)".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Load a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            DomainError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }
}
