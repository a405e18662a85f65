//! Rule cache.
//!
//! Holds the current [`RuleStore`] generation. Reads are lock-free through
//! `ArcSwapOption`; building a new generation (file read, download, parse)
//! happens under a single mutex so concurrent callers trigger at most one
//! rebuild and all wait for it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwapOption;
use log::{info, warn};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use crate::config::CacheConfig;
use crate::error::{DomainError, Result, SourceErrorKind};
use crate::rules::{parse_rules_from_bytes, RuleStore};
use crate::source::loader::into_stale;
use crate::source::{HttpFetcher, NilFetcher, RuleFetcher, RuleSource};

static GLOBAL: Lazy<RuleCache> = Lazy::new(RuleCache::default);

/// One published rule snapshot
#[derive(Debug)]
pub struct CacheGeneration {
    id: u64,
    store: Arc<RuleStore>,
    expires_at: Option<SystemTime>,
}

impl CacheGeneration {
    /// Monotonic generation id, starting at 1
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Whether this generation must be rebuilt before being handed out
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|t| now > t)
    }
}

/// Holder of the current suffix rule snapshot.
///
/// ```no_run
/// use std::sync::Arc;
/// use domain_parser_r::{CacheConfig, DomainParser, RuleCache};
///
/// let cache = Arc::new(RuleCache::new(
///     CacheConfig::new().with_file_location("/var/cache/publicsuffix.txt"),
/// ));
/// let parser = DomainParser::new(cache);
/// let parts = parser.parse("photos.verybritish.co.uk").unwrap();
/// assert_eq!(parts.tld, "co.uk");
/// ```
pub struct RuleCache {
    source: RwLock<RuleSource>,
    fetcher: Arc<dyn RuleFetcher>,
    // In-memory rules that replace the source entirely
    seed: Option<Arc<RuleStore>>,
    current: ArcSwapOption<CacheGeneration>,
    rebuild_lock: Mutex<()>,
    last_generation: AtomicU64,
    rebuilds: AtomicU64,
    last_refresh_error: Mutex<Option<(SourceErrorKind, String)>>,
}

impl RuleCache {
    /// Create a cache that downloads over HTTP
    pub fn new(config: CacheConfig) -> Self {
        Self::with_fetcher(config, Arc::new(HttpFetcher::new()))
    }

    /// Create a cache with a custom fetcher
    pub fn with_fetcher(config: CacheConfig, fetcher: Arc<dyn RuleFetcher>) -> Self {
        Self {
            source: RwLock::new(RuleSource::new(config, fetcher.clone())),
            fetcher,
            seed: None,
            current: ArcSwapOption::empty(),
            rebuild_lock: Mutex::new(()),
            last_generation: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
            last_refresh_error: Mutex::new(None),
        }
    }

    /// Create a cache serving a fixed in-memory store that never expires
    pub fn from_store(store: RuleStore) -> Self {
        let mut cache = Self::with_fetcher(
            CacheConfig::new().without_file_cache().with_expire_days(0),
            Arc::new(NilFetcher),
        );
        cache.seed = Some(Arc::new(store));
        cache
    }

    /// Process-wide cache with the default configuration
    pub fn global() -> &'static RuleCache {
        &GLOBAL
    }

    /// Current configuration
    pub fn config(&self) -> CacheConfig {
        self.source.read().config().clone()
    }

    /// Replace the configuration; the next access rebuilds with it
    pub fn set_config(&self, config: CacheConfig) -> Result<()> {
        config.validate()?;
        let _lock = self.rebuild_lock.lock();
        *self.source.write() = RuleSource::new(config, self.fetcher.clone());
        self.current.store(None);
        Ok(())
    }

    /// Return a valid, non-expired store, rebuilding it if needed
    pub fn current_store(&self) -> Result<Arc<RuleStore>> {
        self.current_generation().map(|generation| generation.store.clone())
    }

    /// Return the current non-expired generation, rebuilding it if needed.
    ///
    /// If a refresh of an expired generation fails, its rules are
    /// republished as a new generation with a full lifetime, and the failure
    /// is available through [`RuleCache::last_refresh_error`].
    pub fn current_generation(&self) -> Result<Arc<CacheGeneration>> {
        if let Some(generation) = self.fresh_generation() {
            return Ok(generation);
        }

        let _lock = self.rebuild_lock.lock();

        // Double-check after acquiring lock
        if let Some(generation) = self.fresh_generation() {
            return Ok(generation);
        }

        let stale = self.current.load_full();
        match self.rebuild_locked() {
            Ok(generation) => Ok(generation),
            Err(e) => match stale {
                Some(generation) => {
                    let e = into_stale(e);
                    warn!(
                        "Rule generation {} expired and refresh failed, keeping its rules: {}",
                        generation.id, e
                    );
                    self.record_refresh_error(&e);
                    // Republish with a new lifetime so waiters and later
                    // callers do not fetch again until it expires.
                    let expire_interval = self.source.read().config().expire_interval();
                    Ok(self.publish_locked(generation.store.clone(), expire_interval))
                }
                None => Err(e),
            },
        }
    }

    /// Force a rebuild now.
    ///
    /// On failure the previous generation (if any) stays published and the
    /// error is returned as `StaleButUnrefreshable`.
    pub fn refresh(&self) -> Result<Arc<RuleStore>> {
        let _lock = self.rebuild_lock.lock();
        let had_generation = self.current.load().is_some();
        match self.rebuild_locked() {
            Ok(generation) => Ok(generation.store.clone()),
            Err(e) if had_generation => {
                let e = into_stale(e);
                self.record_refresh_error(&e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Discard the active generation; the next access forces a rebuild
    pub fn reset(&self) {
        let _lock = self.rebuild_lock.lock();
        self.current.store(None);
    }

    /// Id of the published generation, if any
    pub fn generation(&self) -> Option<u64> {
        self.current.load_full().map(|g| g.id)
    }

    /// Expiration time of the published generation
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.current.load_full().and_then(|g| g.expires_at)
    }

    /// Number of rebuild attempts, successful or not
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::SeqCst)
    }

    /// Most recent refresh failure that was answered with stale rules.
    /// Cleared by the next successful rebuild.
    pub fn last_refresh_error(&self) -> Option<DomainError> {
        self.last_refresh_error
            .lock()
            .as_ref()
            .map(|(kind, message)| DomainError::StaleButUnrefreshable {
                kind: *kind,
                message: message.clone(),
            })
    }

    fn fresh_generation(&self) -> Option<Arc<CacheGeneration>> {
        self.current
            .load_full()
            .filter(|generation| !generation.is_expired(SystemTime::now()))
    }

    fn record_refresh_error(&self, err: &DomainError) {
        let kind = err.source_kind().unwrap_or(SourceErrorKind::DownloadFailed);
        let message = match err {
            DomainError::StaleButUnrefreshable { message, .. } => message.clone(),
            other => other.to_string(),
        };
        *self.last_refresh_error.lock() = Some((kind, message));
    }

    /// Build and publish a new generation. Caller holds `rebuild_lock`.
    fn rebuild_locked(&self) -> Result<Arc<CacheGeneration>> {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);

        let (store, expire_interval) = match self.seed {
            Some(ref seed) => (seed.clone(), None),
            None => {
                let source = self.source.read();
                let resolved = source.resolve()?;
                let store = parse_rules_from_bytes(&resolved.bytes)?;
                match resolved.refresh_error {
                    Some(ref e) => self.record_refresh_error(e),
                    None => *self.last_refresh_error.lock() = None,
                }
                (Arc::new(store), source.config().expire_interval())
            }
        };

        Ok(self.publish_locked(store, expire_interval))
    }

    /// Publish `store` as a new generation. Caller holds `rebuild_lock`.
    fn publish_locked(
        &self,
        store: Arc<RuleStore>,
        expire_interval: Option<Duration>,
    ) -> Arc<CacheGeneration> {
        let generation = Arc::new(CacheGeneration {
            id: self.last_generation.fetch_add(1, Ordering::SeqCst) + 1,
            store,
            expires_at: expire_interval.map(|interval| SystemTime::now() + interval),
        });

        info!(
            "Published rule generation {} with {} rules",
            generation.id,
            generation.store.len()
        );

        self.current.store(Some(generation.clone()));
        generation
    }
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
