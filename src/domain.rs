//! Domain parser.
//!
//! Finds the longest suffix rule matching a domain and splits the domain
//! into sub domain, SLD and TLD around it.

use std::num::NonZeroUsize;
use std::sync::Arc;

use log::debug;
use lru::LruCache;
use parking_lot::Mutex;

use crate::cache::RuleCache;
use crate::error::{DomainError, Result};
use crate::rules::RuleStore;
use crate::types::{DomainParts, RuleKind, RuleRecord};

/// Default LRU cache size for parse results
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// The primary rule for a domain and the suffix it matched
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    pub rule: &'a RuleRecord,
    /// Number of trailing labels of the input covered by the rule name
    pub labels: usize,
    /// Character length of the matched suffix
    pub suffix_len: usize,
}

impl RuleMatch<'_> {
    /// Ordering key: longest suffix first, then Exception > Wildcard > Normal
    fn rank(&self) -> (usize, u8) {
        (self.suffix_len, self.rule.kind.precedence())
    }
}

/// Find the primary rule for `domain`, or `None` if no suffix matches.
pub fn find_matching_rule<'a>(store: &'a RuleStore, domain: &str) -> Option<RuleMatch<'a>> {
    let mut best: Option<RuleMatch<'a>> = None;
    let mut candidate = String::with_capacity(domain.len());

    for (i, label) in domain.rsplit('.').enumerate() {
        let label = label.to_lowercase();
        candidate = if i == 0 {
            label
        } else {
            format!("{}.{}", label, candidate)
        };

        for kind in RuleKind::ALL {
            let Some(rule) = store.get(kind, &candidate) else {
                continue;
            };
            let found = RuleMatch {
                rule,
                labels: i + 1,
                suffix_len: candidate.chars().count(),
            };
            debug!("Suffix {} matched {} rule {}", candidate, kind, rule);
            if best.map_or(true, |b| found.rank() > b.rank()) {
                best = Some(found);
            }
        }
    }

    best
}

/// Split `input` using the rules in `store`.
pub fn parse_with_store(store: &RuleStore, input: &str) -> Result<DomainParts> {
    let domain = input.trim();
    if domain.is_empty() {
        return Err(DomainError::InvalidArgument(
            "The domain cannot be blank".to_string(),
        ));
    }

    let matched = find_matching_rule(store, domain).ok_or_else(|| {
        debug!("No rules matched domain: {}", domain);
        DomainError::NoMatchingRule(domain.to_string())
    })?;
    debug!(
        "Primary match for {}: {} ({})",
        domain, matched.rule, matched.rule.kind
    );

    Ok(split_domain(domain, &matched))
}

/// Cut `domain` into parts; slices keep the input's letter case.
fn split_domain(domain: &str, matched: &RuleMatch<'_>) -> DomainParts {
    let labels: Vec<&str> = domain.split('.').collect();

    let tld_labels = match matched.rule.kind {
        RuleKind::Normal => matched.labels,
        // The wildcard covers one more label left of the rule name
        RuleKind::Wildcard => matched.labels + 1,
        // Only the last label, whatever the exception name spans
        RuleKind::Exception => 1,
    }
    .min(labels.len());

    let cut = labels.len() - tld_labels;
    let tld = labels[cut..].join(".");

    let (sub_domain, sld) = match labels[..cut].split_last() {
        Some((sld, rest)) => (rest.join("."), sld.to_string()),
        None => (String::new(), String::new()),
    };

    DomainParts {
        sub_domain,
        sld,
        tld,
        matched_rule: matched.rule.clone(),
    }
}

/// Parse with the process-wide [`RuleCache::global`].
pub fn parse_domain(input: &str) -> Result<DomainParts> {
    let store = RuleCache::global().current_store()?;
    parse_with_store(&store, input)
}

/// Like [`parse_domain`], but returns `None` on any failure.
pub fn try_parse_domain(input: &str) -> Option<DomainParts> {
    parse_domain(input).ok()
}

/// Parser options
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// LRU cache size for parse results; 0 disables memoization
    pub cache_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}

struct Memo {
    generation: u64,
    entries: LruCache<String, DomainParts>,
}

/// Parses domains against the current generation of a [`RuleCache`].
pub struct DomainParser {
    cache: Arc<RuleCache>,
    memo: Option<Mutex<Memo>>,
}

impl DomainParser {
    /// Create a parser with default options
    pub fn new(cache: Arc<RuleCache>) -> Self {
        Self::with_options(cache, ParserOptions::default())
    }

    /// Create a parser with explicit options
    pub fn with_options(cache: Arc<RuleCache>, options: ParserOptions) -> Self {
        let memo = NonZeroUsize::new(options.cache_size).map(|size| {
            Mutex::new(Memo {
                generation: 0,
                entries: LruCache::new(size),
            })
        });
        Self { cache, memo }
    }

    pub fn cache(&self) -> &Arc<RuleCache> {
        &self.cache
    }

    /// Split `input` into sub domain, SLD and TLD.
    ///
    /// Fails with `InvalidArgument` for blank input and `NoMatchingRule`
    /// when no rule matches; rule loading failures are passed through.
    pub fn parse(&self, input: &str) -> Result<DomainParts> {
        let generation = self.cache.current_generation()?;

        let Some(ref memo) = self.memo else {
            return parse_with_store(generation.store(), input);
        };

        {
            let mut memo = memo.lock();
            if memo.generation < generation.id() {
                memo.entries.clear();
                memo.generation = generation.id();
            }
            if memo.generation == generation.id() {
                if let Some(parts) = memo.entries.get(input) {
                    return Ok(parts.clone());
                }
            }
        }

        let parts = parse_with_store(generation.store(), input)?;

        // Another thread may have moved the memo to a newer generation.
        let mut memo = memo.lock();
        if memo.generation == generation.id() {
            memo.entries.put(input.to_string(), parts.clone());
        }
        Ok(parts)
    }

    /// Like [`DomainParser::parse`], but returns `None` on any failure.
    pub fn try_parse(&self, input: &str) -> Option<DomainParts> {
        self.parse(input).ok()
    }
}
