//! Domain Parser - split domain names using the Public Suffix List
//!
//! This library classifies a domain name into:
//! - Sub domain (`photos`)
//! - Second-level domain, the registrable label (`verybritish`)
//! - Public suffix / TLD (`co.uk`)
//!
//! Rules come from the [Public Suffix List](https://publicsuffix.org/),
//! cached in a local file and refreshed after a configurable number of days.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use domain_parser_r::{parse_rules, DomainParser, RuleCache};
//!
//! let rules = parse_rules("
//! // ===BEGIN ICANN DOMAINS===
//! com
//! *.uk
//! !parliament.uk
//! ");
//!
//! let cache = Arc::new(RuleCache::from_store(rules));
//! let parser = DomainParser::new(cache);
//!
//! let parts = parser.parse("photos.verybritish.co.uk").unwrap();
//! assert_eq!(parts.sub_domain, "photos");
//! assert_eq!(parts.sld, "verybritish");
//! assert_eq!(parts.tld, "co.uk");
//!
//! let parts = parser.parse("photos.wishlist.parliament.uk").unwrap();
//! assert_eq!(parts.sld, "parliament");
//! assert_eq!(parts.tld, "uk");
//! ```
//!
//! # Rule Syntax
//!
//! | Line | Kind | Meaning |
//! |------|------|---------|
//! | `com` | Normal | `com` is a public suffix |
//! | `*.uk` | Wildcard | any label under `uk` is a public suffix |
//! | `!parliament.uk` | Exception | `parliament.uk` is registrable despite `*.uk` |
//! | `// ...` | Comment | ignored, as are blank lines |

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod rules;
pub mod source;
pub mod types;

// Re-export commonly used items
pub use cache::{CacheGeneration, RuleCache};
pub use config::{CacheConfig, DEFAULT_EXPIRE_DAYS, DEFAULT_RULES_FILE, DEFAULT_RULES_URL};
pub use domain::{
    find_matching_rule, parse_domain, parse_with_store, try_parse_domain, DomainParser,
    ParserOptions, RuleMatch, DEFAULT_CACHE_SIZE,
};
pub use error::{DomainError, Result, SourceErrorKind};
pub use rules::{parse_rules, parse_rules_from_bytes, parse_rules_from_file, RuleStore};
pub use source::{HttpFetcher, MemoryFetcher, NilFetcher, RuleFetcher, RuleOrigin, RuleSource};
pub use types::{DomainParts, RuleKind, RuleRecord};
