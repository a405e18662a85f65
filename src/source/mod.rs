pub mod fetch;
pub mod loader;

pub use fetch::{HttpFetcher, MemoryFetcher, NilFetcher, RuleFetcher};
pub use loader::{ResolvedRules, RuleOrigin, RuleSource};
