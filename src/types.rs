use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Public Suffix List rule type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Exact suffix: "com"
    Normal,
    /// Any single label plus this suffix: "*.uk"
    Wildcard,
    /// Carves a suffix out of a wildcard: "!parliament.uk"
    Exception,
}

impl RuleKind {
    /// All rule kinds, in lookup order
    pub const ALL: [RuleKind; 3] = [RuleKind::Normal, RuleKind::Wildcard, RuleKind::Exception];

    /// Tie-break rank when two rules match a suffix of the same length.
    /// Higher wins.
    pub fn precedence(&self) -> u8 {
        match self {
            RuleKind::Normal => 0,
            RuleKind::Wildcard => 1,
            RuleKind::Exception => 2,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Normal => write!(f, "normal"),
            RuleKind::Wildcard => write!(f, "wildcard"),
            RuleKind::Exception => write!(f, "exception"),
        }
    }
}

/// One parsed entry of the suffix list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Suffix name with the wildcard/exception marker stripped
    pub name: String,
    /// Rule type
    pub kind: RuleKind,
}

impl RuleRecord {
    /// Create a rule from an already-stripped name
    pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into().trim().to_string(),
            kind,
        }
    }

    /// Classify a single list line.
    ///
    /// Returns `None` for blank lines and `//` comments, and for lines that
    /// are nothing but a marker.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return None;
        }

        let (name, kind) = if let Some(rest) = line.strip_prefix("*.") {
            (rest, RuleKind::Wildcard)
        } else if let Some(rest) = line.strip_prefix('!') {
            (rest, RuleKind::Exception)
        } else {
            (line, RuleKind::Normal)
        };

        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, kind))
    }

    /// Lookup key for this rule
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl PartialOrd for RuleRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RuleRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.precedence().cmp(&other.kind.precedence()))
    }
}

impl fmt::Display for RuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RuleKind::Normal => write!(f, "{}", self.name),
            RuleKind::Wildcard => write!(f, "*.{}", self.name),
            RuleKind::Exception => write!(f, "!{}", self.name),
        }
    }
}

/// A domain split into its registrable components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainParts {
    /// Everything left of the SLD (may be empty)
    pub sub_domain: String,
    /// Second-level domain: the label immediately left of the TLD
    pub sld: String,
    /// Public suffix (may span several labels)
    pub tld: String,
    /// Rule that decided the suffix boundary
    pub matched_rule: RuleRecord,
}

impl DomainParts {
    /// Kind of the matched rule
    pub fn rule_kind(&self) -> RuleKind {
        self.matched_rule.kind
    }

    /// `sld.tld`, or `None` when the input had no label left of the suffix
    pub fn registrable_domain(&self) -> Option<String> {
        if self.sld.is_empty() {
            None
        } else {
            Some(format!("{}.{}", self.sld, self.tld))
        }
    }
}

impl fmt::Display for DomainParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in [&self.sub_domain, &self.sld, &self.tld] {
            if part.is_empty() {
                continue;
            }
            if !first {
                f.write_str(".")?;
            }
            f.write_str(part)?;
            first = false;
        }
        Ok(())
    }
}
