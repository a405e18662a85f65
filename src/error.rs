use thiserror::Error;

/// Classifies rule source errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Neither a cache file nor a remote URL is usable
    NotConfigured,
    /// Cache file open/read/write failure
    FileError,
    /// Rule data could not be decoded (not UTF-8)
    InvalidData,
    /// HTTP request failed or returned an error status
    DownloadFailed,
}

/// Domain parser error types
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No matching rule for domain: {0}")]
    NoMatchingRule(String),

    #[error("Rule source unavailable: {message}")]
    RuleSourceUnavailable {
        kind: SourceErrorKind,
        message: String,
    },

    #[error("Rule list is stale and could not be refreshed: {message}")]
    StaleButUnrefreshable {
        kind: SourceErrorKind,
        message: String,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DomainError {
    pub(crate) fn source_unavailable(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        DomainError::RuleSourceUnavailable {
            kind,
            message: message.into(),
        }
    }

    /// Kind of the underlying source failure, if this is a source error.
    pub fn source_kind(&self) -> Option<SourceErrorKind> {
        match self {
            DomainError::RuleSourceUnavailable { kind, .. }
            | DomainError::StaleButUnrefreshable { kind, .. } => Some(*kind),
            DomainError::IoError(_) => Some(SourceErrorKind::FileError),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_kind_is_matchable() {
        let err = DomainError::source_unavailable(SourceErrorKind::DownloadFailed, "HTTP 503");
        match &err {
            DomainError::RuleSourceUnavailable { kind, .. } => {
                assert!(matches!(kind, SourceErrorKind::DownloadFailed));
            }
            _ => panic!("expected RuleSourceUnavailable"),
        }
        assert_eq!(err.source_kind(), Some(SourceErrorKind::DownloadFailed));
    }

    #[test]
    fn test_stale_error_display_includes_message() {
        let err = DomainError::StaleButUnrefreshable {
            kind: SourceErrorKind::DownloadFailed,
            message: "connection refused".into(),
        };
        let display = format!("{}", err);
        assert!(display.contains("connection refused"), "got: {}", display);
    }

    #[test]
    fn test_io_error_maps_to_file_kind() {
        let err: DomainError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.source_kind(), Some(SourceErrorKind::FileError));
    }

    #[test]
    fn test_parse_errors_have_no_source_kind() {
        assert!(DomainError::InvalidArgument("blank".into())
            .source_kind()
            .is_none());
        assert!(DomainError::NoMatchingRule("x.invalid".into())
            .source_kind()
            .is_none());
    }
}
