//! Error taxonomy for audit runs.

/// Errors that reject a whole audit run.
///
/// Per-auditor failures never surface here; the runner folds them into a
/// synthetic `FAIL` result instead.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown audit type: {0}")]
    UnknownAuditType(String),

    #[error("auditor '{0}' is already registered")]
    DuplicateAuditor(String),

    #[error("deep analysis failed: {0}")]
    DeepAnalysis(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    /// Whether the error was caused by caller input rather than server configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuditError::InvalidUrl { .. })
    }

    /// Whether the error stems from registry or request configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AuditError::UnknownAuditType(_) | AuditError::DuplicateAuditor(_)
        )
    }
}

/// Result type for audit engine operations.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_audit_type_message() {
        let err = AuditError::UnknownAuditType("lighthouse".to_string());
        assert_eq!(err.to_string(), "Unknown audit type: lighthouse");
        assert!(err.is_configuration_error());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_invalid_url_is_client_error() {
        let err = AuditError::InvalidUrl {
            url: "ftp://example.com".to_string(),
            reason: "unsupported scheme 'ftp'".to_string(),
        };
        assert!(err.is_client_error());
        assert!(!err.is_configuration_error());
        assert!(err.to_string().contains("ftp://example.com"));
    }

    #[test]
    fn test_duplicate_auditor_message() {
        let err = AuditError::DuplicateAuditor("seo".to_string());
        assert!(err.to_string().contains("already registered"));
        assert!(err.to_string().contains("seo"));
    }
}
