//! Raw audit requests and the validated input handed to auditors.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{AuditError, Result};

/// An unvalidated audit request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub url: String,
    /// Requested auditor keys, in report order. `None` selects every registered auditor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    /// Per-auditor timeout; `Some(0)` disables it, `None` leaves the choice to the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Auditor-specific fields passed through untouched (e.g. `apiKey`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuditRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Validated per-run argument passed to every auditor.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditInput {
    pub url: Url,
    pub timeout_ms: u64,
    pub extra: Map<String, Value>,
}

impl AuditInput {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout_ms: 0,
            extra: Map::new(),
        }
    }

    /// Timeout as a `Duration`, or `None` when disabled.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }

    /// A string field from `extra`, if present.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Parse and normalise an absolute http/https URL.
///
/// Surrounding whitespace and any fragment are dropped.
pub fn normalize_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| AuditError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty".to_string()));
    }

    let mut url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}
