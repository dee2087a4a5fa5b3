//! Per-auditor result record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::log::{AuditLog, AuditStatus, LogEntry};

/// Output of one auditor for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub key: String,
    pub name: String,
    pub status: AuditStatus,
    /// Auditor-specific payload. A finite numeric `score` is picked up by the summary.
    #[serde(default = "empty_details")]
    pub details: Value,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

fn empty_details() -> Value {
    Value::Object(Map::new())
}

impl AuditResult {
    /// Build a result whose status is derived from `logs`.
    pub fn from_logs(
        key: impl Into<String>,
        name: impl Into<String>,
        details: Value,
        logs: Vec<LogEntry>,
    ) -> Self {
        let status = AuditStatus::from_logs(&logs);
        Self {
            key: key.into(),
            name: name.into(),
            status,
            details,
            logs,
        }
    }

    /// Build a result from an [`AuditLog`] collector.
    pub fn from_log(
        key: impl Into<String>,
        name: impl Into<String>,
        details: Value,
        log: AuditLog,
    ) -> Self {
        Self::from_logs(key, name, details, log.into_entries())
    }

    /// Synthetic result standing in for an auditor that errored.
    pub fn failed(key: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_logs(key, name, empty_details(), vec![LogEntry::error(message)])
    }

    /// The `details.score` value, when present and finite.
    pub fn score(&self) -> Option<f64> {
        self.details
            .get("score")
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite())
    }
}
