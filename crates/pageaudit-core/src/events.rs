//! Audit lifecycle events emitted by the runner.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{AuditResult, AuditStatus};

/// One lifecycle transition of a single auditor within a run.
///
/// Every requested auditor produces exactly one `AuditStarted` followed by
/// exactly one of `AuditCompleted` / `AuditFailed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AuditEvent {
    AuditStarted {
        audit_key: String,
        audit_name: String,
    },
    /// Settled with a `PASS` or `WARN` result.
    AuditCompleted {
        audit_key: String,
        audit_name: String,
        result: AuditResult,
    },
    /// Settled with a `FAIL` result, whether reported by the auditor or synthesised from an error.
    AuditFailed {
        audit_key: String,
        audit_name: String,
        result: AuditResult,
    },
}

impl AuditEvent {
    pub(crate) fn started(key: &str, name: &str) -> Self {
        AuditEvent::AuditStarted {
            audit_key: key.to_string(),
            audit_name: name.to_string(),
        }
    }

    pub(crate) fn settled(result: &AuditResult) -> Self {
        let audit_key = result.key.clone();
        let audit_name = result.name.clone();
        let result = result.clone();
        if result.status == AuditStatus::Fail {
            AuditEvent::AuditFailed {
                audit_key,
                audit_name,
                result,
            }
        } else {
            AuditEvent::AuditCompleted {
                audit_key,
                audit_name,
                result,
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::AuditStarted { .. } => "audit_started",
            AuditEvent::AuditCompleted { .. } => "audit_completed",
            AuditEvent::AuditFailed { .. } => "audit_failed",
        }
    }

    pub fn audit_key(&self) -> &str {
        match self {
            AuditEvent::AuditStarted { audit_key, .. }
            | AuditEvent::AuditCompleted { audit_key, .. }
            | AuditEvent::AuditFailed { audit_key, .. } => audit_key,
        }
    }

    pub fn audit_name(&self) -> &str {
        match self {
            AuditEvent::AuditStarted { audit_name, .. }
            | AuditEvent::AuditCompleted { audit_name, .. }
            | AuditEvent::AuditFailed { audit_name, .. } => audit_name,
        }
    }

    /// The settled result, for completion events.
    pub fn result(&self) -> Option<&AuditResult> {
        match self {
            AuditEvent::AuditStarted { .. } => None,
            AuditEvent::AuditCompleted { result, .. } | AuditEvent::AuditFailed { result, .. } => {
                Some(result)
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuditEvent::AuditStarted { .. })
    }
}

/// Synchronous, side-effect-only observer of [`AuditEvent`]s.
///
/// Invoked from concurrently settling auditors; must not block.
pub type AuditEventSink = Arc<dyn Fn(&AuditEvent) + Send + Sync>;
