//! Report produced by one multi-auditor run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::log::{AuditStatus, LogLevel};
use crate::domain::result::AuditResult;

/// A WARNING or ERROR log entry surfaced at report level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub audit_key: String,
    pub audit_name: String,
    pub level: LogLevel,
    pub message: String,
}

/// Combined score, always out of 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoring {
    pub score: i64,
    pub out_of: u32,
}

/// Cross-auditor aggregate derived from the settled results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_audits: usize,
    pub info_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
    pub top_findings: Vec<Finding>,
    pub overall_score: Option<i64>,
    pub scoring: Option<Scoring>,
}

/// Full output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per requested key, in request order.
    pub audits: Vec<AuditResult>,
    pub summary: Summary,
}

impl Report {
    pub fn audit(&self, key: &str) -> Option<&AuditResult> {
        self.audits.iter().find(|a| a.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.audits.iter().map(|a| a.key.as_str()).collect()
    }

    pub fn count_with_status(&self, status: AuditStatus) -> usize {
        self.audits.iter().filter(|a| a.status == status).count()
    }

    /// Worst status across all audits; `PASS` for an empty report.
    pub fn overall_status(&self) -> AuditStatus {
        if self.count_with_status(AuditStatus::Fail) > 0 {
            AuditStatus::Fail
        } else if self.count_with_status(AuditStatus::Warn) > 0 {
            AuditStatus::Warn
        } else {
            AuditStatus::Pass
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}
