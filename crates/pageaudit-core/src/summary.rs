//! Report summary aggregation.
//!
//! The summary is a pure function of the settled results: log-level counts,
//! the top WARNING/ERROR findings and the mean of every numeric score.

use crate::domain::{AuditResult, Finding, LogLevel, Scoring, Summary};

/// Number of findings surfaced in a summary.
pub const TOP_FINDINGS_LIMIT: usize = 5;

/// Every score is out of this value.
pub const SCORE_OUT_OF: u32 = 100;

/// Derive the summary for a set of settled results.
pub fn summarize(audits: &[AuditResult]) -> Summary {
    let mut info_count = 0;
    let mut warning_count = 0;
    let mut error_count = 0;
    let mut findings = Vec::new();

    for audit in audits {
        for entry in &audit.logs {
            match entry.level {
                LogLevel::Info => info_count += 1,
                LogLevel::Warning => warning_count += 1,
                LogLevel::Error => error_count += 1,
            }
            if entry.level != LogLevel::Info {
                findings.push(Finding {
                    audit_key: audit.key.clone(),
                    audit_name: audit.name.clone(),
                    level: entry.level,
                    message: entry.message.clone(),
                });
            }
        }
    }

    // Stable sort: ERROR before WARNING, original order kept within a level.
    findings.sort_by_key(|f| f.level != LogLevel::Error);
    findings.truncate(TOP_FINDINGS_LIMIT);

    let overall_score = overall_score(audits);

    Summary {
        total_audits: audits.len(),
        info_count,
        warning_count,
        error_count,
        top_findings: findings,
        overall_score,
        scoring: overall_score.map(|score| Scoring {
            score,
            out_of: SCORE_OUT_OF,
        }),
    }
}

/// Rounded mean of every finite `details.score`, or `None` when there are none.
pub fn overall_score(audits: &[AuditResult]) -> Option<i64> {
    let scores: Vec<f64> = audits.iter().filter_map(AuditResult::score).collect();
    if scores.is_empty() {
        return None;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(mean.round() as i64)
}
