use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

use crate::deep::AuditResponse;
use crate::domain::{AuditStatus, LogLevel, Report};

/// Write a report (and analysis, if any) as pretty JSON.
pub fn write_response_json(path: &Path, response: &AuditResponse) -> Result<()> {
    let content = serde_json::to_string_pretty(response).context("serialize audit response")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write a bare report as pretty JSON.
pub fn write_report_json(path: &Path, report: &Report) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

fn status_badge(status: AuditStatus) -> &'static str {
    match status {
        AuditStatus::Pass => "✅ PASS",
        AuditStatus::Warn => "⚠️ WARN",
        AuditStatus::Fail => "❌ FAIL",
    }
}

/// Render a human-readable markdown report.
pub fn render_report_markdown(report: &Report) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    let _ = writeln!(out, "# Audit Report: {}\n", report.url);
    let _ = writeln!(
        out,
        "- Started: {}\n- Duration: {} ms\n- Overall: {}",
        report.started_at.to_rfc3339(),
        report.duration_ms(),
        status_badge(report.overall_status()),
    );
    match &summary.scoring {
        Some(scoring) => {
            let _ = writeln!(out, "- Score: {}/{}", scoring.score, scoring.out_of);
        }
        None => out.push_str("- Score: n/a\n"),
    }
    let _ = writeln!(
        out,
        "- Logs: {} info, {} warnings, {} errors",
        summary.info_count, summary.warning_count, summary.error_count
    );

    out.push_str("\n## Audits\n\n");
    if report.audits.is_empty() {
        out.push_str("No audits were requested.\n");
    } else {
        out.push_str("| Audit | Status | Score |\n");
        out.push_str("|-------|--------|-------|\n");
        for audit in &report.audits {
            let score = audit
                .score()
                .map(|s| format!("{}", s.round() as i64))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "| {} (`{}`) | {} | {} |",
                audit.name,
                audit.key,
                status_badge(audit.status),
                score
            );
        }
    }

    out.push_str("\n## Top Findings\n\n");
    if summary.top_findings.is_empty() {
        out.push_str("No findings.\n");
    } else {
        for finding in &summary.top_findings {
            let marker = match finding.level {
                LogLevel::Error => "**ERROR**",
                _ => "WARNING",
            };
            let _ = writeln!(
                out,
                "- {} [{}] {}",
                marker, finding.audit_key, finding.message
            );
        }
    }

    out
}
