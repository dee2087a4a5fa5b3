//! Structured observability hooks for audit run lifecycle events.
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`); failures
//! are emitted at `warn!`. For JSON output initialise tracing with
//! [`crate::telemetry::init_tracing`] and `json = true`.

use tracing::{info, warn};

use crate::domain::AuditStatus;

/// Emit event: a report run is about to fan out.
pub fn emit_report_started(url: &str, audit_count: usize) {
    info!(event = "report.started", url = %url, audit_count = audit_count);
}

/// Emit event: one auditor settled (with its own or a synthetic result).
pub fn emit_audit_settled(audit_key: &str, status: AuditStatus, duration_ms: u64) {
    info!(
        event = "audit.settled",
        audit_key = %audit_key,
        status = %status,
        duration_ms = duration_ms,
    );
}

/// Emit event: an auditor returned an error that was absorbed into a FAIL result.
pub fn emit_audit_failed(audit_key: &str, error: &str) {
    warn!(event = "audit.failed", audit_key = %audit_key, error = %error);
}

/// Emit event: every auditor settled and the report was assembled.
pub fn emit_report_finished(
    url: &str,
    duration_ms: u64,
    total_audits: usize,
    overall_score: Option<i64>,
) {
    info!(
        event = "report.finished",
        url = %url,
        duration_ms = duration_ms,
        total_audits = total_audits,
        overall_score = ?overall_score,
    );
}

/// Emit event: a response was served from the response cache.
pub fn emit_cache_hit(cache_key: &str) {
    info!(event = "cache.hit", cache_key = %cache_key);
}

/// Emit event: heartbeat while deep analysis is pending.
pub fn emit_deep_heartbeat(request_id: &str, progress: u8, elapsed_ms: u64) {
    tracing::debug!(
        event = "deep.heartbeat",
        request_id = %request_id,
        progress = progress,
        elapsed_ms = elapsed_ms,
    );
}

/// Emit event: a deep audit request failed at some stage.
pub fn emit_request_failed(request_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "request.failed", request_id = %request_id, error = %error);
}
