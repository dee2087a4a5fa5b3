//! Concurrent audit execution and report assembly.
//!
//! A run validates the URL, resolves every requested key against the
//! registry, then drives all auditors concurrently on the calling task. Each
//! auditor is guarded individually: an error becomes a synthetic `FAIL`
//! result in that auditor's slot, so the report always carries one result per
//! requested key, in request order.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, instrument};

use crate::auditor::Auditor;
use crate::domain::{
    normalize_url, AuditError, AuditInput, AuditRequest, AuditResult, AuditStatus, Report, Result,
};
use crate::events::{AuditEvent, AuditEventSink};
use crate::metrics::METRICS;
use crate::obs;
use crate::registry::AuditRegistry;
use crate::summary::summarize;

/// Optional hooks for a run.
#[derive(Clone, Default)]
pub struct RunOptions {
    pub on_audit_event: Option<AuditEventSink>,
}

impl RunOptions {
    pub fn with_event_sink(sink: AuditEventSink) -> Self {
        Self {
            on_audit_event: Some(sink),
        }
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(sink) = &self.on_audit_event {
            sink(&event);
        }
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("on_audit_event", &self.on_audit_event.is_some())
            .finish()
    }
}

/// Resolve the requested keys to auditors, in request order.
///
/// `None` selects every registered auditor in registry order.
pub fn resolve_auditors(
    registry: &AuditRegistry,
    types: Option<&[String]>,
) -> Result<Vec<Arc<dyn Auditor>>> {
    match types {
        Some(keys) => keys
            .iter()
            .map(|key| {
                registry
                    .get(key)
                    .ok_or_else(|| AuditError::UnknownAuditType(key.clone()))
            })
            .collect(),
        None => Ok(registry
            .keys()
            .filter_map(|key| registry.get(key))
            .collect()),
    }
}

/// Execute the requested audits against one target and assemble a [`Report`].
///
/// Rejects only for an invalid URL or an unknown audit key, both checked
/// before any auditor is launched.
#[instrument(skip_all, fields(url = %request.url))]
pub async fn run_audits(
    registry: &AuditRegistry,
    request: AuditRequest,
    options: &RunOptions,
) -> Result<Report> {
    let url = normalize_url(&request.url)?;
    let auditors = resolve_auditors(registry, request.types.as_deref())?;

    let input = AuditInput {
        url,
        timeout_ms: request.timeout_ms.unwrap_or(0),
        extra: request.extra,
    };
    let report_url = input.url.to_string();

    obs::emit_report_started(&report_url, auditors.len());
    let clock = Instant::now();
    let started_at = Utc::now();

    let audits = join_all(
        auditors
            .iter()
            .map(|auditor| run_guarded(auditor.as_ref(), &input, options)),
    )
    .await;

    let finished_at = Utc::now();
    let summary = summarize(&audits);

    METRICS.inc_reports_built();
    obs::emit_report_finished(
        &report_url,
        clock.elapsed().as_millis() as u64,
        audits.len(),
        summary.overall_score,
    );

    Ok(Report {
        url: report_url,
        started_at,
        finished_at,
        audits,
        summary,
    })
}

/// Run one auditor, converting an error into a synthetic failure.
async fn run_guarded(auditor: &dyn Auditor, input: &AuditInput, options: &RunOptions) -> AuditResult {
    let key = auditor.key();
    let name = auditor.name();

    options.emit(AuditEvent::started(key, name));
    METRICS.inc_audits_launched();
    let clock = Instant::now();

    let mut result = match auditor.run(input).await {
        Ok(result) => result,
        Err(e) => {
            obs::emit_audit_failed(key, &format!("{e:#}"));
            AuditResult::failed(key, name, format!("{e:#}"))
        }
    };

    // The slot belongs to the registry key, whatever the auditor echoed.
    if result.key != key {
        debug!(expected = %key, returned = %result.key, "auditor returned mismatched key");
        result.key = key.to_string();
    }

    // Status always follows the logs.
    let derived = AuditStatus::from_logs(&result.logs);
    if result.status != derived {
        debug!(audit_key = %key, returned = %result.status, derived = %derived, "auditor status disagreed with its logs");
        result.status = derived;
    }

    if result.status == AuditStatus::Fail {
        METRICS.inc_audits_failed();
    }
    obs::emit_audit_settled(key, result.status, clock.elapsed().as_millis() as u64);
    options.emit(AuditEvent::settled(&result));

    result
}
