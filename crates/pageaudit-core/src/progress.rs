//! Staged progress protocol for long-running audit requests.
//!
//! A pure translation layer: [`ProgressTracker`] observes runner
//! [`AuditEvent`]s and flow milestones and maps each onto a fixed
//! `(status, progress, message)` template, stamped with the request id and
//! a timestamp. It never influences the run it observes.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::events::{AuditEvent, AuditEventSink};

/// Progress at which per-audit completion reporting starts.
pub const AUDIT_PROGRESS_FLOOR: u8 = 10;
/// Share of the progress bar covered by baseline audits.
pub const AUDIT_PROGRESS_SPAN: u8 = 50;
/// Progress at which deep analysis starts.
pub const DEEP_PROGRESS_FLOOR: u8 = 65;
/// Heartbeat estimates never reach the `deep_analysis_completed` floor.
pub const DEEP_PROGRESS_CAP: u8 = 89;
/// Increment per heartbeat tick.
pub const HEARTBEAT_STEP: u8 = 3;

/// Coarse state of the request carried on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Named milestones of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RequestReceived,
    BaselineStarted,
    AuditStarted,
    AuditCompleted,
    AuditFailed,
    BaselineCompleted,
    DeepAnalysisStarted,
    DeepAnalysisProgress,
    DeepAnalysisCompleted,
    ResponseDispatched,
    Failed,
}

/// Fixed template for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTemplate {
    pub status: ProgressStatus,
    pub progress: Option<u8>,
    pub message: &'static str,
}

impl Stage {
    pub fn template(self) -> StageTemplate {
        use ProgressStatus::*;
        let (status, progress, message) = match self {
            Stage::RequestReceived => (Queued, Some(0), "Audit request received"),
            Stage::BaselineStarted => (Running, Some(5), "Running baseline audits"),
            Stage::AuditStarted => (Running, None, "Audit started"),
            Stage::AuditCompleted => (Running, Some(AUDIT_PROGRESS_FLOOR), "Audit completed"),
            Stage::AuditFailed => (Running, Some(AUDIT_PROGRESS_FLOOR), "Audit failed"),
            Stage::BaselineCompleted => (
                Running,
                Some(AUDIT_PROGRESS_FLOOR + AUDIT_PROGRESS_SPAN),
                "Baseline audits completed",
            ),
            Stage::DeepAnalysisStarted => {
                (Running, Some(DEEP_PROGRESS_FLOOR), "Starting deep analysis")
            }
            Stage::DeepAnalysisProgress => {
                (Running, Some(DEEP_PROGRESS_FLOOR), "Deep analysis in progress")
            }
            Stage::DeepAnalysisCompleted => (Running, Some(90), "Deep analysis completed"),
            Stage::ResponseDispatched => (Completed, Some(100), "Audit response ready"),
            Stage::Failed => (Failed, None, "Audit request failed"),
        };
        StageTemplate {
            status,
            progress,
            message,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::RequestReceived => "request_received",
            Stage::BaselineStarted => "baseline_started",
            Stage::AuditStarted => "audit_started",
            Stage::AuditCompleted => "audit_completed",
            Stage::AuditFailed => "audit_failed",
            Stage::BaselineCompleted => "baseline_completed",
            Stage::DeepAnalysisStarted => "deep_analysis_started",
            Stage::DeepAnalysisProgress => "deep_analysis_progress",
            Stage::DeepAnalysisCompleted => "deep_analysis_completed",
            Stage::ResponseDispatched => "response_dispatched",
            Stage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of one progress update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub request_id: String,
    pub stage: Stage,
    pub status: ProgressStatus,
    pub progress: Option<u8>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Stage-specific fields, flattened into the top-level object.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ProgressEvent {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Synchronous observer of [`ProgressEvent`]s (e.g. an SSE writer).
pub type ProgressSink = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Translates request milestones and runner events into [`ProgressEvent`]s.
pub struct ProgressTracker {
    request_id: String,
    sink: Option<ProgressSink>,
    total: AtomicUsize,
    settled: AtomicUsize,
    high_water: AtomicU8,
}

impl ProgressTracker {
    pub fn new(request_id: impl Into<String>, sink: Option<ProgressSink>) -> Self {
        Self {
            request_id: request_id.into(),
            sink,
            total: AtomicUsize::new(0),
            settled: AtomicUsize::new(0),
            high_water: AtomicU8::new(0),
        }
    }

    /// Tracker with a fresh v4 request id.
    pub fn with_random_id(sink: Option<ProgressSink>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), sink)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Number of audits the baseline run will settle.
    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.settled.store(0, Ordering::Relaxed);
    }

    /// Emit a stage with its template progress.
    pub fn emit(&self, stage: Stage, fields: Map<String, Value>) {
        self.emit_with_progress(stage, stage.template().progress, fields);
    }

    /// Emit a stage with an explicit progress value.
    pub fn emit_with_progress(&self, stage: Stage, progress: Option<u8>, fields: Map<String, Value>) {
        if let Some(p) = progress {
            self.high_water.fetch_max(p, Ordering::Relaxed);
        }
        let Some(sink) = &self.sink else {
            return;
        };
        let template = stage.template();
        let event = ProgressEvent {
            request_id: self.request_id.clone(),
            stage,
            status: template.status,
            progress,
            message: template.message.to_string(),
            timestamp: Utc::now(),
            fields,
        };
        sink(&event);
    }

    /// Emit the `failed` stage carrying the error message.
    pub fn fail(&self, error: &dyn std::fmt::Display) {
        self.emit(Stage::Failed, fields(json!({ "error": error.to_string() })));
    }

    /// Highest progress value emitted so far.
    pub fn high_water(&self) -> u8 {
        self.high_water.load(Ordering::Relaxed)
    }

    /// Progress after `settled` of `total` audits have finished.
    pub fn audit_progress(settled: usize, total: usize) -> u8 {
        if total == 0 {
            return AUDIT_PROGRESS_FLOOR + AUDIT_PROGRESS_SPAN;
        }
        let settled = settled.min(total);
        AUDIT_PROGRESS_FLOOR + (AUDIT_PROGRESS_SPAN as usize * settled / total) as u8
    }

    /// Translate one runner event.
    pub fn observe(&self, event: &AuditEvent) {
        match event {
            AuditEvent::AuditStarted {
                audit_key,
                audit_name,
            } => self.emit(
                Stage::AuditStarted,
                fields(json!({ "auditKey": audit_key, "auditName": audit_name })),
            ),
            AuditEvent::AuditCompleted {
                audit_key,
                audit_name,
                result,
            }
            | AuditEvent::AuditFailed {
                audit_key,
                audit_name,
                result,
            } => {
                let settled = self.settled.fetch_add(1, Ordering::Relaxed) + 1;
                let total = self.total.load(Ordering::Relaxed);
                let stage = if matches!(event, AuditEvent::AuditFailed { .. }) {
                    Stage::AuditFailed
                } else {
                    Stage::AuditCompleted
                };
                self.emit_with_progress(
                    stage,
                    Some(Self::audit_progress(settled, total)),
                    fields(json!({
                        "auditKey": audit_key,
                        "auditName": audit_name,
                        "auditStatus": result.status,
                        "completed": settled,
                        "total": total,
                    })),
                );
            }
        }
    }

    /// An [`AuditEventSink`] forwarding runner events into this tracker.
    pub fn audit_sink(self: &Arc<Self>) -> AuditEventSink {
        let tracker = Arc::clone(self);
        Arc::new(move |event: &AuditEvent| tracker.observe(event))
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("request_id", &self.request_id)
            .field("total", &self.total.load(Ordering::Relaxed))
            .field("settled", &self.settled.load(Ordering::Relaxed))
            .finish()
    }
}

/// Turn a `json!` object literal into a field map.
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
