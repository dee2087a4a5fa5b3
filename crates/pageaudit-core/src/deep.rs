//! Deep audit flow: baseline run, optional deep analysis, dispatch.
//!
//! Stages are reported through a [`ProgressTracker`]. While the analyzer is
//! pending, a heartbeat fires every interval with a non-decreasing estimate
//! capped at [`DEEP_PROGRESS_CAP`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info_span, Instrument};

use crate::domain::{AuditError, AuditRequest, Report, Result};
use crate::obs;
use crate::progress::{
    fields, ProgressTracker, Stage, DEEP_PROGRESS_CAP, DEEP_PROGRESS_FLOOR, HEARTBEAT_STEP,
};
use crate::registry::AuditRegistry;
use crate::runner::{run_audits, RunOptions};

/// Produces a remediation plan for a finished report (e.g. via an LLM).
#[async_trait]
pub trait DeepAnalyzer: Send + Sync {
    async fn analyze(&self, report: &Report) -> anyhow::Result<Value>;
}

/// What a request ultimately returns to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub report: Report,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
}

/// Orchestrates one request through every progress stage.
pub struct DeepAuditFlow<'a> {
    registry: &'a AuditRegistry,
    heartbeat: Duration,
}

impl<'a> DeepAuditFlow<'a> {
    pub fn new(registry: &'a AuditRegistry, heartbeat: Duration) -> Self {
        Self {
            registry,
            heartbeat: heartbeat.max(Duration::from_millis(1)),
        }
    }

    /// Run the request, reporting every stage to `tracker`.
    ///
    /// Any error emits the `failed` stage before being returned.
    pub async fn run(
        &self,
        request: AuditRequest,
        analyzer: Option<&dyn DeepAnalyzer>,
        tracker: Arc<ProgressTracker>,
    ) -> Result<AuditResponse> {
        let span = info_span!("pageaudit.request", request_id = %tracker.request_id());
        let outcome = self
            .run_stages(request, analyzer, &tracker)
            .instrument(span)
            .await;
        if let Err(e) = &outcome {
            obs::emit_request_failed(tracker.request_id(), e);
            tracker.fail(e);
        }
        outcome
    }

    async fn run_stages(
        &self,
        request: AuditRequest,
        analyzer: Option<&dyn DeepAnalyzer>,
        tracker: &Arc<ProgressTracker>,
    ) -> Result<AuditResponse> {
        tracker.emit(
            Stage::RequestReceived,
            fields(json!({ "url": request.url, "deep": analyzer.is_some() })),
        );

        let total = request
            .types
            .as_ref()
            .map_or(self.registry.len(), Vec::len);
        tracker.set_total(total);
        tracker.emit(Stage::BaselineStarted, fields(json!({ "totalAudits": total })));

        let options = RunOptions::with_event_sink(tracker.audit_sink());
        let report = run_audits(self.registry, request, &options).await?;

        tracker.emit(
            Stage::BaselineCompleted,
            fields(json!({
                "totalAudits": report.summary.total_audits,
                "infoCount": report.summary.info_count,
                "warningCount": report.summary.warning_count,
                "errorCount": report.summary.error_count,
                "overallScore": report.summary.overall_score,
            })),
        );

        let analysis = match analyzer {
            Some(analyzer) => Some(self.analyze(analyzer, &report, tracker).await?),
            None => None,
        };

        tracker.emit(
            Stage::ResponseDispatched,
            fields(json!({
                "totalAudits": report.summary.total_audits,
                "overallScore": report.summary.overall_score,
                "hasAnalysis": analysis.is_some(),
            })),
        );

        Ok(AuditResponse { report, analysis })
    }

    async fn analyze(
        &self,
        analyzer: &dyn DeepAnalyzer,
        report: &Report,
        tracker: &ProgressTracker,
    ) -> Result<Value> {
        tracker.emit(Stage::DeepAnalysisStarted, serde_json::Map::new());

        let started = Instant::now();
        let mut ticker = interval(self.heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let pending = analyzer.analyze(report);
        tokio::pin!(pending);

        let mut estimate = DEEP_PROGRESS_FLOOR;
        let outcome = loop {
            tokio::select! {
                biased;
                outcome = &mut pending => break outcome,
                _ = ticker.tick() => {
                    estimate = estimate.saturating_add(HEARTBEAT_STEP).min(DEEP_PROGRESS_CAP);
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    obs::emit_deep_heartbeat(tracker.request_id(), estimate, elapsed_ms);
                    tracker.emit_with_progress(
                        Stage::DeepAnalysisProgress,
                        Some(estimate),
                        fields(json!({ "elapsedMs": elapsed_ms })),
                    );
                }
            }
        };

        let analysis = outcome.map_err(|e| AuditError::DeepAnalysis(format!("{e:#}")))?;
        tracker.emit(
            Stage::DeepAnalysisCompleted,
            fields(json!({ "durationMs": started.elapsed().as_millis() as u64 })),
        );
        Ok(analysis)
    }
}
