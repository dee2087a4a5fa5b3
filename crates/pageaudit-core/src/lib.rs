//! PageAudit Core Library
//!
//! The audit orchestration engine: a registry of pluggable auditors, a
//! concurrent runner that fans a request out to them and aggregates their
//! results into a [`Report`], and a staged progress protocol for streaming
//! long-running requests.

pub mod auditor;
pub mod cache;
pub mod config;
pub mod deep;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod obs;
pub mod progress;
pub mod registry;
pub mod reporting;
pub mod runner;
pub mod service;
pub mod summary;
pub mod telemetry;

pub use auditor::{Auditor, AuditorInfo};
pub use cache::{cache_key, MemoryResponseCache, ResponseCache};
pub use config::AuditConfig;
pub use deep::{AuditResponse, DeepAnalyzer, DeepAuditFlow};
pub use domain::{
    normalize_url, AuditError, AuditInput, AuditLog, AuditRequest, AuditResult, AuditStatus,
    Finding, LogEntry, LogLevel, Report, Result, Scoring, Summary,
};
pub use events::{AuditEvent, AuditEventSink};
pub use metrics::METRICS;
pub use progress::{ProgressEvent, ProgressSink, ProgressStatus, ProgressTracker, Stage};
pub use registry::{AuditRegistry, AuditRegistryBuilder};
pub use reporting::{render_report_markdown, write_report_json, write_response_json};
pub use runner::{resolve_auditors, run_audits, RunOptions};
pub use service::AuditService;
pub use summary::summarize;
pub use telemetry::init_tracing;

/// PageAudit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
