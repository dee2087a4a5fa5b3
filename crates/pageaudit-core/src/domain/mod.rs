//! Domain models for PageAudit.
//!
//! Canonical definitions for the core entities:
//! - `AuditRequest` / `AuditInput`: what a run is asked to inspect
//! - `AuditResult`: one auditor's verdict with its logs
//! - `Report` / `Summary`: the aggregated output of a run

pub mod error;
pub mod input;
pub mod log;
pub mod report;
pub mod result;

pub use error::{AuditError, Result};
pub use input::{normalize_url, AuditInput, AuditRequest};
pub use log::{AuditLog, AuditStatus, LogEntry, LogLevel};
pub use report::{Finding, Report, Scoring, Summary};
pub use result::AuditResult;
