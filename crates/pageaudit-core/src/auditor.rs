//! The pluggable auditor contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{AuditInput, AuditResult};

/// A named unit that inspects one target and reports on one concern.
///
/// Implementations are constructed once and shared across runs, so `run`
/// must not rely on mutable state between calls. Returning `Err` is distinct
/// from returning a `FAIL` result: the runner turns errors into a synthetic
/// failure carrying the error message.
#[async_trait]
pub trait Auditor: Send + Sync {
    /// Unique, stable registry key (e.g. `"perf"`).
    fn key(&self) -> &str;

    /// Human-readable display label.
    fn name(&self) -> &str;

    async fn run(&self, input: &AuditInput) -> anyhow::Result<AuditResult>;
}

/// Key and display name of a registered auditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorInfo {
    pub key: String,
    pub name: String,
}

impl AuditorInfo {
    pub fn of(auditor: &dyn Auditor) -> Self {
        Self {
            key: auditor.key().to_string(),
            name: auditor.name().to_string(),
        }
    }
}
