//! Built-in PageAudit auditors.
//!
//! Each auditor fetches the page through a shared [`PageFetcher`] and scores
//! it with a pure `analyze` function, so the scoring rules are testable
//! without a network.

pub mod fetch;
pub mod html;
pub mod perf;
mod scorecard;
pub mod security;
pub mod seo;

use std::sync::Arc;

use pageaudit_core::{AuditConfig, AuditRegistry, AuditRegistryBuilder, Result};

pub use fetch::{FetchedPage, PageFetcher};
pub use perf::PerfAuditor;
pub use scorecard::Scorecard;
pub use security::SecurityAuditor;
pub use seo::SeoAuditor;

/// Registry with `perf`, `seo` and `security`, in that order.
pub fn default_registry(config: &AuditConfig) -> anyhow::Result<AuditRegistry> {
    let fetcher = Arc::new(PageFetcher::new(&config.user_agent)?);
    Ok(register_builtins(
        AuditRegistryBuilder::new(),
        fetcher,
        config.pagespeed_api_key.clone(),
    )?
    .build())
}

/// Add the built-in auditors to an existing builder.
pub fn register_builtins(
    builder: AuditRegistryBuilder,
    fetcher: Arc<PageFetcher>,
    pagespeed_api_key: Option<String>,
) -> Result<AuditRegistryBuilder> {
    builder
        .with_auditor(PerfAuditor::new(Arc::clone(&fetcher), pagespeed_api_key))?
        .with_auditor(SeoAuditor::new(Arc::clone(&fetcher)))?
        .with_auditor(SecurityAuditor::new(fetcher))
}
