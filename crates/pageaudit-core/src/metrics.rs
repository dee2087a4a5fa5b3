//! Global atomic counters for PageAudit observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before the process exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations or locking.
pub struct Metrics {
    reports_built: AtomicU64,
    audits_launched: AtomicU64,
    audits_failed: AtomicU64,
    cache_hits: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            reports_built: AtomicU64::new(0),
            audits_launched: AtomicU64::new(0),
            audits_failed: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    pub fn inc_reports_built(&self) {
        self.reports_built.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "reports_built", "counter incremented");
    }

    pub fn inc_audits_launched(&self) {
        self.audits_launched.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "audits_launched", "counter incremented");
    }

    /// Counts every FAIL result, synthetic or not.
    pub fn inc_audits_failed(&self) {
        self.audits_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "audits_failed", "counter incremented");
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cache_hits", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            reports_built = self.reports_built(),
            audits_launched = self.audits_launched(),
            audits_failed = self.audits_failed(),
            cache_hits = self.cache_hits(),
        );
    }

    pub fn reports_built(&self) -> u64 {
        self.reports_built.load(Ordering::Relaxed)
    }

    pub fn audits_launched(&self) -> u64 {
        self.audits_launched.load(Ordering::Relaxed)
    }

    pub fn audits_failed(&self) -> u64 {
        self.audits_failed.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.reports_built.store(0, Ordering::Relaxed);
        self.audits_launched.store(0, Ordering::Relaxed);
        self.audits_failed.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
    }
}
