//! Transport-facing entry point: configuration defaults, response cache, deep flow.

use std::sync::Arc;

use serde_json::json;

use crate::cache::{cache_key, MemoryResponseCache, ResponseCache};
use crate::config::AuditConfig;
use crate::deep::{AuditResponse, DeepAnalyzer, DeepAuditFlow};
use crate::domain::{normalize_url, AuditRequest, Report, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::progress::{fields, ProgressSink, ProgressTracker, Stage};
use crate::registry::AuditRegistry;

/// Owns the registry, configuration and response cache for request handling.
pub struct AuditService {
    registry: Arc<AuditRegistry>,
    config: AuditConfig,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl AuditService {
    /// Build a service with an in-memory cache when `config.cache_ttl_secs > 0`.
    pub fn new(registry: Arc<AuditRegistry>, config: AuditConfig) -> Self {
        let cache = config.cache_ttl().map(|ttl| {
            Arc::new(MemoryResponseCache::new(ttl, config.cache_max_entries))
                as Arc<dyn ResponseCache>
        });
        Self {
            registry,
            config,
            cache,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn registry(&self) -> &AuditRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Baseline audit only.
    pub async fn audit(&self, request: AuditRequest) -> Result<Report> {
        self.handle(request, None, None).await.map(|r| r.report)
    }

    /// Full request handling with optional deep analysis and progress streaming.
    pub async fn handle(
        &self,
        mut request: AuditRequest,
        analyzer: Option<&dyn DeepAnalyzer>,
        sink: Option<ProgressSink>,
    ) -> Result<AuditResponse> {
        if request.timeout_ms.is_none() {
            request.timeout_ms = Some(self.config.timeout_ms);
        }

        let tracker = Arc::new(ProgressTracker::with_random_id(sink));
        let key = self.cache_key_for(&request, analyzer.is_some());

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(response) = cache.get(key) {
                obs::emit_cache_hit(key);
                METRICS.inc_cache_hits();
                tracker.emit(
                    Stage::RequestReceived,
                    fields(json!({ "url": request.url, "deep": analyzer.is_some() })),
                );
                tracker.emit(
                    Stage::ResponseDispatched,
                    fields(json!({
                        "totalAudits": response.report.summary.total_audits,
                        "overallScore": response.report.summary.overall_score,
                        "hasAnalysis": response.analysis.is_some(),
                        "cached": true,
                    })),
                );
                return Ok(response);
            }
        }

        let flow = DeepAuditFlow::new(&self.registry, self.config.heartbeat_interval());
        let response = flow.run(request, analyzer, tracker).await?;

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, response.clone());
        }
        Ok(response)
    }

    /// Cache key for a request, or `None` if it will fail validation anyway.
    ///
    /// Called after the default timeout is filled in, so the key carries the
    /// effective timeout.
    fn cache_key_for(&self, request: &AuditRequest, deep: bool) -> Option<String> {
        let url = normalize_url(&request.url).ok()?;
        let types: Vec<String> = match &request.types {
            Some(types) if types.iter().all(|t| self.registry.contains(t)) => types.clone(),
            Some(_) => return None,
            None => self.registry.keys().map(str::to_string).collect(),
        };
        Some(cache_key(
            url.as_str(),
            &types,
            request.timeout_ms.unwrap_or(0),
            &request.extra,
            deep,
        ))
    }
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}
