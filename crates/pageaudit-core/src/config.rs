//! Engine configuration, resolved once at bootstrap.
//!
//! Environment variables:
//! - `PAGEAUDIT_TIMEOUT_MS`: per-auditor timeout, `0` disables it
//! - `PAGEAUDIT_CACHE_TTL_SECS`: response cache TTL, `0` disables caching
//! - `PAGEAUDIT_CACHE_MAX_ENTRIES`: response cache capacity
//! - `PAGEAUDIT_HEARTBEAT_MS`: deep-analysis heartbeat interval
//! - `PAGEAUDIT_USER_AGENT`: user agent for outbound requests
//! - `PAGESPEED_API_KEY`: optional PageSpeed Insights key for the perf auditor

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1_000;
pub const DEFAULT_HEARTBEAT_MS: u64 = 5_000;
pub const DEFAULT_USER_AGENT: &str = concat!("pageaudit/", env!("CARGO_PKG_VERSION"));

/// Explicit configuration passed to the service and auditors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: u64,
    pub heartbeat_interval_ms: u64,
    pub user_agent: String,
    pub pagespeed_api_key: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pagespeed_api_key: None,
        }
    }
}

impl AuditConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        AuditConfig {
            timeout_ms: parse_u64(&lookup, "PAGEAUDIT_TIMEOUT_MS", defaults.timeout_ms),
            cache_ttl_secs: parse_u64(&lookup, "PAGEAUDIT_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            cache_max_entries: parse_u64(
                &lookup,
                "PAGEAUDIT_CACHE_MAX_ENTRIES",
                defaults.cache_max_entries,
            ),
            heartbeat_interval_ms: parse_u64(
                &lookup,
                "PAGEAUDIT_HEARTBEAT_MS",
                defaults.heartbeat_interval_ms,
            ),
            user_agent: lookup("PAGEAUDIT_USER_AGENT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            pagespeed_api_key: lookup("PAGESPEED_API_KEY").filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    pub fn with_cache_max_entries(mut self, entries: u64) -> Self {
        self.cache_max_entries = entries;
        self
    }

    pub fn with_heartbeat_interval_ms(mut self, ms: u64) -> Self {
        self.heartbeat_interval_ms = ms;
        self
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Heartbeat interval, never shorter than one millisecond.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }
}

fn parse_u64<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, default, "ignoring unparseable config value");
            default
        }),
        None => default,
    }
}
