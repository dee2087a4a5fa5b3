//! Injectable response cache with TTL eviction.
//!
//! Owned by the transport-facing [`crate::service::AuditService`]; the
//! runner and aggregator never see it.

use std::time::Duration;

use moka::sync::Cache;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::deep::AuditResponse;

/// Key-value store for finished responses.
pub trait ResponseCache: Send + Sync {
    /// A live entry for `key`, if any.
    fn get(&self, key: &str) -> Option<AuditResponse>;

    fn put(&self, key: String, response: AuditResponse);

    /// Apply pending expirations and capacity evictions now.
    fn purge_expired(&self);
}

/// Bounded in-memory [`ResponseCache`] whose entries expire after a fixed TTL.
///
/// Expired and over-capacity entries are evicted in the background of
/// reads and writes, so distinct keys never accumulate.
pub struct MemoryResponseCache {
    ttl: Duration,
    entries: Cache<String, AuditResponse>,
}

impl MemoryResponseCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { ttl, entries }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entry count as of the last maintenance pass.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryResponseCache {
    fn get(&self, key: &str) -> Option<AuditResponse> {
        self.entries.get(key)
    }

    fn put(&self, key: String, response: AuditResponse) {
        self.entries.insert(key, response);
    }

    fn purge_expired(&self) {
        self.entries.run_pending_tasks();
    }
}

impl std::fmt::Debug for MemoryResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryResponseCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

/// Copy of `value` with every object's keys in sorted order.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let sorted: Map<String, Value> = keys
                .into_iter()
                .map(|k| (k.clone(), canonical(&map[k])))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Deterministic key over everything that can change a response: the
/// normalised URL, ordered auditor keys, effective timeout, `extra` fields
/// and the deep flag.
pub fn cache_key(
    url: &str,
    types: &[String],
    timeout_ms: u64,
    extra: &Map<String, Value>,
    deep: bool,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\0");
    for key in types {
        hasher.update(key.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(timeout_ms.to_be_bytes());
    hasher.update(canonical(&Value::Object(extra.clone())).to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(if deep { b"deep".as_slice() } else { b"baseline".as_slice() });
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use chrono::Utc;
    use serde_json::json;

    fn response(url: &str) -> AuditResponse {
        AuditResponse {
            report: crate::domain::Report {
                url: url.to_string(),
                started_at: Utc::now(),
                finished_at: Utc::now(),
                audits: vec![],
                summary: summarize(&[]),
            },
            analysis: None,
        }
    }

    fn extra(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn key(types: &[String], timeout_ms: u64, extra: &Map<String, Value>, deep: bool) -> String {
        cache_key("https://example.com/", types, timeout_ms, extra, deep)
    }

    #[test]
    fn test_cache_key_deterministic_and_order_sensitive() {
        let a = vec!["perf".to_string(), "seo".to_string()];
        let b = vec!["seo".to_string(), "perf".to_string()];
        let none = Map::new();
        assert_eq!(key(&a, 0, &none, false), key(&a, 0, &none, false));
        assert_ne!(key(&a, 0, &none, false), key(&b, 0, &none, false));
        assert_ne!(key(&a, 0, &none, false), key(&a, 0, &none, true));
    }

    #[test]
    fn test_cache_key_covers_timeout_and_extra() {
        let types = vec!["perf".to_string()];
        let none = Map::new();
        let with_key = extra(json!({ "apiKey": "k-123" }));
        assert_ne!(key(&types, 0, &none, false), key(&types, 0, &with_key, false));
        assert_ne!(key(&types, 1_000, &none, false), key(&types, 2_000, &none, false));
    }

    #[test]
    fn test_cache_key_ignores_extra_field_order() {
        let types = vec!["perf".to_string()];
        let mut ab = Map::new();
        ab.insert("a".to_string(), json!({ "y": 1, "x": 2 }));
        ab.insert("b".to_string(), json!(true));
        let mut ba = Map::new();
        ba.insert("b".to_string(), json!(true));
        ba.insert("a".to_string(), json!({ "x": 2, "y": 1 }));
        assert_eq!(key(&types, 0, &ab, false), key(&types, 0, &ba, false));
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = MemoryResponseCache::new(Duration::from_millis(50), 100);
        cache.put("k".to_string(), response("https://example.com/"));
        assert!(cache.get("k").is_some());

        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_expired_distinct_keys_are_evicted() {
        let cache = MemoryResponseCache::new(Duration::from_millis(500), 10_000);
        for i in 0..500 {
            cache.put(format!("k{i}"), response(&format!("https://{i}.example/")));
        }
        cache.purge_expired();
        assert_eq!(cache.len(), 500);

        std::thread::sleep(Duration::from_millis(700));
        cache.purge_expired();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = MemoryResponseCache::new(Duration::from_secs(60), 10);
        for i in 0..100 {
            cache.put(format!("k{i}"), response("https://example.com/"));
        }
        cache.purge_expired();
        assert!(cache.len() <= 10, "entries: {}", cache.len());
    }
}
