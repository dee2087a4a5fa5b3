//! Auditor registry keyed by unique string.

use std::collections::HashMap;
use std::sync::Arc;

use crate::auditor::{Auditor, AuditorInfo};
use crate::domain::{AuditError, Result};

/// Uniqueness-enforcing lookup table from key to auditor.
///
/// Populated once at startup and read-only during runs. Keys are reported in
/// insertion order.
#[derive(Default)]
pub struct AuditRegistry {
    auditors: Vec<Arc<dyn Auditor>>,
    index: HashMap<String, usize>,
}

impl AuditRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an auditor under its own key.
    ///
    /// A duplicate key is a configuration error.
    pub fn register<A: Auditor + 'static>(&mut self, auditor: A) -> Result<()> {
        self.register_arc(Arc::new(auditor))
    }

    pub fn register_arc(&mut self, auditor: Arc<dyn Auditor>) -> Result<()> {
        let key = auditor.key().to_string();
        if self.index.contains_key(&key) {
            return Err(AuditError::DuplicateAuditor(key));
        }
        self.index.insert(key, self.auditors.len());
        self.auditors.push(auditor);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Auditor>> {
        self.index.get(key).map(|&i| Arc::clone(&self.auditors[i]))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.auditors.iter().map(|a| a.key())
    }

    pub fn auditors(&self) -> Vec<AuditorInfo> {
        self.auditors
            .iter()
            .map(|a| AuditorInfo::of(a.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.auditors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auditors.is_empty()
    }
}

impl std::fmt::Debug for AuditRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRegistry")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent construction of an [`AuditRegistry`].
#[derive(Debug, Default)]
pub struct AuditRegistryBuilder {
    registry: AuditRegistry,
}

impl AuditRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auditor<A: Auditor + 'static>(mut self, auditor: A) -> Result<Self> {
        self.registry.register(auditor)?;
        Ok(self)
    }

    pub fn with_arc(mut self, auditor: Arc<dyn Auditor>) -> Result<Self> {
        self.registry.register_arc(auditor)?;
        Ok(self)
    }

    pub fn build(self) -> AuditRegistry {
        self.registry
    }
}
