//! In-memory platform-service implementations.
//!
//! Suitable for single-node deployments and tests.  Database-backed
//! implementations belong in separate deployment crates; the gateway only
//! ever sees the kernel traits.

use apihub_kernel::{
    Credential, HttpMethod, InterfaceDescriptor, InterfaceRegistry, ServiceError, UsageMeter,
    UserDirectory,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// User directory
// ─────────────────────────────────────────────────────────────────────────────

/// [`UserDirectory`] backed by a simple `HashMap`, seeded at startup.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    store: HashMap<String, Credential>,
}

impl InMemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder helper: seed a credential, keyed by its access key.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.store
            .insert(credential.access_key.clone(), credential);
        self
    }

    /// Number of seeded credentials.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, access_key: &str) -> Result<Option<Credential>, ServiceError> {
        Ok(self.store.get(access_key).cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Interface registry
// ─────────────────────────────────────────────────────────────────────────────

/// [`InterfaceRegistry`] backed by a `HashMap` keyed on (url, method).
#[derive(Default)]
pub struct InMemoryInterfaceRegistry {
    store: HashMap<(String, HttpMethod), InterfaceDescriptor>,
}

impl InMemoryInterfaceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder helper: publish an interface under its own url and method.
    pub fn with_interface(mut self, descriptor: InterfaceDescriptor) -> Self {
        self.store.insert(
            (descriptor.url.clone(), descriptor.method.clone()),
            descriptor,
        );
        self
    }

    /// Number of published interfaces.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl InterfaceRegistry for InMemoryInterfaceRegistry {
    async fn find(
        &self,
        url: &str,
        method: &HttpMethod,
    ) -> Result<Option<InterfaceDescriptor>, ServiceError> {
        Ok(self
            .store
            .get(&(url.to_string(), method.clone()))
            .cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Usage meter
// ─────────────────────────────────────────────────────────────────────────────

/// [`UsageMeter`] keeping per-(interface, user) invocation counters in a
/// concurrent map.  Recording happens while responses stream, so the map
/// must tolerate concurrent writers without an outer lock.
#[derive(Default)]
pub struct InMemoryUsageMeter {
    counters: DashMap<(i64, i64), u64>,
}

impl InMemoryUsageMeter {
    /// Create a meter with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations recorded for an (interface, user) pair.
    pub fn count(&self, interface_id: i64, user_id: i64) -> u64 {
        self.counters
            .get(&(interface_id, user_id))
            .map(|v| *v)
            .unwrap_or(0)
    }
}

#[async_trait]
impl UsageMeter for InMemoryUsageMeter {
    async fn record_invocation(&self, interface_id: i64, user_id: i64) -> Result<(), ServiceError> {
        *self.counters.entry((interface_id, user_id)).or_insert(0) += 1;
        Ok(())
    }
}
