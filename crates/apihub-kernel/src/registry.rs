//! Upstream interface catalog and the registry contract.
//!
//! An interface is one forwardable upstream endpoint the platform has
//! published.  The [`InterfaceRegistry`] trait abstracts over where the
//! catalog lives; the lookup key is the *full upstream URL* plus method, so
//! the registry and the forwarder can never disagree about which endpoint a
//! descriptor refers to.

use crate::error::ServiceError;
use crate::types::HttpMethod;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// InterfaceDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// A published upstream interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    /// Unique interface id, used for invocation accounting.
    pub id: i64,
    /// Full upstream URL this interface is registered under,
    /// e.g. `http://10.0.0.5:8123/api/name`.
    pub url: String,
    /// HTTP method the interface accepts.
    pub method: HttpMethod,
    /// Disabled interfaces are indistinguishable from unregistered ones
    /// to callers.
    pub enabled: bool,
}

impl InterfaceDescriptor {
    /// Construct an enabled descriptor.
    pub fn new(id: i64, url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            id,
            url: url.into(),
            method,
            enabled: true,
        }
    }

    /// Builder helper: mark the interface disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InterfaceRegistry trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for the interface catalog.
#[async_trait]
pub trait InterfaceRegistry: Send + Sync {
    /// Find the descriptor registered under exactly `url` and `method`.
    ///
    /// `Ok(None)` means nothing is registered there; `Err` means the catalog
    /// itself could not answer.  Disabled descriptors are still returned —
    /// the caller decides what disabled means.
    async fn find(
        &self,
        url: &str,
        method: &HttpMethod,
    ) -> Result<Option<InterfaceDescriptor>, ServiceError>;
}
