//! Caller credentials and the user-directory contract.
//!
//! The [`UserDirectory`] trait is the kernel-level abstraction over wherever
//! the platform stores its registered callers (database, remote service,
//! in-memory seed).  Concrete implementations live in `apihub-gateway` or in
//! deployment-specific crates.

use crate::error::ServiceError;
use async_trait::async_trait;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Credential
// ─────────────────────────────────────────────────────────────────────────────

/// A caller identity registered with the platform.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Numeric user id, used for invocation accounting.
    pub id: i64,
    /// Public identifier the caller sends in the `accesskey` header.
    pub access_key: String,
    /// Shared secret both sides feed into the signature.  Never sent on the
    /// wire; the `Debug` rendering redacts it so it cannot leak into logs.
    pub secret_key: String,
}

impl Credential {
    /// Construct a credential.
    pub fn new(id: i64, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            id,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UserDirectory trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for credential lookup.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch the credential registered under `access_key`.
    ///
    /// `Ok(None)` means no such key exists; `Err` means the directory itself
    /// could not answer.  Callers treat both as an authentication failure but
    /// log them differently.
    async fn lookup(&self, access_key: &str) -> Result<Option<Credential>, ServiceError>;
}
