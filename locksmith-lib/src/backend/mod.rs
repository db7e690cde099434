//! Secret store backends.
//!
//! A backend is a path-addressed key/value secret store holding one copy of
//! the key set. This module provides:
//! - the [`SecretBackend`] trait the rotation cycle reads and writes through
//! - [`InMemoryBackend`] for tests and dry runs
//! - [`VaultBackend`] for HashiCorp Vault's KV HTTP API (`vault-http` feature)
//!
//! ## Wire shape
//!
//! Reads return the raw secret document, with the key set nested under a
//! `data` field:
//!
//! ```json
//! {"data": {"keys": ["...", "...", "..."], "creation_time": 1700000000, "period": 3600}}
//! ```
//!
//! Writes send [`KeySetFields`], which fully replaces the secret.

mod memory;
mod vault;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::keyset::KeySet;

pub use memory::InMemoryBackend;
pub use vault::VaultBackend;

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("connection to {target} failed: {reason}")]
    ConnectionFailed { target: String, reason: String },
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Serialization(e.to_string())
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Fields written to a backend for one key set.
///
/// `ttl` is a duration string in seconds (`"120s"`), the lease hint the
/// secret store attaches to the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetFields {
    pub keys: Vec<String>,
    pub creation_time: i64,
    pub period: i64,
    pub ttl: String,
}

impl KeySetFields {
    /// Build the write payload for `key_set` with the given TTL.
    pub fn new(key_set: &KeySet, ttl_secs: u64) -> Self {
        Self {
            keys: key_set.keys.clone(),
            creation_time: key_set.creation_time,
            period: key_set.period,
            ttl: format!("{}s", ttl_secs),
        }
    }
}

impl std::fmt::Debug for KeySetFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetFields")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("creation_time", &self.creation_time)
            .field("period", &self.period)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// A secret store holding one copy of the key set.
///
/// Implementations carry their own connection settings and timeouts; the
/// rotation cycle calls them sequentially and never retries.
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Identity used in logs and errors (for Vault, the server address).
    fn name(&self) -> &str;

    /// Read the raw secret document at `path`.
    ///
    /// Returns `Ok(None)` when nothing is stored at `path`.
    async fn read(&self, path: &str) -> BackendResult<Option<Vec<u8>>>;

    /// Overwrite the secret at `path` with `fields`.
    async fn write(&self, path: &str, fields: &KeySetFields) -> BackendResult<()>;
}
