//! In-memory secret backend.
//!
//! Stores secrets in the same `{"data": {...}}` document shape Vault
//! returns, so the read path decodes exactly what a real backend serves.
//! Intended for tests and dry runs; nothing survives the process.
//!
//! # Thread Safety
//!
//! This backend uses `RwLock` for thread-safe access. Lock poisoning
//! is reported as [`BackendError::Internal`] rather than panicking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{BackendError, BackendResult, KeySetFields, SecretBackend};
use crate::keyset::{self, KeySet};

/// In-memory implementation of [`SecretBackend`] with fault injection.
pub struct InMemoryBackend {
    name: String,
    secrets: RwLock<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

/// Helper function to handle lock poisoning gracefully.
fn lock_error(context: &str) -> BackendError {
    BackendError::Internal(format!(
        "InMemoryBackend: lock poisoned during {}",
        context
    ))
}

impl InMemoryBackend {
    /// Create an empty backend identified by `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secrets: RwLock::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Store a raw secret document at `path`, bypassing the write counter.
    pub fn insert_raw(&self, path: &str, document: impl Into<Vec<u8>>) -> BackendResult<()> {
        let mut secrets = self.secrets.write().map_err(|_| lock_error("insert_raw"))?;
        secrets.insert(path.to_string(), document.into());
        Ok(())
    }

    /// Seed `path` with `key_set`, bypassing the write counter.
    pub fn insert_key_set(&self, path: &str, key_set: &KeySet) -> BackendResult<()> {
        self.insert_raw(path, keyset::encode_document(key_set)?)
    }

    /// Decode the key set currently stored at `path`.
    pub fn key_set(&self, path: &str) -> BackendResult<Option<KeySet>> {
        let secrets = self.secrets.read().map_err(|_| lock_error("key_set"))?;
        match secrets.get(path) {
            Some(document) => keyset::decode_document(document).map(Some),
            None => Ok(None),
        }
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes through [`SecretBackend::write`].
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretBackend for InMemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, path: &str) -> BackendResult<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable(format!(
                "{}: reads disabled",
                self.name
            )));
        }

        let secrets = self.secrets.read().map_err(|_| lock_error("read"))?;
        Ok(secrets.get(path).cloned())
    }

    async fn write(&self, path: &str, fields: &KeySetFields) -> BackendResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable(format!(
                "{}: writes disabled",
                self.name
            )));
        }

        let document = serde_json::to_vec(&serde_json::json!({ "data": fields }))?;

        let mut secrets = self.secrets.write().map_err(|_| lock_error("write"))?;
        secrets.insert(path.to_string(), document);
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}
