//! Reading and writing key sets through backends.

use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::{KeySetFields, SecretBackend};
use crate::keyset::{self, KeySet};
use crate::{LocksmithError, Result};

/// Read the key set stored at `path`.
///
/// # Semantics
/// - Returns `Ok(None)` when nothing is stored at `path` (not bootstrapped yet).
/// - Returns [`LocksmithError::Read`] when the backend fails or the document
///   does not decode.
pub async fn read_key_set(backend: &dyn SecretBackend, path: &str) -> Result<Option<KeySet>> {
    debug!(backend = backend.name(), path, "Reading secret");

    let document = backend
        .read(path)
        .await
        .map_err(|source| LocksmithError::Read {
            backend: backend.name().to_string(),
            source,
        })?;

    match document {
        Some(bytes) => keyset::decode_document(&bytes)
            .map(Some)
            .map_err(|source| LocksmithError::Read {
                backend: backend.name().to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Write `key_set` to every backend, sequentially and in order.
///
/// Stops at the first failure. The returned error names the failing backend
/// and lists which backends were already written, leaving those holding the
/// new key set while the rest keep the previous one.
///
/// Returns the names of the backends written.
pub async fn write_key_set(
    backends: &[Arc<dyn SecretBackend>],
    path: &str,
    key_set: &KeySet,
    ttl_secs: u64,
) -> Result<Vec<String>> {
    let fields = KeySetFields::new(key_set, ttl_secs);
    let mut written = Vec::with_capacity(backends.len());

    for (i, backend) in backends.iter().enumerate() {
        info!(backend = backend.name(), "Writing keys");

        if let Err(source) = backend.write(path, &fields).await {
            return Err(LocksmithError::Write {
                backend: backend.name().to_string(),
                written,
                pending: backends[i..].iter().map(|b| b.name().to_string()).collect(),
                source,
            });
        }

        debug!(backend = backend.name(), "Keys written");
        written.push(backend.name().to_string());
    }

    Ok(written)
}
