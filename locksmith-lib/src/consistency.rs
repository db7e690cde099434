//! Cross-backend consistency check.
//!
//! All backends must hold the same key set. A missing key set or any
//! difference stops the cycle: divergence usually means an earlier write
//! sequence failed part way, and which copy is authoritative cannot be
//! decided automatically.

use crate::errors::ConsistencyError;
use crate::keyset::KeySet;

/// The key set read from one backend, `None` when the backend holds nothing.
#[derive(Clone, Debug)]
pub struct BackendRead {
    pub backend: String,
    pub key_set: Option<KeySet>,
}

impl BackendRead {
    pub fn new(backend: impl Into<String>, key_set: Option<KeySet>) -> Self {
        Self {
            backend: backend.into(),
            key_set,
        }
    }
}

/// Verify every backend holds the same key set and return it.
///
/// `reads` must be in configured backend order; the first backend is the
/// reference every other copy is compared against.
///
/// # Errors
/// - [`ConsistencyError::NoBackends`] when `reads` is empty
/// - [`ConsistencyError::NoKeysFound`] naming the first backend without keys
/// - [`ConsistencyError::Divergent`] naming every backend that differs from
///   the reference
pub fn verify_consistency(reads: Vec<BackendRead>) -> Result<KeySet, ConsistencyError> {
    if let Some(absent) = reads.iter().find(|r| r.key_set.is_none()) {
        return Err(ConsistencyError::NoKeysFound {
            backend: absent.backend.clone(),
        });
    }

    let mut reads = reads.into_iter();
    let (reference_name, reference) = match reads.next() {
        Some(BackendRead {
            backend,
            key_set: Some(key_set),
        }) => (backend, key_set),
        _ => return Err(ConsistencyError::NoBackends),
    };

    let divergent: Vec<String> = reads
        .filter(|r| r.key_set.as_ref() != Some(&reference))
        .map(|r| r.backend)
        .collect();

    if !divergent.is_empty() {
        return Err(ConsistencyError::Divergent {
            reference: reference_name,
            backends: divergent,
        });
    }

    Ok(reference)
}
