//! The rotating Fernet key set.
//!
//! Key order carries meaning:
//!
//! | index     | role                                                  |
//! |-----------|-------------------------------------------------------|
//! | `0`       | staging: newest key, not yet used to encrypt          |
//! | `1`       | primary: key new tokens are encrypted with            |
//! | `2..N`    | retiring: still accepted for decryption               |
//! | `N - 1`   | oldest: dropped by the next rotation                  |
//!
//! Consumers try keys in order when decrypting, so a token issued with any
//! key still in the set remains valid for up to `N - 1` more rotations.

use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, BackendResult};
use crate::errors::IntegrityError;
use crate::keygen::KeyGenerator;
use crate::{LocksmithError, Result};

/// Minimum number of keys: staging, primary and one retiring key.
pub const MIN_KEYS: usize = 3;

/// An ordered list of Fernet keys plus rotation metadata.
///
/// Missing fields decode to empty/zero values, which
/// [`check_integrity`](KeySet::check_integrity) then rejects.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySet {
    /// Encoded keys, staging first and oldest last.
    #[serde(default)]
    pub keys: Vec<String>,
    /// Unix time (seconds) of the last rotation or initial creation.
    #[serde(default)]
    pub creation_time: i64,
    /// Intended lifetime of the key set in seconds.
    #[serde(default)]
    pub period: i64,
}

/// Secret document as stored by a backend: the key set under `data`.
#[derive(Serialize, Deserialize)]
struct KeysSecret {
    data: KeySet,
}

impl KeySet {
    /// Create a key set from existing keys.
    pub fn new(keys: Vec<String>, creation_time: i64, period: i64) -> Self {
        Self {
            keys,
            creation_time,
            period,
        }
    }

    /// Create a fresh key set of `num_keys` generated keys.
    pub fn generate(
        generator: &dyn KeyGenerator,
        period: i64,
        num_keys: usize,
        now: i64,
    ) -> Result<Self> {
        if num_keys < MIN_KEYS {
            return Err(IntegrityError::TooFewKeys {
                found: num_keys,
                required: MIN_KEYS,
            }
            .into());
        }
        if period <= 0 {
            return Err(LocksmithError::invalid_config(
                "period",
                "period must be positive",
            ));
        }

        let keys = (0..num_keys)
            .map(|_| generator.generate_key())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(keys, now, period))
    }

    /// Verify the key set is structurally usable.
    pub fn check_integrity(&self) -> std::result::Result<(), IntegrityError> {
        if self.keys.is_empty() {
            return Err(IntegrityError::KeysMissing);
        }
        if self.keys.len() < MIN_KEYS {
            return Err(IntegrityError::TooFewKeys {
                found: self.keys.len(),
                required: MIN_KEYS,
            });
        }
        if self.creation_time == 0 {
            return Err(IntegrityError::MissingCreationTime);
        }
        if self.period == 0 {
            return Err(IntegrityError::MissingPeriod);
        }
        Ok(())
    }

    /// Rotate the key set at time `now`.
    ///
    /// Drops the oldest key, shifts the others down one slot (so the former
    /// staging key becomes primary) and puts a freshly generated key in the
    /// staging slot. `creation_time` becomes `now`; `period` is unchanged.
    ///
    /// The key set is left untouched if it holds fewer than [`MIN_KEYS`]
    /// keys or if key generation fails.
    pub fn rotate(&mut self, generator: &dyn KeyGenerator, now: i64) -> Result<()> {
        if self.keys.len() < MIN_KEYS {
            return Err(IntegrityError::TooFewKeys {
                found: self.keys.len(),
                required: MIN_KEYS,
            }
            .into());
        }

        let staging = generator.generate_key()?;

        self.keys.pop();
        self.keys.insert(0, staging);
        self.creation_time = now;
        Ok(())
    }

    /// The staging key.
    pub fn staging(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    /// The primary key.
    pub fn primary(&self) -> Option<&str> {
        self.keys.get(1).map(String::as_str)
    }

    /// Seconds elapsed since the last rotation.
    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.creation_time)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the key set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySet")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("creation_time", &self.creation_time)
            .field("period", &self.period)
            .finish()
    }
}

/// Decode a backend secret document into a key set.
pub fn decode_document(document: &[u8]) -> BackendResult<KeySet> {
    let secret: KeysSecret = serde_json::from_slice(document)
        .map_err(|e| BackendError::Serialization(format!("Error decoding json: {}", e)))?;
    Ok(secret.data)
}

/// Encode a key set as a backend secret document.
pub fn encode_document(key_set: &KeySet) -> BackendResult<Vec<u8>> {
    Ok(serde_json::to_vec(&KeysSecret {
        data: key_set.clone(),
    })?)
}
