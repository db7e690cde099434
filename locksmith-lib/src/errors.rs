//! Error types for key set rotation.
//!
//! Every failure aborts the current rotation cycle and is reported to the
//! caller. Nothing here is retried or repaired internally: the periodic
//! driver runs the next cycle later, and divergent backends need an operator.

use thiserror::Error;

use crate::backend::BackendError;

/// Error codes for reporting and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LocksmithErrorCode {
    /// Key material could not be generated
    Generation = 1000,
    /// Backend read failed or returned a malformed payload
    Read = 2000,
    /// Backend write failed
    Write = 2001,
    /// A backend holds no key set
    NoKeysFound = 3000,
    /// Backends hold different key sets
    Divergent = 3001,
    /// No backends configured
    NoBackends = 3002,
    /// Key list absent or empty
    KeysMissing = 4000,
    /// Fewer keys than the rotation scheme needs
    TooFewKeys = 4001,
    /// Creation time not set
    MissingCreationTime = 4002,
    /// Rotation period not set
    MissingPeriod = 4003,
    /// Bootstrap refused because keys already exist
    AlreadyInitialized = 5000,
    /// Configuration rejected
    InvalidConfig = 6000,
    /// Serialization error
    Serialization = 7000,
}

/// Structural problems with a key set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// The key list is absent or empty.
    #[error("keys list is missing")]
    KeysMissing,

    /// The key list holds fewer keys than staging, primary and one retiring key.
    #[error("not enough keys: found {found}, need at least {required}")]
    TooFewKeys {
        /// Number of keys present
        found: usize,
        /// Minimum number of keys
        required: usize,
    },

    /// `creation_time` is zero.
    #[error("creation time is not set")]
    MissingCreationTime,

    /// `period` is zero.
    #[error("period is not set")]
    MissingPeriod,
}

/// Disagreement between configured backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// No backends were read.
    #[error("no backends configured")]
    NoBackends,

    /// A backend has no key set at the key path.
    #[error("no fernet keys in {backend}")]
    NoKeysFound {
        /// Backend without keys
        backend: String,
    },

    /// One or more backends differ from the reference backend.
    #[error("keys in {} are not identical to keys in {reference}", .backends.join(", "))]
    Divergent {
        /// First configured backend, used as the reference copy
        reference: String,
        /// Backends whose key set differs from the reference
        backends: Vec<String>,
    },
}

/// Crate error type.
#[derive(Debug, Error)]
pub enum LocksmithError {
    /// Generating key material failed.
    #[error("key generation failed: {0}")]
    Generation(String),

    /// Reading or decoding the key set from a backend failed.
    #[error("cannot read keys from {backend}: {source}")]
    Read {
        /// Backend that failed
        backend: String,
        /// Underlying backend error
        source: BackendError,
    },

    /// Backends are missing keys or disagree.
    #[error("doing nothing: {0}")]
    Consistency(#[from] ConsistencyError),

    /// The key set is structurally invalid.
    #[error("doing nothing: keys have wrong format: {0}")]
    Integrity(#[from] IntegrityError),

    /// A backend rejected the rotated key set.
    ///
    /// Backends in `written` already hold the new key set, backends in
    /// `pending` still hold the previous one.
    #[error(
        "rotation failed writing to {backend} (written: [{}], not written: [{}]): {source}",
        .written.join(", "),
        .pending.join(", ")
    )]
    Write {
        /// Backend whose write failed
        backend: String,
        /// Backends written before the failure
        written: Vec<String>,
        /// Backends not written, including the failing one
        pending: Vec<String>,
        /// Underlying backend error
        source: BackendError,
    },

    /// Bootstrap found an existing key set.
    #[error("{backend} already holds a key set")]
    AlreadyInitialized {
        /// Backend that already holds keys
        backend: String,
    },

    /// Configuration rejected.
    #[error("invalid configuration {field}: {reason}")]
    InvalidConfig {
        /// Offending field
        field: String,
        /// Reason for rejection
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LocksmithError {
    /// Get the error code.
    pub fn code(&self) -> LocksmithErrorCode {
        match self {
            Self::Generation(_) => LocksmithErrorCode::Generation,
            Self::Read { .. } => LocksmithErrorCode::Read,
            Self::Consistency(ConsistencyError::Divergent { .. }) => LocksmithErrorCode::Divergent,
            Self::Consistency(ConsistencyError::NoKeysFound { .. }) => {
                LocksmithErrorCode::NoKeysFound
            }
            Self::Consistency(ConsistencyError::NoBackends) => LocksmithErrorCode::NoBackends,
            Self::Integrity(IntegrityError::KeysMissing) => LocksmithErrorCode::KeysMissing,
            Self::Integrity(IntegrityError::TooFewKeys { .. }) => LocksmithErrorCode::TooFewKeys,
            Self::Integrity(IntegrityError::MissingCreationTime) => {
                LocksmithErrorCode::MissingCreationTime
            }
            Self::Integrity(IntegrityError::MissingPeriod) => LocksmithErrorCode::MissingPeriod,
            Self::Write { .. } => LocksmithErrorCode::Write,
            Self::AlreadyInitialized { .. } => LocksmithErrorCode::AlreadyInitialized,
            Self::InvalidConfig { .. } => LocksmithErrorCode::InvalidConfig,
            Self::Serialization(_) => LocksmithErrorCode::Serialization,
        }
    }

    /// Returns true if running the next cycle may succeed without operator action.
    ///
    /// A write failure is only retryable when nothing was written, since
    /// otherwise the backends are now divergent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(_) | Self::Read { .. } => true,
            Self::Write { written, .. } => written.is_empty(),
            _ => false,
        }
    }

    /// The backend the error is attributed to, if any.
    pub fn backend(&self) -> Option<&str> {
        match self {
            Self::Read { backend, .. }
            | Self::Write { backend, .. }
            | Self::AlreadyInitialized { backend } => Some(backend),
            Self::Consistency(ConsistencyError::NoKeysFound { backend }) => Some(backend),
            _ => None,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LocksmithError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
