//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use locksmith_lib::prelude::*;
//! ```

// Key sets
pub use crate::keyset::{KeySet, MIN_KEYS};

// Error handling
pub use crate::errors::{ConsistencyError, IntegrityError, LocksmithError, LocksmithErrorCode};
pub use crate::Result;

// Backends
pub use crate::backend::{BackendError, InMemoryBackend, SecretBackend, VaultBackend};

// Rotation
pub use crate::rotation::{CycleOutcome, DriverStats, KeyStatus, Locksmith};

// Configuration
pub use crate::config::{LocksmithConfig, VaultConfig};

// Injection points
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::keygen::{FernetKeyGenerator, KeyGenerator};
