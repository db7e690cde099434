//! Locksmith library.
//!
//! Rotates a Fernet key set that is replicated across several secret stores,
//! keeping every copy identical. Consumers read the key set from their local
//! store and use the keys in order: index 0 is staging, index 1 is primary
//! and the rest are retiring keys still accepted for decryption.
//!
//! # Features
//!
//! - **Consistency first**: nothing is written unless every backend agrees
//! - **Age-based schedule**: rotation starts a TTL ahead of nominal expiry
//! - **Pluggable backends**: Vault KV over HTTP, or in-memory for tests
//!
//! # Example
//!
//! ```ignore
//! use locksmith_lib::prelude::*;
//!
//! let mut config = LocksmithConfig::default();
//! config.apply_env()?;
//!
//! let locksmith = Locksmith::from_config(&config)?;
//! match locksmith.smith().await? {
//!     CycleOutcome::Fresh { status } => println!("next rotation at {}", status.rotates_at),
//!     CycleOutcome::Rotated { written, .. } => println!("rotated in {} vaults", written.len()),
//! }
//! ```

pub mod backend;
pub mod clock;
pub mod config;
pub mod consistency;
pub mod errors;
pub mod keygen;
pub mod keyset;
pub mod prelude;
pub mod rotation;
pub mod store;

pub use errors::{ConsistencyError, IntegrityError, LocksmithError, LocksmithErrorCode};
pub use keyset::{KeySet, MIN_KEYS};

/// Common result alias for locksmith operations.
pub type Result<T> = std::result::Result<T, LocksmithError>;
