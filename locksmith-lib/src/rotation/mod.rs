//! Key set rotation.
//!
//! This module runs the rotation cycle against a set of secret backends and
//! decides when a key set is due.
//!
//! # Cycle
//!
//! 1. Read the key set from every backend, in order
//! 2. Verify every backend holds the same key set
//! 3. Check the key set is well formed
//! 4. If due, rotate it and write it back to every backend
//!
//! Any failure aborts the cycle before the next step. A failed write leaves
//! the backends diverged; the next cycle then refuses to act until an
//! operator reconciles them.
//!
//! # Example
//!
//! ```ignore
//! use locksmith_lib::rotation::Locksmith;
//! use locksmith_lib::config::LocksmithConfig;
//!
//! let locksmith = Locksmith::from_config(&config)?;
//!
//! // One cycle
//! let outcome = locksmith.smith().await?;
//!
//! // Or keep cycling until Ctrl-C
//! let stats = locksmith
//!     .run_until(Duration::from_secs(60), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! ```

mod driver;
mod locksmith;
mod schedule;

pub use driver::DriverStats;
pub use locksmith::{CycleOutcome, Locksmith, RotationCallback};
pub use schedule::{rotation_due_at, should_rotate, KeyStatus};
