//! Periodic driver for the rotation cycle.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::locksmith::Locksmith;
use crate::{LocksmithError, Result};

/// Counters from a [`Locksmith::run_until`] session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub cycles: u64,
    pub rotations: u64,
    pub failures: u64,
}

impl Locksmith {
    /// Run a cycle every `every` until `shutdown` completes.
    ///
    /// The first cycle runs immediately. A failed cycle is logged and the
    /// driver keeps going; the next tick starts from a fresh read. A cycle in
    /// progress is never interrupted, and cycles never overlap: a slow cycle
    /// delays the following tick instead of bunching ticks up.
    pub async fn run_until<F>(&self, every: Duration, shutdown: F) -> Result<DriverStats>
    where
        F: Future<Output = ()>,
    {
        if every.is_zero() {
            return Err(LocksmithError::invalid_config(
                "interval",
                "interval must be greater than zero",
            ));
        }

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut stats = DriverStats::default();
        info!(interval_secs = every.as_secs(), "Starting rotation driver");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(
                        cycles = stats.cycles,
                        rotations = stats.rotations,
                        failures = stats.failures,
                        "Stopping rotation driver"
                    );
                    return Ok(stats);
                }
                _ = ticker.tick() => {
                    stats.cycles += 1;
                    match self.smith().await {
                        Ok(outcome) => {
                            if outcome.is_rotated() {
                                stats.rotations += 1;
                            }
                        }
                        Err(e) => {
                            stats.failures += 1;
                            error!(code = ?e.code(), error = %e, "Rotation cycle failed");
                        }
                    }
                }
            }
        }
    }
}
