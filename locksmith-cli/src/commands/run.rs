//! Periodic rotation driver

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use locksmith_lib::config::LocksmithConfig;
use tracing::warn;

use super::{locksmith, report_outcome};
use crate::ui;

/// Run cycles every `interval` seconds (default: the TTL) until Ctrl-C
pub async fn run(config: &LocksmithConfig, interval: Option<u64>, verbose: bool) -> Result<()> {
    let every = Duration::from_secs(interval.unwrap_or(config.ttl_secs));

    let locksmith = locksmith(config, verbose)?.on_rotation(Arc::new(report_outcome));

    ui::info(&format!(
        "Checking keys every {}; press Ctrl-C to stop",
        ui::duration(every.as_secs() as i64)
    ));

    let stats = locksmith
        .run_until(every, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    ui::header("Summary");
    ui::key_value("Cycles", &stats.cycles.to_string());
    ui::key_value("Rotations", &stats.rotations.to_string());
    ui::key_value("Failures", &stats.failures.to_string());

    Ok(())
}
