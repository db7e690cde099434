//! Key set bootstrap

use anyhow::{Context, Result};
use locksmith_lib::config::LocksmithConfig;
use locksmith_lib::LocksmithError;

use super::{explain, locksmith};
use crate::ui;

/// Create the first key set in every vault
pub async fn run(
    config: &LocksmithConfig,
    period: Option<u64>,
    num_keys: Option<usize>,
    verbose: bool,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(period) = period {
        config.period_secs = period;
    }
    if let Some(num_keys) = num_keys {
        config.num_keys = num_keys;
    }

    config
        .validate_bootstrap()
        .context("Invalid bootstrap settings")?;
    let locksmith = locksmith(&config, verbose)?;

    match locksmith.bootstrap(config.period_secs, config.num_keys).await {
        Ok(status) => {
            ui::success(&format!(
                "Created {} keys in {} vault(s)",
                status.key_count,
                locksmith.backends().len()
            ));
            ui::key_value("Next rotation", &ui::timestamp(status.rotates_at));
            Ok(())
        }
        Err(LocksmithError::AlreadyInitialized { backend }) => {
            ui::warning(&format!("{} already holds a key set", backend));
            ui::info("Nothing was written; use `status` to inspect the existing keys");
            Err(LocksmithError::AlreadyInitialized { backend }).context("Bootstrap refused")
        }
        Err(e) => {
            ui::error(&format!("Bootstrap failed: {}", e));
            explain(&e);
            Err(e.into())
        }
    }
}
