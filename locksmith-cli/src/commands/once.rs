//! Single rotation cycle

use anyhow::Result;
use locksmith_lib::config::LocksmithConfig;

use super::{explain, locksmith, report_outcome};
use crate::ui;

/// Run one cycle and report the outcome
pub async fn run(config: &LocksmithConfig, verbose: bool) -> Result<()> {
    let locksmith = locksmith(config, verbose)?;

    match locksmith.smith().await {
        Ok(outcome) => {
            report_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            ui::error(&format!("Rotation cycle failed: {}", e));
            explain(&e);
            Err(e.into())
        }
    }
}
