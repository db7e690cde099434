//! Key set status

use anyhow::Result;
use locksmith_lib::config::LocksmithConfig;

use super::{explain, locksmith};
use crate::ui;

/// Show key set age and next rotation without changing anything
pub async fn run(config: &LocksmithConfig, json: bool, verbose: bool) -> Result<()> {
    let locksmith = locksmith(config, verbose)?;

    let status = match locksmith.status().await {
        Ok(status) => status,
        Err(e) => {
            ui::error(&format!("Cannot read key status: {}", e));
            explain(&e);
            return Err(e.into());
        }
    };

    if json {
        ui::json(&serde_json::to_value(&status)?);
        return Ok(());
    }

    ui::header("Fernet Key Status");
    ui::key_value("Keys", &status.key_count.to_string());
    ui::key_value("Created", &ui::timestamp(status.creation_time));
    ui::key_value("Period", &ui::duration(status.period));
    ui::key_value("Age", &ui::duration(status.age_secs));
    ui::key_value("Next rotation", &ui::timestamp(status.rotates_at));
    ui::separator();

    if status.rotation_due {
        ui::warning("Rotation is due; the next cycle will rotate");
    } else {
        ui::success(&format!(
            "Keys identical in every vault; rotation in {}",
            ui::duration(status.secs_until_rotation())
        ));
    }

    Ok(())
}
