//! CLI command implementations

pub mod init;
pub mod once;
pub mod run;
pub mod status;

use anyhow::{Context, Result};
use locksmith_lib::config::LocksmithConfig;
use locksmith_lib::rotation::{CycleOutcome, Locksmith};
use locksmith_lib::LocksmithError;

use crate::ui;

/// Build a locksmith from validated configuration.
pub fn locksmith(config: &LocksmithConfig, verbose: bool) -> Result<Locksmith> {
    let locksmith = Locksmith::from_config(config).context("Invalid configuration")?;

    if verbose {
        ui::key_value("Key path", locksmith.key_path());
        ui::key_value("TTL", &ui::duration(locksmith.ttl_secs() as i64));
        for backend in locksmith.backends() {
            ui::key_value("Vault", backend.name());
        }
        ui::separator();
    }

    Ok(locksmith)
}

/// Describe the result of one cycle.
pub fn report_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Fresh { status } => {
            ui::info(&format!(
                "Keys are fresh; next rotation at {} (in {})",
                ui::timestamp(status.rotates_at),
                ui::duration(status.secs_until_rotation())
            ));
        }
        CycleOutcome::Rotated {
            creation_time,
            key_count,
            written,
        } => {
            ui::success(&format!(
                "Rotated {} keys at {} in {} vault(s)",
                key_count,
                ui::timestamp(*creation_time),
                written.len()
            ));
        }
    }
}

/// Print operator guidance for errors that need a human.
pub fn explain(e: &LocksmithError) {
    for line in guidance(e) {
        ui::warning(&line);
    }
}

/// Operator guidance for `e`, empty when the next cycle may simply retry.
fn guidance(e: &LocksmithError) -> Vec<String> {
    match e {
        LocksmithError::Write {
            written, pending, ..
        } if !written.is_empty() => vec![
            format!(
                "New keys were written to {} but not to {}",
                written.join(", "),
                pending.join(", ")
            ),
            "Vaults now disagree; reconcile them before the next cycle".to_string(),
        ],
        LocksmithError::Consistency(_) => {
            vec!["Vaults disagree or are missing keys; no changes were made".to_string()]
        }
        LocksmithError::Integrity(_) => {
            vec!["Stored key set is malformed; no changes were made".to_string()]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locksmith_lib::backend::BackendError;
    use locksmith_lib::{ConsistencyError, IntegrityError};

    fn write_error(written: &[&str], pending: &[&str]) -> LocksmithError {
        LocksmithError::Write {
            backend: pending[0].to_string(),
            written: written.iter().map(|s| s.to_string()).collect(),
            pending: pending.iter().map(|s| s.to_string()).collect(),
            source: BackendError::Status {
                status: 500,
                body: String::new(),
            },
        }
    }

    #[test]
    fn test_partial_write_names_both_sides() {
        let lines = guidance(&write_error(&["https://a:8200"], &["https://b:8200"]));

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("written to https://a:8200 but not to https://b:8200"));
    }

    #[test]
    fn test_failed_first_write_needs_no_operator() {
        assert!(guidance(&write_error(&[], &["https://a:8200", "https://b:8200"])).is_empty());
    }

    #[test]
    fn test_refused_cycles_say_nothing_changed() {
        let divergent = LocksmithError::from(ConsistencyError::Divergent {
            reference: "a".into(),
            backends: vec!["b".into()],
        });
        let malformed = LocksmithError::from(IntegrityError::MissingPeriod);

        assert!(guidance(&divergent)[0].contains("no changes were made"));
        assert!(guidance(&malformed)[0].contains("malformed"));
        assert!(guidance(&LocksmithError::Generation("rng".into())).is_empty());
    }
}
