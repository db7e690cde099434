//! Configuration layering for the CLI.
//!
//! Sources, lowest to highest precedence: built-in defaults, the JSON file
//! given with `--config`, `LOCKSMITH_*` environment variables, then flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use locksmith_lib::config::LocksmithConfig;

/// Settings given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub vaults: Vec<String>,
    pub tokens: Vec<String>,
    pub key_path: Option<String>,
    pub ttl_secs: Option<u64>,
}

/// Load configuration from every source, using the process environment.
pub fn load(overrides: &Overrides) -> Result<LocksmithConfig> {
    resolve(overrides, |name| std::env::var(name).ok())
}

/// Layer `overrides` and the variables from `lookup` over the config file.
///
/// Validation is left to the command, which may still adjust bootstrap
/// settings.
pub fn resolve<F>(overrides: &Overrides, lookup: F) -> Result<LocksmithConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &overrides.config_file {
        Some(path) => LocksmithConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LocksmithConfig::default(),
    };

    config
        .apply_vars(lookup)
        .context("Invalid LOCKSMITH_* environment")?;

    if !overrides.vaults.is_empty() {
        // A token shared by every vault so far carries over to --vault
        // addresses given without --token.
        let tokens = if overrides.tokens.is_empty() {
            shared_token(&config).into_iter().collect()
        } else {
            overrides.tokens.clone()
        };
        config.set_vaults(overrides.vaults.clone(), tokens)?;
    } else if !overrides.tokens.is_empty() {
        config.set_tokens(overrides.tokens.clone())?;
    }

    if let Some(key_path) = &overrides.key_path {
        config.key_path = key_path.clone();
    }
    if let Some(ttl) = overrides.ttl_secs {
        config.ttl_secs = ttl;
    }

    Ok(config)
}

fn shared_token(config: &LocksmithConfig) -> Option<String> {
    let first = &config.vaults.first()?.token;
    if first.is_empty() || config.vaults.iter().any(|v| &v.token != first) {
        return None;
    }
    Some(first.clone())
}
