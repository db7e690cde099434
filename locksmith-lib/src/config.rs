//! Configuration for the locksmith.
//!
//! # Sources
//!
//! Lowest to highest precedence:
//! 1. Built-in defaults
//! 2. A JSON config file ([`LocksmithConfig::from_file`])
//! 3. Environment variables ([`LocksmithConfig::apply_env`])
//! 4. Explicit overrides from the caller (CLI flags)
//!
//! # Environment Variables
//!
//! - `LOCKSMITH_VAULT_ADDRS` - Comma separated Vault addresses
//! - `LOCKSMITH_VAULT_TOKENS` - Comma separated tokens, paired with addresses
//!   by position; a single token is shared by every address
//! - `LOCKSMITH_KEY_PATH` - Secret path holding the key set
//! - `LOCKSMITH_TTL` - Safety margin and write TTL, in seconds
//!
//! # Example
//!
//! ```
//! use locksmith_lib::config::LocksmithConfig;
//!
//! let mut config = LocksmithConfig::default();
//! config
//!     .set_vaults(
//!         vec!["https://vault-a:8200".into(), "https://vault-b:8200".into()],
//!         vec!["s.token".into()],
//!     )
//!     .unwrap();
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::keyset::MIN_KEYS;
use crate::{LocksmithError, Result};

/// Environment variable holding Vault addresses.
pub const ENV_VAULT_ADDRS: &str = "LOCKSMITH_VAULT_ADDRS";
/// Environment variable holding Vault tokens.
pub const ENV_VAULT_TOKENS: &str = "LOCKSMITH_VAULT_TOKENS";
/// Environment variable holding the key path.
pub const ENV_KEY_PATH: &str = "LOCKSMITH_KEY_PATH";
/// Environment variable holding the TTL in seconds.
pub const ENV_TTL: &str = "LOCKSMITH_TTL";

/// Connection settings for one Vault server.
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Server address (e.g., "https://vault.example.com:8200").
    pub address: String,

    /// Token sent as `X-Vault-Token`.
    #[serde(default)]
    pub token: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl VaultConfig {
    /// Create a new Vault configuration.
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            timeout_secs: default_timeout(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocksmithConfig {
    /// Vault servers, in the order they are read and written.
    #[serde(default)]
    pub vaults: Vec<VaultConfig>,

    /// Secret path holding the key set.
    #[serde(default = "default_key_path")]
    pub key_path: String,

    /// Safety margin before nominal expiry, also written as the secret TTL.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// Rotation period for newly bootstrapped key sets.
    #[serde(default = "default_period")]
    pub period_secs: u64,

    /// Number of keys in newly bootstrapped key sets.
    #[serde(default = "default_num_keys")]
    pub num_keys: usize,
}

fn default_key_path() -> String {
    "secret/fernet-keys".to_string()
}

fn default_ttl() -> u64 {
    120
}

fn default_period() -> u64 {
    3600
}

fn default_num_keys() -> usize {
    MIN_KEYS
}

impl Default for LocksmithConfig {
    fn default() -> Self {
        Self {
            vaults: Vec::new(),
            key_path: default_key_path(),
            ttl_secs: default_ttl(),
            period_secs: default_period(),
            num_keys: default_num_keys(),
        }
    }
}

impl LocksmithConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LocksmithError::invalid_config("config file", format!("{}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addresses = lookup(ENV_VAULT_ADDRS).map(|v| split_list(&v));
        let tokens = lookup(ENV_VAULT_TOKENS).map(|v| split_list(&v));

        match (addresses, tokens) {
            (Some(addresses), tokens) => self.set_vaults(addresses, tokens.unwrap_or_default())?,
            (None, Some(tokens)) => self.set_tokens(tokens)?,
            (None, None) => {}
        }

        if let Some(path) = lookup(ENV_KEY_PATH) {
            self.key_path = path;
        }

        if let Some(ttl) = lookup(ENV_TTL) {
            self.ttl_secs = ttl.trim().parse().map_err(|_| {
                LocksmithError::invalid_config(ENV_TTL, format!("not a number of seconds: {}", ttl))
            })?;
        }

        Ok(())
    }

    /// Replace the configured Vault servers.
    ///
    /// `tokens` pair with `addresses` by position. An empty list leaves every
    /// token empty and a single token is shared by all addresses.
    pub fn set_vaults(&mut self, addresses: Vec<String>, tokens: Vec<String>) -> Result<()> {
        let timeout = self
            .vaults
            .first()
            .map(|v| v.timeout_secs)
            .unwrap_or_else(default_timeout);

        self.vaults = addresses
            .into_iter()
            .map(|address| VaultConfig::new(address, String::new()).with_timeout(timeout))
            .collect();

        if tokens.is_empty() {
            Ok(())
        } else {
            self.set_tokens(tokens)
        }
    }

    /// Assign tokens to the configured Vault servers by position.
    pub fn set_tokens(&mut self, tokens: Vec<String>) -> Result<()> {
        match tokens.len() {
            1 => {
                for vault in &mut self.vaults {
                    vault.token = tokens[0].clone();
                }
            }
            n if n == self.vaults.len() => {
                for (vault, token) in self.vaults.iter_mut().zip(tokens) {
                    vault.token = token;
                }
            }
            n => {
                return Err(LocksmithError::invalid_config(
                    "tokens",
                    format!("{} tokens for {} vault addresses", n, self.vaults.len()),
                ))
            }
        }
        Ok(())
    }

    /// Check the settings every rotation cycle depends on.
    pub fn validate(&self) -> Result<()> {
        if self.vaults.is_empty() {
            return Err(LocksmithError::invalid_config(
                "vaults",
                "at least one vault address is required",
            ));
        }
        if let Some(vault) = self.vaults.iter().find(|v| v.address.trim().is_empty()) {
            return Err(LocksmithError::invalid_config(
                "vaults",
                format!("empty address (token set: {})", !vault.token.is_empty()),
            ));
        }
        if self.key_path.trim().is_empty() {
            return Err(LocksmithError::invalid_config(
                "key_path",
                "key path cannot be empty",
            ));
        }
        if self.ttl_secs == 0 {
            return Err(LocksmithError::invalid_config(
                "ttl_secs",
                "TTL must be positive",
            ));
        }
        Ok(())
    }

    /// Check the settings used to create a new key set.
    ///
    /// Only bootstrap needs these; rotation cycles schedule against the
    /// period stored in the key set itself.
    pub fn validate_bootstrap(&self) -> Result<()> {
        self.validate()?;
        if self.period_secs <= self.ttl_secs {
            return Err(LocksmithError::invalid_config(
                "period_secs",
                format!(
                    "period ({}s) must be longer than the TTL ({}s)",
                    self.period_secs, self.ttl_secs
                ),
            ));
        }
        if self.num_keys < MIN_KEYS {
            return Err(LocksmithError::invalid_config(
                "num_keys",
                format!("at least {} keys are required", MIN_KEYS),
            ));
        }
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn with_vaults(n: usize) -> LocksmithConfig {
        let mut config = LocksmithConfig::default();
        config
            .set_vaults(
                (0..n).map(|i| format!("https://vault-{}:8200", i)).collect(),
                vec![],
            )
            .unwrap();
        config
    }

    #[test]
    fn test_defaults() {
        let config = LocksmithConfig::default();
        assert_eq!(config.key_path, "secret/fernet-keys");
        assert_eq!(config.ttl_secs, 120);
        assert_eq!(config.period_secs, 3600);
        assert_eq!(config.num_keys, 3);
        assert!(config.vaults.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LocksmithConfig::default();
        config
            .apply_vars(vars(&[
                (ENV_VAULT_ADDRS, "https://a:8200, https://b:8200"),
                (ENV_VAULT_TOKENS, "tok-a,tok-b"),
                (ENV_KEY_PATH, "secret/app/fernet"),
                (ENV_TTL, "300"),
            ]))
            .unwrap();

        assert_eq!(config.vaults.len(), 2);
        assert_eq!(config.vaults[0].address, "https://a:8200");
        assert_eq!(config.vaults[1].token, "tok-b");
        assert_eq!(config.key_path, "secret/app/fernet");
        assert_eq!(config.ttl_secs, 300);
    }

    #[test]
    fn test_single_token_is_shared() {
        let mut config = with_vaults(3);
        config.set_tokens(vec!["shared".into()]).unwrap();
        assert!(config.vaults.iter().all(|v| v.token == "shared"));
    }

    #[test]
    fn test_token_count_mismatch() {
        let mut config = with_vaults(3);
        let err = config
            .set_tokens(vec!["a".into(), "b".into()])
            .unwrap_err();
        assert!(err.to_string().contains("2 tokens for 3 vault addresses"));
    }

    #[test]
    fn test_bad_ttl_in_env() {
        let mut config = LocksmithConfig::default();
        let result = config.apply_vars(vars(&[(ENV_TTL, "two minutes")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(LocksmithConfig::default().validate().is_err());

        let config = with_vaults(1);
        assert!(config.validate().is_ok());

        let mut config = with_vaults(1);
        config.ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = with_vaults(1);
        config.key_path = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_beyond_bootstrap_period_is_valid_for_cycles() {
        let mut config = LocksmithConfig::default();
        config
            .apply_vars(vars(&[
                (ENV_VAULT_ADDRS, "https://a:8200,https://b:8200"),
                (ENV_VAULT_TOKENS, "t"),
                (ENV_TTL, "7200"),
            ]))
            .unwrap();

        assert!(config.validate().is_ok());
        assert!(config.validate_bootstrap().is_err());
    }

    #[test]
    fn test_validate_bootstrap() {
        assert!(with_vaults(1).validate_bootstrap().is_ok());
        assert!(LocksmithConfig::default().validate_bootstrap().is_err());

        let mut config = with_vaults(1);
        config.period_secs = config.ttl_secs;
        assert!(config.validate_bootstrap().is_err());

        let mut config = with_vaults(1);
        config.num_keys = 2;
        assert!(config.validate().is_ok());
        assert!(config.validate_bootstrap().is_err());
    }

    #[test]
    fn test_json_with_defaults() {
        let config: LocksmithConfig = serde_json::from_str(
            r#"{"vaults": [{"address": "https://a:8200", "token": "t"}], "ttl_secs": 60}"#,
        )
        .unwrap();

        assert_eq!(config.vaults[0].timeout_secs, 30);
        assert_eq!(config.ttl_secs, 60);
        assert_eq!(config.key_path, "secret/fernet-keys");
    }

    #[test]
    fn test_debug_redacts_token() {
        let vault = VaultConfig::new("https://a:8200", "s.very-secret");
        let debug = format!("{:?}", vault);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
