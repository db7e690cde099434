//! HashiCorp Vault backend.
//!
//! Talks to Vault's KV (version 1) HTTP API:
//! - `GET  {address}/v1/{path}` reads the secret; 404 means nothing stored
//! - `POST {address}/v1/{path}` overwrites the secret with a JSON body
//!
//! Requests authenticate with the `X-Vault-Token` header. Real HTTP
//! requires the `vault-http` feature; without it every call returns
//! [`BackendError::Unavailable`].

use async_trait::async_trait;
#[cfg(feature = "vault-http")]
use std::time::Duration;

use super::{BackendError, BackendResult, KeySetFields, SecretBackend};
use crate::config::VaultConfig;

/// Header carrying the Vault token.
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Vault KV backend.
pub struct VaultBackend {
    config: VaultConfig,
    #[cfg(feature = "vault-http")]
    client: reqwest::Client,
}

impl VaultBackend {
    /// Create a new Vault backend with the given configuration.
    #[cfg(feature = "vault-http")]
    pub fn new(config: VaultConfig) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create a new Vault backend with the given configuration (stub when feature disabled).
    #[cfg(not(feature = "vault-http"))]
    pub fn new(config: VaultConfig) -> BackendResult<Self> {
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Build the full URL for a secret path.
    #[cfg(any(feature = "vault-http", test))]
    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.config.address.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[cfg(feature = "vault-http")]
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.token.is_empty() {
            request
        } else {
            request.header(VAULT_TOKEN_HEADER, &self.config.token)
        }
    }

    /// GET a secret document.
    #[cfg(feature = "vault-http")]
    async fn get_secret(&self, path: &str) -> BackendResult<Option<Vec<u8>>> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(format!("Failed to read response: {}", e)))?;

        Ok(Some(bytes.to_vec()))
    }

    /// GET a secret document (stub when feature disabled).
    #[cfg(not(feature = "vault-http"))]
    async fn get_secret(&self, _path: &str) -> BackendResult<Option<Vec<u8>>> {
        Err(BackendError::Unavailable(
            "Vault HTTP client not compiled - enable the 'vault-http' feature".to_string(),
        ))
    }

    /// POST a secret document.
    #[cfg(feature = "vault-http")]
    async fn put_secret(&self, path: &str, fields: &KeySetFields) -> BackendResult<()> {
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(fields)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// POST a secret document (stub when feature disabled).
    #[cfg(not(feature = "vault-http"))]
    async fn put_secret(&self, _path: &str, _fields: &KeySetFields) -> BackendResult<()> {
        Err(BackendError::Unavailable(
            "Vault HTTP client not compiled - enable the 'vault-http' feature".to_string(),
        ))
    }

    /// Map reqwest errors to BackendError.
    #[cfg(feature = "vault-http")]
    fn map_reqwest_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                timeout_ms: timeout_ms(self.config.timeout_secs),
            }
        } else if e.is_connect() {
            BackendError::ConnectionFailed {
                target: self.config.address.clone(),
                reason: e.to_string(),
            }
        } else {
            BackendError::Transport(format!("Vault request failed: {}", e))
        }
    }
}

/// Timeout in milliseconds for error reporting, saturating on overflow.
#[cfg(any(feature = "vault-http", test))]
fn timeout_ms(timeout_secs: u64) -> u64 {
    timeout_secs.saturating_mul(1000)
}

#[async_trait]
impl SecretBackend for VaultBackend {
    fn name(&self) -> &str {
        &self.config.address
    }

    async fn read(&self, path: &str) -> BackendResult<Option<Vec<u8>>> {
        self.get_secret(path).await
    }

    async fn write(&self, path: &str, fields: &KeySetFields) -> BackendResult<()> {
        self.put_secret(path, fields).await
    }
}
