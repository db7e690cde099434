//! Fernet key generation.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::{LocksmithError, Result};

/// Raw length of a Fernet key: 16 bytes signing key + 16 bytes encryption key.
pub const FERNET_KEY_LEN: usize = 32;

/// Source of new key material.
///
/// Each call returns one opaque, URL-safe encoded key string.
pub trait KeyGenerator: Send + Sync {
    /// Generate a new encoded key.
    fn generate_key(&self) -> Result<String>;
}

/// Generates Fernet keys from the operating system CSPRNG.
///
/// Keys are 32 random bytes encoded as URL-safe base64 with padding,
/// the format Fernet implementations accept.
#[derive(Clone, Copy, Debug, Default)]
pub struct FernetKeyGenerator;

impl KeyGenerator for FernetKeyGenerator {
    fn generate_key(&self) -> Result<String> {
        let mut raw = Zeroizing::new([0u8; FERNET_KEY_LEN]);
        OsRng
            .try_fill_bytes(&mut raw[..])
            .map_err(|e| LocksmithError::Generation(format!("OS random source failed: {}", e)))?;

        Ok(URL_SAFE.encode(&raw[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fernet_key_format() {
        let key = FernetKeyGenerator.generate_key().unwrap();

        assert_eq!(key.len(), 44);
        assert!(!key.contains('+'));
        assert!(!key.contains('/'));

        let decoded = URL_SAFE.decode(&key).unwrap();
        assert_eq!(decoded.len(), FERNET_KEY_LEN);
    }

    #[test]
    fn test_keys_are_unique() {
        let a = FernetKeyGenerator.generate_key().unwrap();
        let b = FernetKeyGenerator.generate_key().unwrap();
        assert_ne!(a, b);
    }
}
