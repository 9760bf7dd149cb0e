//! Trusted public keys, persisted as JSON.
//!
//! ```json
//! { "keys": [{ "name": "nox-release", "fingerprint": "<hex>", "public_key_pem": "..." }] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::signature::{key_fingerprint, parse_public_key};
use crate::error::{RegistryError, RegistryResult};
use crate::io::{read_optional, write_atomic};

/// A trusted signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub name: String,

    /// SHA-256 of the raw public key bytes.
    pub fingerprint: String,

    pub public_key_pem: String,
}

impl Key {
    /// Build a key from a name and PEM, deriving the fingerprint.
    pub fn new(name: impl Into<String>, public_key_pem: impl Into<String>) -> RegistryResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::validation("key", "name is required"));
        }

        let public_key_pem = public_key_pem.into();
        let key = parse_public_key(&public_key_pem)?;

        Ok(Self {
            name,
            fingerprint: key_fingerprint(&key),
            public_key_pem,
        })
    }
}

/// Set of trusted keys, unique by fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyring {
    #[serde(default)]
    keys: Vec<Key>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns false if the fingerprint is already present.
    pub fn add(&mut self, key: Key) -> bool {
        if self.find(&key.fingerprint).is_some() {
            debug!(fingerprint = %key.fingerprint, "key already in keyring");
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn find(&self, fingerprint: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.fingerprint == fingerprint)
    }

    /// Remove and return the key with `fingerprint`.
    pub fn remove(&mut self, fingerprint: &str) -> RegistryResult<Key> {
        let pos = self
            .keys
            .iter()
            .position(|k| k.fingerprint == fingerprint)
            .ok_or_else(|| {
                RegistryError::not_found(format!("key {:?} not in keyring", fingerprint))
            })?;
        Ok(self.keys.remove(pos))
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Load from `path`. A missing file yields an empty keyring.
    pub async fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let Some(data) = read_optional(path).await? else {
            debug!(path = %path.display(), "no keyring file, starting empty");
            return Ok(Self::new());
        };

        serde_json::from_slice(&data).map_err(|e| {
            RegistryError::validation(
                "keyring",
                format!("corrupt keyring at {}: {}", path.display(), e),
            )
        })
    }

    /// Write to `path` atomically, creating parent directories.
    pub async fn save(&self, path: impl AsRef<Path>) -> RegistryResult<()> {
        let path = path.as_ref();
        let data = serde_json::to_vec_pretty(self).map_err(|e| RegistryError::Io {
            message: format!("failed to serialize keyring: {}", e),
        })?;

        write_atomic(path, &data).await?;
        info!(path = %path.display(), keys = self.keys.len(), "saved keyring");
        Ok(())
    }
}
