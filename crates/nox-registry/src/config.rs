//! Persisted registry settings (YAML).
//!
//! ```yaml
//! sources:
//!   - name: official
//!     url: https://registry.nox.dev/index.json
//! cache_ttl_secs: 3600
//! timeout_secs: 30
//! keyring_path: /home/me/.nox/trust/keyring.json
//! trust_preset: enterprise
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ClientConfig, RegistryClient, DEFAULT_CACHE_TTL, DEFAULT_HTTP_TIMEOUT};
use crate::error::{RegistryError, RegistryResult};
use crate::io::{read_optional, write_atomic};
use crate::trust::{Keyring, TrustPolicy, TrustPreset, Verifier};
use crate::types::Source;

/// Registry settings as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Sources in priority order.
    #[serde(default)]
    pub sources: Vec<Source>,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Keyring file; no keys are trusted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyring_path: Option<PathBuf>,

    #[serde(default)]
    pub trust_preset: TrustPreset,
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT.as_secs()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            cache_ttl_secs: default_cache_ttl_secs(),
            timeout_secs: default_timeout_secs(),
            keyring_path: None,
            trust_preset: TrustPreset::default(),
        }
    }
}

impl RegistrySettings {
    /// Load from `path`; a missing file yields defaults.
    pub async fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let Some(data) = read_optional(path).await? else {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        };

        serde_yaml::from_slice(&data).map_err(|e| {
            RegistryError::validation("settings", format!("{}: {}", path.display(), e))
        })
    }

    /// Write to `path` atomically, creating parent directories.
    pub async fn save(&self, path: impl AsRef<Path>) -> RegistryResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|e| RegistryError::Io {
            message: format!("failed to serialize settings: {}", e),
        })?;
        write_atomic(path.as_ref(), yaml.as_bytes()).await
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_trust_preset(mut self, preset: TrustPreset) -> Self {
        self.trust_preset = preset;
        self
    }

    pub fn with_keyring_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.keyring_path = Some(path.into());
        self
    }

    pub fn client_config(&self, cache_dir: impl Into<PathBuf>) -> ClientConfig {
        ClientConfig::new(cache_dir)
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs))
            .with_http_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub fn trust_policy(&self) -> TrustPolicy {
        TrustPolicy::from_preset(self.trust_preset)
    }

    /// Client with every persisted source registered.
    pub fn build_client(&self, cache_dir: impl Into<PathBuf>) -> RegistryResult<RegistryClient> {
        let mut client = RegistryClient::new(self.client_config(cache_dir))?;
        for source in &self.sources {
            client.add_source(source.clone())?;
        }
        Ok(client)
    }

    /// Verifier over the configured keyring and trust preset.
    pub async fn build_verifier(&self) -> RegistryResult<Verifier> {
        let keyring = match &self.keyring_path {
            Some(path) => Keyring::load(path).await?,
            None => Keyring::new(),
        };
        Ok(Verifier::new(keyring, self.trust_policy()))
    }
}
