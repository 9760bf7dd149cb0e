//! Registry index document and its entries.
//!
//! This is the JSON a registry source publishes:
//!
//! ```json
//! {
//!   "schema_version": "1",
//!   "generated_at": "2026-02-08T00:00:00Z",
//!   "plugins": [{ "name": "nox/dast", "versions": [{ "version": "1.0.0", ... }] }]
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RegistryError, RegistryResult};
use crate::track::{Track, TrackInfo};
use crate::version::Version;

/// A registry endpoint serving an index document.
///
/// Sources are unique by URL; the name is only a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    /// Label (e.g. "official", "enterprise").
    pub name: String,

    /// Index URL.
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Source named after the URL's hostname.
    pub fn from_url(raw: &str) -> RegistryResult<Self> {
        let parsed = Url::parse(raw)
            .map_err(|e| RegistryError::validation("source url", format!("{:?}: {}", raw, e)))?;
        let host = parsed.host_str().ok_or_else(|| {
            RegistryError::validation(
                "source url",
                format!("cannot derive a name from {:?}", raw),
            )
        })?;
        Ok(Self::new(host, raw))
    }
}

/// Top-level index document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
}

impl Index {
    /// Plugin entry by exact name.
    pub fn plugin(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|p| p.name == name)
    }
}

/// A plugin offered by a registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    /// Unique within an index (e.g. "nox/sast").
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage: String,

    /// Track wire name; kept as text so unknown tracks still parse.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub track: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

impl PluginEntry {
    /// Parsed track, if set and known.
    pub fn track(&self) -> Option<Track> {
        Track::parse(&self.track).ok()
    }

    /// Catalog entry for the plugin's track.
    pub fn track_info(&self) -> Option<&'static TrackInfo> {
        self.track().map(|t| t.info())
    }

    /// Highest version entry whose version string parses.
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions
            .iter()
            .filter_map(|ve| ve.parsed_version().map(|v| (v, ve)))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, ve)| ve)
    }

    /// Whether the plugin carries `tag` (ASCII case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A published version of a plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,

    #[serde(default)]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// Content digest (sha256:...).
    #[serde(default)]
    pub digest: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,

    /// Declared risk class (passive, active, runtime).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub risk_class: String,

    /// Minimum tool version able to host this plugin.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_tool_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub changelog_url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PlatformArtifact>,

    /// Base64 Ed25519 signature over the artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Base64 of the signer's PEM public key, as registries publish it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_key_pem: Option<String>,
}

impl VersionEntry {
    /// Parsed version, `None` if the string is malformed.
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }

    /// Parsed risk class, `None` if absent or unknown.
    pub fn risk(&self) -> Option<RiskClass> {
        self.risk_class.parse().ok()
    }

    /// First artifact built for `os`/`arch`.
    pub fn artifact_for(&self, os: &str, arch: &str) -> RegistryResult<&PlatformArtifact> {
        self.artifacts
            .iter()
            .find(|a| a.os == os && a.arch == arch)
            .ok_or_else(|| {
                RegistryError::not_found(format!(
                    "no artifact for {}/{} in version {}",
                    os, arch, self.version
                ))
            })
    }

    /// Decoded signature bytes, if a signature is published.
    pub fn signature_bytes(&self) -> RegistryResult<Option<Vec<u8>>> {
        self.signature
            .as_deref()
            .map(|s| {
                BASE64
                    .decode(s)
                    .map_err(|e| RegistryError::validation("signature", e.to_string()))
            })
            .transpose()
    }

    /// Decoded signer PEM, if a signer key is published.
    pub fn signer_key(&self) -> RegistryResult<Option<String>> {
        self.signer_key_pem
            .as_deref()
            .map(|s| {
                let bytes = BASE64
                    .decode(s)
                    .map_err(|e| RegistryError::validation("signer key", e.to_string()))?;
                String::from_utf8(bytes).map_err(|_| {
                    RegistryError::validation("signer key", "decoded key is not UTF-8 PEM")
                })
            })
            .transpose()
    }
}

/// A platform-specific binary for a plugin version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformArtifact {
    pub os: String,
    pub arch: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
}

/// Declared blast radius of a plugin version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskClass {
    /// Read-only analysis.
    Passive,
    /// May modify files or state.
    Active,
    /// May execute arbitrary code.
    Runtime,
}

impl RiskClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passive => "passive",
            Self::Active => "active",
            Self::Runtime => "runtime",
        }
    }
}

impl FromStr for RiskClass {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passive" => Ok(Self::Passive),
            "active" => Ok(Self::Active),
            "runtime" => Ok(Self::Runtime),
            _ => Err(RegistryError::validation(
                "risk class",
                format!("unknown risk class {:?}", s),
            )),
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
