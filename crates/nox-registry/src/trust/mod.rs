//! Artifact trust: digests, signatures, keyrings and policy.
//!
//! A [`Verifier`] combines these into a [`VerifyResult`]. Policy violations
//! are returned as data; callers decide whether they are fatal.

mod keyring;
mod policy;
mod signature;
mod verify;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

pub use keyring::{Key, Keyring};
pub use policy::{TrustPolicy, TrustPreset};
pub use signature::{
    export_key_pem, key_fingerprint, parse_public_key, verify_signature, PKIX_KEY_LABEL,
    RAW_KEY_LABEL,
};
pub use verify::Verifier;

/// How much an artifact is trusted, lowest first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    /// No valid signature.
    #[default]
    Unverified,
    /// Valid signature from a key not in the keyring.
    Community,
    /// Valid signature from a keyring key.
    Verified,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Community => "community",
            Self::Verified => "verified",
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustLevel {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unverified" => Ok(Self::Unverified),
            "community" => Ok(Self::Community),
            "verified" => Ok(Self::Verified),
            _ => Err(RegistryError::validation(
                "trust level",
                format!("unknown trust level {:?}", s),
            )),
        }
    }
}

/// A single failed trust requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("trust violation on {field}: {message}")]
pub struct TrustViolation {
    /// Field that failed (`digest`, `signature`, `trust_level`, `api_version`).
    pub field: String,
    pub message: String,
}

impl TrustViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of verifying one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub trust_level: TrustLevel,
    pub digest_match: bool,
    pub signature_valid: bool,

    /// Fingerprint of the key that produced a valid signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_key: Option<String>,

    /// Keyring name of the signer, when the signer is trusted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_name: Option<String>,

    #[serde(default)]
    pub violations: Vec<TrustViolation>,

    pub verified_at: DateTime<Utc>,
}

impl VerifyResult {
    /// Empty result stamped with the current time.
    pub fn new() -> Self {
        Self {
            trust_level: TrustLevel::Unverified,
            digest_match: false,
            signature_valid: false,
            signer_key: None,
            signer_name: None,
            violations: Vec::new(),
            verified_at: Utc::now(),
        }
    }

    /// No violations and the digest matched.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty() && self.digest_match
    }
}

impl Default for VerifyResult {
    fn default() -> Self {
        Self::new()
    }
}
