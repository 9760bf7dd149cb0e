//! Trust policy: minimum trust, digest requirement and allowed API versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{TrustLevel, TrustViolation, VerifyResult};
use crate::error::RegistryError;

/// Plugin API version every preset accepts.
const API_V1: &str = "v1";

/// Named policy presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustPreset {
    #[default]
    Default,
    Enterprise,
    Permissive,
}

impl TrustPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Enterprise => "enterprise",
            Self::Permissive => "permissive",
        }
    }
}

impl fmt::Display for TrustPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustPreset {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "enterprise" => Ok(Self::Enterprise),
            "permissive" => Ok(Self::Permissive),
            _ => Err(RegistryError::validation(
                "trust preset",
                format!("unknown preset {:?}", s),
            )),
        }
    }
}

/// Requirements a verified artifact must meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicy {
    pub min_trust_level: TrustLevel,
    pub require_digest: bool,
    pub allowed_api_versions: Vec<String>,
}

impl TrustPolicy {
    /// Community trust, digest required.
    pub fn default_policy() -> Self {
        Self {
            min_trust_level: TrustLevel::Community,
            require_digest: true,
            allowed_api_versions: vec![API_V1.to_string()],
        }
    }

    /// Verified trust, digest required.
    pub fn enterprise() -> Self {
        Self {
            min_trust_level: TrustLevel::Verified,
            ..Self::default_policy()
        }
    }

    /// Anything goes except unknown API versions.
    pub fn permissive() -> Self {
        Self {
            min_trust_level: TrustLevel::Unverified,
            require_digest: false,
            ..Self::default_policy()
        }
    }

    pub fn from_preset(preset: TrustPreset) -> Self {
        match preset {
            TrustPreset::Default => Self::default_policy(),
            TrustPreset::Enterprise => Self::enterprise(),
            TrustPreset::Permissive => Self::permissive(),
        }
    }

    /// Violations for an empty or disallowed API version.
    pub fn check_api_version(&self, api_version: &str) -> Vec<TrustViolation> {
        if api_version.is_empty() {
            return vec![TrustViolation::new("api_version", "API version is empty")];
        }

        if self.allowed_api_versions.iter().any(|v| v == api_version) {
            return Vec::new();
        }

        vec![TrustViolation::new(
            "api_version",
            format!(
                "API version {:?} not in allowed versions {:?}",
                api_version, self.allowed_api_versions
            ),
        )]
    }

    /// Every violation of this policy by `result`, not just the first.
    pub fn enforce(&self, result: &VerifyResult) -> Vec<TrustViolation> {
        let mut violations = Vec::new();

        if self.require_digest && !result.digest_match {
            violations.push(TrustViolation::new(
                "digest",
                "digest verification failed but policy requires it",
            ));
        }

        if result.trust_level < self.min_trust_level {
            violations.push(TrustViolation::new(
                "trust_level",
                format!(
                    "trust level {:?} is below minimum {:?}",
                    result.trust_level.as_str(),
                    self.min_trust_level.as_str()
                ),
            ));
        }

        violations
    }
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}
