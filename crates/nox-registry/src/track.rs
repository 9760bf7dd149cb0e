//! Plugin tracks: the functional area a plugin belongs to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Functional track a plugin is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Track {
    CoreAnalysis,
    DynamicRuntime,
    AiSecurity,
    ThreatModeling,
    SupplyChain,
    Intelligence,
    PolicyGovernance,
    IncidentReadiness,
    DeveloperExperience,
    AgentAssistance,
}

/// Catalog entry for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    pub track: Track,
    pub display_name: &'static str,
    pub description: &'static str,
}

static CATALOG: [TrackInfo; 10] = [
    TrackInfo {
        track: Track::CoreAnalysis,
        display_name: "Core Analysis",
        description: "Static analysis of source code, configuration and dependencies",
    },
    TrackInfo {
        track: Track::DynamicRuntime,
        display_name: "Dynamic Runtime",
        description: "Testing of running applications and services",
    },
    TrackInfo {
        track: Track::AiSecurity,
        display_name: "AI Security",
        description: "Security of AI models, prompts and agent integrations",
    },
    TrackInfo {
        track: Track::ThreatModeling,
        display_name: "Threat Modeling",
        description: "Architecture review and attack surface mapping",
    },
    TrackInfo {
        track: Track::SupplyChain,
        display_name: "Supply Chain",
        description: "Dependency provenance, SBOM and vulnerability lookups",
    },
    TrackInfo {
        track: Track::Intelligence,
        display_name: "Intelligence",
        description: "Vulnerability and threat intelligence enrichment",
    },
    TrackInfo {
        track: Track::PolicyGovernance,
        display_name: "Policy & Governance",
        description: "Compliance mapping and policy enforcement",
    },
    TrackInfo {
        track: Track::IncidentReadiness,
        display_name: "Incident Readiness",
        description: "Detection coverage and response preparation",
    },
    TrackInfo {
        track: Track::DeveloperExperience,
        display_name: "Developer Experience",
        description: "Editor, CI and workflow integrations",
    },
    TrackInfo {
        track: Track::AgentAssistance,
        display_name: "Agent Assistance",
        description: "AI-assisted triage and remediation",
    },
];

impl Track {
    /// All tracks in catalog order.
    pub fn all() -> [Track; 10] {
        CATALOG.map(|info| info.track)
    }

    /// Wire name (e.g. `core-analysis`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoreAnalysis => "core-analysis",
            Self::DynamicRuntime => "dynamic-runtime",
            Self::AiSecurity => "ai-security",
            Self::ThreatModeling => "threat-modeling",
            Self::SupplyChain => "supply-chain",
            Self::Intelligence => "intelligence",
            Self::PolicyGovernance => "policy-governance",
            Self::IncidentReadiness => "incident-readiness",
            Self::DeveloperExperience => "developer-experience",
            Self::AgentAssistance => "agent-assistance",
        }
    }

    /// Catalog entry for this track.
    pub fn info(&self) -> &'static TrackInfo {
        // CATALOG is indexed in declaration order.
        &CATALOG[*self as usize]
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }

    pub fn parse(s: &str) -> RegistryResult<Self> {
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RegistryError::validation("track", format!("unknown track {:?}", s)))
    }
}

impl FromStr for Track {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered catalog of every track.
pub fn track_catalog() -> &'static [TrackInfo] {
    &CATALOG
}

/// Whether `s` names a known track.
pub fn valid_track(s: &str) -> bool {
    Track::parse(s).is_ok()
}
