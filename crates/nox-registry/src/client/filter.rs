//! Structural filters applied by search and resolve.

use std::fmt;
use std::sync::Arc;

use crate::track::Track;
use crate::types::{PluginEntry, RiskClass, VersionEntry};

/// Caller-supplied plugin predicate.
pub type PluginPredicate = Arc<dyn Fn(&PluginEntry) -> bool + Send + Sync>;

/// A filter that narrows search and resolve results.
///
/// Filters compose with AND semantics.
#[derive(Clone)]
pub enum PluginFilter {
    /// Plugin is published under this track.
    Track(Track),

    /// Plugin carries every listed tag (case-insensitive).
    Tags(Vec<String>),

    /// Version risk class is at most this. Versions with an unknown risk
    /// class never pass.
    MaxRiskClass(RiskClass),

    Custom(PluginPredicate),
}

impl PluginFilter {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&PluginEntry) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tags(tags.into_iter().map(Into::into).collect())
    }

    /// Plugin-level check. For `MaxRiskClass`, true if any version qualifies.
    pub fn matches_plugin(&self, plugin: &PluginEntry) -> bool {
        match self {
            Self::Track(track) => plugin.track() == Some(*track),
            Self::Tags(tags) => tags.iter().all(|t| plugin.has_tag(t)),
            Self::MaxRiskClass(_) => plugin.versions.iter().any(|v| self.matches_version(v)),
            Self::Custom(f) => f(plugin),
        }
    }

    /// Version-level check. Only `MaxRiskClass` looks at versions.
    pub fn matches_version(&self, version: &VersionEntry) -> bool {
        match self {
            Self::MaxRiskClass(max) => version.risk().is_some_and(|r| r <= *max),
            _ => true,
        }
    }
}

impl fmt::Debug for PluginFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track(t) => f.debug_tuple("Track").field(t).finish(),
            Self::Tags(tags) => f.debug_tuple("Tags").field(tags).finish(),
            Self::MaxRiskClass(r) => f.debug_tuple("MaxRiskClass").field(r).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub(crate) fn plugin_passes(filters: &[PluginFilter], plugin: &PluginEntry) -> bool {
    filters.iter().all(|f| f.matches_plugin(plugin))
}

pub(crate) fn version_passes(filters: &[PluginFilter], version: &VersionEntry) -> bool {
    filters.iter().all(|f| f.matches_version(version))
}
