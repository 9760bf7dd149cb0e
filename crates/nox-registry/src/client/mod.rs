//! Multi-source registry client.
//!
//! Each source's index is acquired cache-first:
//! 1. fresh cache entry that decodes: use it
//! 2. otherwise fetch live and re-cache
//! 3. fetch failed: fall back to any cached copy, even a stale one
//!
//! Search, resolve and info tolerate failing sources as long as one source
//! yields an index.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info, warn};

use crate::cache::IndexCache;
use crate::error::{RegistryError, RegistryResult, SourceError};
use crate::types::{Index, PluginEntry, Source, VersionEntry};
use crate::version::{Constraint, Version};

mod filter;
mod http;

pub use filter::{PluginFilter, PluginPredicate};

use filter::{plugin_passes, version_passes};
use http::HttpBackend;

const USER_AGENT_VALUE: &str = concat!("nox-registry/", env!("CARGO_PKG_VERSION"));

/// Default cache TTL (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default HTTP timeout (30 seconds).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default index size limit (10 MiB).
pub const DEFAULT_MAX_INDEX_BYTES: u64 = 10 * 1024 * 1024;

/// Index schema versions accepted by default.
pub const DEFAULT_SUPPORTED_SCHEMAS: [&str; 1] = ["1"];

/// Client configuration. The cache directory is always explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,
    pub max_index_bytes: u64,
    pub supported_schemas: Vec<String>,
}

impl ClientConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            max_index_bytes: DEFAULT_MAX_INDEX_BYTES,
            supported_schemas: DEFAULT_SUPPORTED_SCHEMAS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_max_index_bytes(mut self, max: u64) -> Self {
        self.max_index_bytes = max;
        self
    }

    pub fn with_supported_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_schemas = schemas.into_iter().map(Into::into).collect();
        self
    }
}

/// Client over an ordered list of registry sources.
///
/// Source mutation takes `&mut self`; lookups take `&self` and may run
/// concurrently.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    sources: Vec<Source>,
    cache: IndexCache,
    http: HttpBackend,
}

impl RegistryClient {
    /// Build a client with its own HTTP transport.
    pub fn new(config: ClientConfig) -> RegistryResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| RegistryError::Transport {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self::with_http_client(config, client))
    }

    /// Build a client over a caller-supplied transport.
    ///
    /// The transport's own timeout applies; `config.http_timeout` is unused.
    pub fn with_http_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self {
            sources: Vec::new(),
            cache: IndexCache::new(config.cache_dir, config.cache_ttl),
            http: HttpBackend {
                client,
                max_index_bytes: config.max_index_bytes,
                supported_schemas: config.supported_schemas,
            },
        }
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Add a source. A source whose URL is already registered is ignored.
    pub fn add_source(&mut self, source: Source) -> RegistryResult<()> {
        if source.name.is_empty() {
            return Err(RegistryError::validation("source", "name is required"));
        }
        if source.url.is_empty() {
            return Err(RegistryError::validation("source", "url is required"));
        }

        if self.sources.iter().any(|s| s.url == source.url) {
            debug!(url = %source.url, "source already registered");
            return Ok(());
        }

        self.sources.push(source);
        Ok(())
    }

    /// Remove the first source named `name`.
    pub fn remove_source(&mut self, name: &str) -> RegistryResult<Source> {
        let pos = self
            .sources
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| RegistryError::not_found(format!("source {:?}", name)))?;
        Ok(self.sources.remove(pos))
    }

    /// Copy of the configured sources.
    pub fn sources(&self) -> Vec<Source> {
        self.sources.clone()
    }

    /// Plugins whose name, description, track name or tags contain `query`
    /// (case-insensitive) and that pass every filter.
    ///
    /// Results keep source order; a name seen in an earlier source hides
    /// later ones.
    pub async fn search(
        &self,
        query: &str,
        filters: &[PluginFilter],
    ) -> RegistryResult<Vec<PluginEntry>> {
        let indexes = self.load_all().await?;
        let query = query.to_lowercase();

        let mut seen = std::collections::HashSet::new();
        let mut results = Vec::new();

        for plugin in indexes.iter().flat_map(|idx| idx.plugins.iter()) {
            if seen.contains(plugin.name.as_str()) {
                continue;
            }
            if matches_query(plugin, &query) && plugin_passes(filters, plugin) {
                seen.insert(plugin.name.as_str());
                results.push(plugin.clone());
            }
        }

        Ok(results)
    }

    /// Highest version of `name` satisfying `constraint` across all sources.
    pub async fn resolve(
        &self,
        name: &str,
        constraint: &str,
        filters: &[PluginFilter],
    ) -> RegistryResult<VersionEntry> {
        let con = Constraint::parse(constraint)?;
        let indexes = self.load_all().await?;

        let mut best: Option<(Version, &VersionEntry)> = None;

        let candidates = indexes
            .iter()
            .flat_map(|idx| idx.plugins.iter())
            .filter(|p| p.name == name && plugin_passes(filters, p))
            .flat_map(|p| p.versions.iter())
            .filter(|ve| version_passes(filters, ve));

        for entry in candidates {
            let Some(v) = entry.parsed_version() else {
                continue;
            };
            if !con.matches(&v) {
                continue;
            }
            let better = match &best {
                Some((b, _)) => v > *b,
                None => true,
            };
            if better {
                best = Some((v, entry));
            }
        }

        let (version, entry) = best.ok_or_else(|| {
            RegistryError::not_found(format!(
                "no version of {:?} matches constraint {:?}",
                name, constraint
            ))
        })?;

        debug!(plugin = %name, constraint = %con, version = %version, "resolved");
        Ok(entry.clone())
    }

    /// First plugin entry named exactly `name`, in source order.
    pub async fn info(&self, name: &str) -> RegistryResult<PluginEntry> {
        let indexes = self.load_all().await?;
        indexes
            .iter()
            .find_map(|idx| idx.plugin(name))
            .cloned()
            .ok_or_else(|| RegistryError::not_found(format!("plugin {:?}", name)))
    }

    /// Fetch and re-cache every source, collecting per-source failures.
    pub async fn refresh(&self) -> RegistryResult<()> {
        let mut errors = Vec::new();

        for source in &self.sources {
            let outcome = match self.http.fetch_index(&source.url).await {
                Ok(index) => self.cache.store(source, &index).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => info!(source = %source.name, "refreshed index"),
                Err(e) => {
                    warn!(source = %source.name, error = %e, "refresh failed");
                    errors.push(SourceError::new(&source.name, &e));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Sources { errors })
        }
    }

    /// Indexes from every usable source. Fails only if no source yielded one.
    async fn load_all(&self) -> RegistryResult<Vec<Index>> {
        let mut indexes = Vec::with_capacity(self.sources.len());
        let mut errors = Vec::new();

        for source in &self.sources {
            match self.get_index(source).await {
                Ok(index) => indexes.push(index),
                Err(e) => {
                    warn!(source = %source.name, error = %e, "source unavailable");
                    errors.push(SourceError::new(&source.name, &e));
                }
            }
        }

        if indexes.is_empty() && !errors.is_empty() {
            return Err(RegistryError::Sources { errors });
        }
        Ok(indexes)
    }

    async fn get_index(&self, source: &Source) -> RegistryResult<Index> {
        if !self.cache.is_stale(source).await {
            match self.cache.load(source).await {
                Ok(index) => {
                    debug!(source = %source.name, "cache hit");
                    return Ok(index);
                }
                Err(e) => debug!(source = %source.name, error = %e, "cache unusable, refetching"),
            }
        }

        match self.http.fetch_index(&source.url).await {
            Ok(index) => {
                if let Err(e) = self.cache.store(source, &index).await {
                    warn!(source = %source.name, error = %e, "failed to cache index");
                }
                Ok(index)
            }
            Err(fetch_err) => match self.cache.load(source).await {
                Ok(stale) => {
                    warn!(
                        source = %source.name,
                        error = %fetch_err,
                        "fetch failed, using cached index"
                    );
                    Ok(stale)
                }
                Err(_) => Err(fetch_err),
            },
        }
    }
}

fn matches_query(plugin: &PluginEntry, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let contains = |s: &str| s.to_lowercase().contains(query);

    contains(&plugin.name)
        || contains(&plugin.description)
        || plugin
            .track_info()
            .is_some_and(|info| contains(info.display_name))
        || plugin.tags.iter().any(|t| contains(t))
}
