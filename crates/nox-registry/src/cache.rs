//! On-disk cache of registry indexes.
//!
//! # Cache Structure
//!
//! ```text
//! <cache_dir>/
//!   <first 16 hex chars of sha256(source url)>.json   # raw index JSON
//! ```
//!
//! The file name depends only on the source URL, so renaming a source keeps
//! its cache entry. Staleness is judged by file modification time.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::debug;

use crate::digest::sha256_hex;
use crate::error::{RegistryError, RegistryResult};
use crate::io::{read_optional, write_atomic};
use crate::types::{Index, Source};

/// Hex characters of the URL hash used as the file stem.
const KEY_HEX_LEN: usize = 16;

/// File cache for registry indexes.
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
    ttl: Duration,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cache file for a source.
    pub fn path_for(&self, source: &Source) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(&source.url)))
    }

    /// Write an index for `source`, atomically replacing any previous entry.
    pub async fn store(&self, source: &Source, index: &Index) -> RegistryResult<()> {
        let data = serde_json::to_vec(index).map_err(|e| RegistryError::Io {
            message: format!("failed to serialize index: {}", e),
        })?;

        let path = self.path_for(source);
        write_atomic(&path, &data).await?;

        debug!(source = %source.name, path = %path.display(), "cached index");
        Ok(())
    }

    /// Read the cached index for `source`.
    ///
    /// Returns `CacheMiss` when there is no file and `CorruptCache` when the
    /// file does not decode.
    pub async fn load(&self, source: &Source) -> RegistryResult<Index> {
        let path = self.path_for(source);

        let data = read_optional(&path)
            .await?
            .ok_or_else(|| RegistryError::CacheMiss {
                path: path.display().to_string(),
            })?;

        serde_json::from_slice(&data).map_err(|e| RegistryError::CorruptCache {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// True if the entry is missing or older than the TTL.
    pub async fn is_stale(&self, source: &Source) -> bool {
        let modified = match fs::metadata(self.path_for(source)).await {
            Ok(meta) => meta.modified(),
            Err(_) => return true,
        };

        let Ok(modified) = modified else {
            return true;
        };

        // A timestamp in the future counts as just written.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age >= self.ttl
    }
}

/// Stable cache key for a source URL.
fn cache_key(url: &str) -> String {
    let mut hex = sha256_hex(url.as_bytes());
    hex.truncate(KEY_HEX_LEN);
    hex
}
