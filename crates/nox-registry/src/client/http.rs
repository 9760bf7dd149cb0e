//! HTTP layer: bounded index download and schema gate.
//!
//! Status codes are interpreted here only; client/mod.rs never sees them.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::types::Index;

/// Only the schema field, read before the full document.
#[derive(Deserialize)]
struct SchemaProbe {
    #[serde(default)]
    schema_version: String,
}

/// HTTP backend for index downloads.
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) max_index_bytes: u64,
    pub(crate) supported_schemas: Vec<String>,
}

impl HttpBackend {
    /// GET and validate the index at `url`.
    pub(crate) async fn fetch_index(&self, url: &str) -> RegistryResult<Index> {
        let body = self.get_bounded(url).await?;

        let probe: SchemaProbe = serde_json::from_slice(&body)
            .map_err(|e| RegistryError::validation("index", format!("{}: {}", url, e)))?;

        if !self.supported_schemas.contains(&probe.schema_version) {
            return Err(RegistryError::UnsupportedSchema {
                found: probe.schema_version,
                supported: self.supported_schemas.clone(),
            });
        }

        serde_json::from_slice(&body)
            .map_err(|e| RegistryError::validation("index", format!("{}: {}", url, e)))
    }

    async fn get_bounded(&self, url: &str) -> RegistryResult<Vec<u8>> {
        debug!(url = %url, "fetching index");

        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RegistryError::Transport {
                message: format!("{} returned HTTP {}", url, status.as_u16()),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_index_bytes {
                return Err(self.too_large(url));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > self.max_index_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %url, bytes = body.len(), "index downloaded");
        Ok(body)
    }

    fn too_large(&self, url: &str) -> RegistryError {
        RegistryError::Transport {
            message: format!(
                "index at {} exceeds {} bytes",
                url, self.max_index_bytes
            ),
        }
    }
}
