//! Plugin registry resolution and trust verification for nox.
//!
//! This crate provides:
//!
//! - Semantic versions and version constraints (`*`, exact, `>=`, `^`, `~`)
//! - A multi-source registry client with a TTL file cache and offline fallback
//! - Track, tag and risk-class filters for search and resolve
//! - SHA-256 content digests
//! - Ed25519 keyrings, signature checks and trust policy enforcement
//!
//! # Quick Start
//!
//! ```no_run
//! use nox_registry::{ClientConfig, PluginFilter, RegistryClient, Source, Track};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut client = RegistryClient::new(ClientConfig::new("/var/cache/nox/registry"))?;
//! client.add_source(Source::new("official", "https://registry.nox.dev/index.json"))?;
//!
//! let found = client
//!     .search("secrets", &[PluginFilter::Track(Track::CoreAnalysis)])
//!     .await?;
//! println!("{} plugins", found.len());
//!
//! let version = client.resolve("nox/sast", "^1.0.0", &[]).await?;
//! println!("resolved {} ({})", version.version, version.digest);
//! # Ok(())
//! # }
//! ```
//!
//! # Verifying an artifact
//!
//! ```no_run
//! use nox_registry::{Keyring, TrustPolicy, Verifier};
//!
//! # async fn example(content: &[u8], digest: &str, sig: &[u8], pem: &str) -> anyhow::Result<()> {
//! let keyring = Keyring::load("/etc/nox/trust/keyring.json").await?;
//! let verifier = Verifier::new(keyring, TrustPolicy::enterprise());
//!
//! let result = verifier.verify_artifact(content, digest, sig, pem, "v1");
//! for violation in &result.violations {
//!     eprintln!("warning: {}", violation);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod digest;
pub mod error;
mod io;
pub mod track;
pub mod trust;
pub mod types;
pub mod version;

pub use cache::IndexCache;
pub use client::{ClientConfig, PluginFilter, PluginPredicate, RegistryClient};
pub use config::RegistrySettings;
pub use digest::{verify_digest, Digest};
pub use error::{ErrorKind, RegistryError, RegistryResult, SourceError};
pub use track::{track_catalog, valid_track, Track, TrackInfo};
pub use trust::{
    export_key_pem, key_fingerprint, parse_public_key, verify_signature, Key, Keyring,
    TrustLevel, TrustPolicy, TrustPreset, TrustViolation, Verifier, VerifyResult,
};
pub use types::{Index, PlatformArtifact, PluginEntry, RiskClass, Source, VersionEntry};
pub use version::{Constraint, Version};
