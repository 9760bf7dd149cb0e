//! Content digests (`sha256:<hex>`).

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::error::{RegistryError, RegistryResult};

/// The only supported algorithm.
pub const SHA256: &str = "sha256";

const SHA256_HEX_LEN: usize = 64;

/// An algorithm-prefixed content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// Parse `algorithm:hex`. Hex is normalized to lowercase.
    pub fn parse(s: &str) -> RegistryResult<Self> {
        let (algorithm, hex_value) = s.split_once(':').ok_or_else(|| {
            RegistryError::validation("digest", format!("missing algorithm prefix in {:?}", s))
        })?;

        if algorithm != SHA256 {
            return Err(RegistryError::validation(
                "digest",
                format!("unsupported algorithm {:?}", algorithm),
            ));
        }

        if hex_value.len() != SHA256_HEX_LEN {
            return Err(RegistryError::validation(
                "digest",
                format!(
                    "sha256 hex length is {}, want {}",
                    hex_value.len(),
                    SHA256_HEX_LEN
                ),
            ));
        }

        hex::decode(hex_value)
            .map_err(|e| RegistryError::validation("digest", format!("invalid hex: {}", e)))?;

        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex_value.to_ascii_lowercase(),
        })
    }

    /// SHA-256 of `data`.
    pub fn compute(data: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(data))
    }

    /// SHA-256 of everything `reader` yields.
    pub fn compute_reader<R: Read>(mut reader: R) -> RegistryResult<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0_u8; 8192];

        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| RegistryError::io("computing digest", e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(Self::from_hasher(hasher))
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self {
            algorithm: SHA256.to_string(),
            hex: hex::encode(hasher.finalize()),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Lowercase hex value.
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

/// Whether `data` hashes to `expected` (`sha256:<hex>`).
///
/// Errors only when `expected` is malformed; a mismatch is `Ok(false)`.
pub fn verify_digest(data: &[u8], expected: &str) -> RegistryResult<bool> {
    let expected = Digest::parse(expected)?;
    let actual = Digest::compute(data);
    Ok(actual.hex == expected.hex)
}

/// SHA-256 of `bytes` as bare lowercase hex.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    Digest::compute(bytes).hex
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = RegistryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.to_string()
    }
}
