//! Ed25519 public keys in PEM form and detached signature checks.
//!
//! Two PEM encodings are accepted:
//! - `ED25519 PUBLIC KEY`: the raw 32 key bytes
//! - `PUBLIC KEY`: a PKIX SubjectPublicKeyInfo for Ed25519 (OID 1.3.101.112)

use ed25519_dalek::{Signature, Verifier as _, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use pem_rfc7468::LineEnding;

use crate::digest::sha256_hex;
use crate::error::{RegistryError, RegistryResult};

/// PEM label for raw 32-byte keys.
pub const RAW_KEY_LABEL: &str = "ED25519 PUBLIC KEY";

/// PEM label for PKIX-encoded keys.
pub const PKIX_KEY_LABEL: &str = "PUBLIC KEY";

/// DER header of an Ed25519 SubjectPublicKeyInfo, followed by the key bytes.
const ED25519_PKIX_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Parse a PEM-encoded Ed25519 public key into its raw 32 bytes.
///
/// Only the PEM framing, length and PKIX header are checked. Whether the
/// bytes form a valid curve point is left to [`verify_signature`].
pub fn parse_public_key(pem: &str) -> RegistryResult<[u8; PUBLIC_KEY_LENGTH]> {
    let (label, der) = pem_rfc7468::decode_vec(pem.trim().as_bytes())
        .map_err(|e| RegistryError::validation("public key", format!("no PEM block: {}", e)))?;

    match label {
        RAW_KEY_LABEL => raw_key(&der),
        PKIX_KEY_LABEL => parse_pkix(&der),
        other => Err(RegistryError::validation(
            "public key",
            format!("unsupported PEM label {:?}", other),
        )),
    }
}

fn raw_key(bytes: &[u8]) -> RegistryResult<[u8; PUBLIC_KEY_LENGTH]> {
    bytes.try_into().map_err(|_| {
        RegistryError::validation(
            "public key",
            format!(
                "raw Ed25519 key is {} bytes, want {}",
                bytes.len(),
                PUBLIC_KEY_LENGTH
            ),
        )
    })
}

fn parse_pkix(der: &[u8]) -> RegistryResult<[u8; PUBLIC_KEY_LENGTH]> {
    let want = ED25519_PKIX_PREFIX.len() + PUBLIC_KEY_LENGTH;
    if der.len() != want {
        return Err(RegistryError::validation(
            "public key",
            format!("PKIX Ed25519 key is {} bytes, want {}", der.len(), want),
        ));
    }
    let Some(key) = der.strip_prefix(ED25519_PKIX_PREFIX.as_slice()) else {
        return Err(RegistryError::validation(
            "public key",
            "PKIX key is not Ed25519",
        ));
    };

    raw_key(key)
}

/// SHA-256 of the raw key bytes, lowercase hex.
pub fn key_fingerprint(key: &[u8]) -> String {
    sha256_hex(key)
}

/// Encode raw key bytes as an `ED25519 PUBLIC KEY` PEM block.
pub fn export_key_pem(key: &[u8; PUBLIC_KEY_LENGTH]) -> RegistryResult<String> {
    pem_rfc7468::encode_string(RAW_KEY_LABEL, LineEnding::LF, key)
        .map_err(|e| RegistryError::validation("public key", e.to_string()))
}

/// Check a detached Ed25519 signature over `content`.
///
/// Malformed PEM and signatures of the wrong length are errors. A
/// well-formed signature that does not verify is `Ok(false)`, and so is a
/// key whose bytes are not a point on the curve.
pub fn verify_signature(
    content: &[u8],
    signature: &[u8],
    public_key_pem: &str,
) -> RegistryResult<bool> {
    let raw = parse_public_key(public_key_pem)?;

    let bytes: [u8; SIGNATURE_LENGTH] = signature.try_into().map_err(|_| {
        RegistryError::validation(
            "signature",
            format!(
                "length is {}, want {}",
                signature.len(),
                SIGNATURE_LENGTH
            ),
        )
    })?;

    let Ok(key) = VerifyingKey::from_bytes(&raw) else {
        return Ok(false);
    };
    Ok(key.verify(content, &Signature::from_bytes(&bytes)).is_ok())
}
