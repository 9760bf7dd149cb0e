//! Artifact verification pipeline.

use tracing::{debug, warn};

use super::keyring::Keyring;
use super::policy::TrustPolicy;
use super::signature::{key_fingerprint, parse_public_key, verify_signature};
use super::{TrustLevel, TrustViolation, VerifyResult};
use crate::digest::verify_digest;
use crate::types::VersionEntry;

/// Checks artifacts against a keyring and a trust policy.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    keyring: Keyring,
    policy: TrustPolicy,
}

impl Verifier {
    pub fn new(keyring: Keyring, policy: TrustPolicy) -> Self {
        Self { keyring, policy }
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Verify `content` and classify its trust.
    ///
    /// Empty `expected_digest`, `signature`, `signer_key_pem` or
    /// `api_version` skip the corresponding check. The signature check runs
    /// only when both signature and key are given. Every failure is recorded
    /// in the result's violations, including the policy's own.
    pub fn verify_artifact(
        &self,
        content: &[u8],
        expected_digest: &str,
        signature: &[u8],
        signer_key_pem: &str,
        api_version: &str,
    ) -> VerifyResult {
        let mut result = VerifyResult::new();

        if !expected_digest.is_empty() {
            match verify_digest(content, expected_digest) {
                Ok(true) => result.digest_match = true,
                Ok(false) => result.violations.push(TrustViolation::new(
                    "digest",
                    "content digest does not match expected digest",
                )),
                Err(e) => result
                    .violations
                    .push(TrustViolation::new("digest", e.to_string())),
            }
        }

        if !signature.is_empty() && !signer_key_pem.is_empty() {
            match verify_signature(content, signature, signer_key_pem) {
                Ok(true) => result.signature_valid = true,
                Ok(false) => result
                    .violations
                    .push(TrustViolation::new("signature", "signature verification failed")),
                Err(e) => result
                    .violations
                    .push(TrustViolation::new("signature", e.to_string())),
            }

            if result.signature_valid {
                self.classify(signer_key_pem, &mut result);
            }
        }

        if !api_version.is_empty() {
            let api = self.policy.check_api_version(api_version);
            result.violations.extend(api);
        }

        let enforced = self.policy.enforce(&result);
        result.violations.extend(enforced);

        if result.violations.is_empty() {
            debug!(trust_level = %result.trust_level, "artifact verified");
        } else {
            warn!(
                trust_level = %result.trust_level,
                violations = result.violations.len(),
                "artifact verified with violations"
            );
        }

        result
    }

    /// Verify `content` against a version entry from a registry index.
    ///
    /// The entry's base64 signature and signer key are decoded first; a
    /// field that does not decode becomes a violation and its check is
    /// skipped.
    pub fn verify_version(&self, content: &[u8], entry: &VersionEntry) -> VerifyResult {
        let mut decode = Vec::new();

        let signature = entry.signature_bytes().unwrap_or_else(|e| {
            decode.push(TrustViolation::new("signature", e.to_string()));
            None
        });
        let signer_pem = entry.signer_key().unwrap_or_else(|e| {
            decode.push(TrustViolation::new("signer_key", e.to_string()));
            None
        });

        let mut result = self.verify_artifact(
            content,
            &entry.digest,
            signature.as_deref().unwrap_or_default(),
            signer_pem.as_deref().unwrap_or_default(),
            &entry.api_version,
        );
        decode.append(&mut result.violations);
        result.violations = decode;
        result
    }

    fn classify(&self, signer_key_pem: &str, result: &mut VerifyResult) {
        // Already parsed once by verify_signature.
        let Ok(key) = parse_public_key(signer_key_pem) else {
            return;
        };
        let fingerprint = key_fingerprint(&key);

        match self.keyring.find(&fingerprint) {
            Some(trusted) => {
                result.trust_level = TrustLevel::Verified;
                result.signer_name = Some(trusted.name.clone());
            }
            None => result.trust_level = TrustLevel::Community,
        }
        result.signer_key = Some(fingerprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    use crate::digest::Digest;
    use crate::trust::{export_key_pem, Key};

    struct Fixture {
        content: Vec<u8>,
        digest: String,
        signature: Vec<u8>,
        pem: String,
    }

    fn fixture() -> Fixture {
        let sk = SigningKey::generate(&mut rand::thread_rng());
        let content = b"artifact payload".to_vec();
        Fixture {
            digest: Digest::compute(&content).to_string(),
            signature: sk.sign(&content).to_bytes().to_vec(),
            pem: export_key_pem(sk.verifying_key().as_bytes()).unwrap(),
            content,
        }
    }

    #[test]
    fn test_trusted_signer_is_verified() {
        let f = fixture();
        let mut keyring = Keyring::new();
        keyring.add(Key::new("nox-release", f.pem.clone()).unwrap());

        let v = Verifier::new(keyring, TrustPolicy::enterprise());
        let r = v.verify_artifact(&f.content, &f.digest, &f.signature, &f.pem, "v1");

        assert!(r.is_ok(), "{:?}", r.violations);
        assert_eq!(r.trust_level, TrustLevel::Verified);
        assert_eq!(r.signer_name.as_deref(), Some("nox-release"));
        assert!(r.signer_key.is_some());
    }

    #[test]
    fn test_unknown_signer_is_community() {
        let f = fixture();
        let v = Verifier::new(Keyring::new(), TrustPolicy::default());
        let r = v.verify_artifact(&f.content, &f.digest, &f.signature, &f.pem, "v1");

        assert!(r.is_ok());
        assert_eq!(r.trust_level, TrustLevel::Community);
        assert!(r.signer_name.is_none());
    }

    #[test]
    fn test_unsigned_under_default_policy() {
        let f = fixture();
        let v = Verifier::default();
        let r = v.verify_artifact(&f.content, &f.digest, &[], "", "v1");

        assert!(r.digest_match);
        assert_eq!(r.trust_level, TrustLevel::Unverified);
        assert_eq!(r.violations.len(), 1);
        assert_eq!(r.violations[0].field, "trust_level");
    }

    #[test]
    fn test_tampered_content_collects_all_violations() {
        let f = fixture();
        let v = Verifier::default();
        let r = v.verify_artifact(b"tampered", &f.digest, &f.signature, &f.pem, "v9");

        let fields: Vec<_> = r.violations.iter().map(|x| x.field.as_str()).collect();
        assert_eq!(fields, ["digest", "signature", "api_version", "digest", "trust_level"]);
        assert!(!r.signature_valid);
        assert_eq!(r.trust_level, TrustLevel::Unverified);
    }

    #[test]
    fn test_verify_version_decodes_published_fields() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let f = fixture();
        let entry = VersionEntry {
            version: "1.0.0".to_string(),
            api_version: "v1".to_string(),
            digest: f.digest.clone(),
            signature: Some(BASE64.encode(&f.signature)),
            signer_key_pem: Some(BASE64.encode(&f.pem)),
            ..Default::default()
        };

        let mut keyring = Keyring::new();
        keyring.add(Key::new("nox-release", f.pem.clone()).unwrap());
        let v = Verifier::new(keyring, TrustPolicy::enterprise());

        let r = v.verify_version(&f.content, &entry);
        assert!(r.is_ok(), "{:?}", r.violations);
        assert!(r.signature_valid);
        assert_eq!(r.trust_level, TrustLevel::Verified);

        let garbled = VersionEntry {
            signer_key_pem: Some("not base64!".to_string()),
            ..entry
        };
        let r = v.verify_version(&f.content, &garbled);
        let fields: Vec<_> = r.violations.iter().map(|x| x.field.as_str()).collect();
        assert_eq!(fields, ["signer_key", "trust_level"]);
        assert_eq!(r.trust_level, TrustLevel::Unverified);
    }

    #[test]
    fn test_malformed_inputs_become_violations() {
        let f = fixture();
        let v = Verifier::new(Keyring::new(), TrustPolicy::permissive());
        let r = v.verify_artifact(&f.content, "sha256:nothex", &f.signature, "not a pem", "");

        let fields: Vec<_> = r.violations.iter().map(|x| x.field.as_str()).collect();
        assert_eq!(fields, ["digest", "signature"]);
    }
}
