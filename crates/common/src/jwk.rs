//! JSON Web Key sets and RS256 signature verification.
//!
//! The auth service publishes its signing keys as a JWKS document
//! (`{"keys": [...]}`). This module parses that document leniently, resolves
//! a key by `kid`, and verifies RSASSA-PKCS1-v1_5 SHA-256 signatures with
//! the resolved key's modulus and exponent.
//!
//! # Security
//!
//! - Only `kty: "RSA"` keys are usable; a JWK advertising any `alg` other than
//!   RS256 is refused even if its `kid` matches
//! - Verification failure of any kind is reported as `false`, never as an
//!   error, so callers cannot mistake a bad key for a transient fault

use crate::jwt::{BASE64URL, EXPECTED_ALGORITHM};
use base64::Engine;
use ring::signature::{RsaPublicKeyComponents, RSA_PKCS1_2048_8192_SHA256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single JSON Web Key.
///
/// Only RSA members are used for verification; EC/OKP members are kept so a
/// mixed directory still deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for usable keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm the key is intended for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key use (normally "sig").
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url, big-endian).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent (base64url, big-endian).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Curve name for EC/OKP keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// EC/OKP x coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC y coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    /// Placeholder for a published entry that names `kid` but is not a
    /// well-formed JWK. It holds its position in the set and never verifies.
    fn unusable(kid: &str) -> Self {
        Self {
            kty: String::new(),
            kid: kid.to_string(),
            alg: None,
            key_use: None,
            n: None,
            e: None,
            crv: None,
            x: None,
            y: None,
        }
    }

    /// Decode the RSA public key components, if this key is usable for RS256.
    fn rsa_components(&self) -> Option<RsaPublicKeyComponents<Vec<u8>>> {
        if self.kty != "RSA" {
            tracing::warn!(target: "common.jwk", kid = %self.kid, kty = %self.kty, "Unexpected JWK key type");
            return None;
        }
        if let Some(alg) = &self.alg {
            if alg != EXPECTED_ALGORITHM {
                tracing::warn!(target: "common.jwk", kid = %self.kid, alg = %alg, "Unexpected JWK algorithm");
                return None;
            }
        }

        let n = decode_unsigned(self.n.as_deref(), &self.kid, "n")?;
        let e = decode_unsigned(self.e.as_deref(), &self.kid, "e")?;

        Some(RsaPublicKeyComponents { n, e })
    }
}

/// Decode a base64url big-endian unsigned integer, stripping leading zeros.
fn decode_unsigned(value: Option<&str>, kid: &str, member: &'static str) -> Option<Vec<u8>> {
    let Some(value) = value else {
        tracing::warn!(target: "common.jwk", kid = %kid, member, "JWK missing RSA member");
        return None;
    };

    let bytes = BASE64URL
        .decode(value)
        .map_err(|e| {
            tracing::warn!(target: "common.jwk", kid = %kid, member, error = %e, "Invalid JWK member encoding");
        })
        .ok()?;

    let first_non_zero = bytes.iter().position(|b| *b != 0)?;
    Some(bytes.split_at(first_non_zero).1.to_vec())
}

/// A snapshot of the issuer's published keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwkSet {
    keys: Vec<Jwk>,
}

impl JwkSet {
    /// Create a key set from already-parsed keys.
    #[must_use]
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Build a key set from a JWKS document.
    ///
    /// A document without a `keys` array yields an empty set, so malformed
    /// directories surface as unknown key IDs rather than transport failures.
    /// Entries without a string `kid` are skipped. Entries with a `kid` that
    /// do not deserialize are kept as unusable keys, so first-match-wins
    /// follows the published order.
    #[must_use]
    pub fn from_document(document: &Value) -> Self {
        let Some(entries) = document.get("keys").and_then(Value::as_array) else {
            tracing::warn!(target: "common.jwk", "JWKS document has no keys array");
            return Self::default();
        };

        let keys: Vec<Jwk> = entries
            .iter()
            .filter_map(|entry| match Jwk::deserialize(entry) {
                Ok(jwk) => Some(jwk),
                Err(e) => match entry.get("kid").and_then(Value::as_str) {
                    Some(kid) => {
                        tracing::debug!(target: "common.jwk", kid = %kid, error = %e, "Keeping unparseable JWKS entry as unusable key");
                        Some(Jwk::unusable(kid))
                    }
                    None => {
                        tracing::debug!(target: "common.jwk", error = %e, "Skipping unparseable JWKS entry");
                        None
                    }
                },
            })
            .collect();

        if keys.len() != entries.len() {
            tracing::warn!(
                target: "common.jwk",
                parsed = keys.len(),
                published = entries.len(),
                "Some JWKS entries were skipped"
            );
        }

        Self { keys }
    }

    /// Find a key by ID. First match wins.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Verify an RS256 signature over `signing_input` with `key`.
///
/// Returns `false` for an invalid signature and for key material that cannot
/// be used under RS256. Callers must fail closed on `false`.
#[must_use]
pub fn verify_signature(signing_input: &str, signature: &[u8], key: &Jwk) -> bool {
    let Some(components) = key.rsa_components() else {
        return false;
    };

    match components.verify(
        &RSA_PKCS1_2048_8192_SHA256,
        signing_input.as_bytes(),
        signature,
    ) {
        Ok(()) => true,
        Err(_) => {
            tracing::debug!(target: "common.jwk", kid = %key.kid, "Signature verification failed");
            false
        }
    }
}
