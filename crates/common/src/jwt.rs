//! Bearer token utilities shared across menu platform services.
//!
//! This module provides the structural half of access token verification:
//! - Size limits for DoS prevention
//! - Decoding of the compact `header.payload.signature` form
//! - Claim validation (algorithm pin, key ID, expiry, issuer)
//! - Issuer and JWKS URL derivation from the auth service base URL
//!
//! Signature verification lives in [`crate::jwk`].
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE decoding
//! - Only RS256 is accepted; `none`, HMAC and every other scheme is rejected
//! - The signing input is the original two segments, never a re-serialization
//! - Error messages are short and carry no token contents
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{decode_token, validate_claims};
//!
//! let decoded = decode_token(token)?;
//! validate_claims(&decoded.header, &decoded.payload, &expected_issuer, now)?;
//! // then resolve decoded.key_id() in the JWKS and verify decoded.signature
//! ```

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Auth service access tokens are typically 700-1200 bytes (RS256 signature,
/// user metadata claims). Anything larger is rejected before any base64 or
/// JSON work is done.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// The single signing algorithm accepted for access tokens.
pub const EXPECTED_ALGORITHM: &str = "RS256";

/// Path appended to the auth service base URL to form the expected `iss`.
pub const ISSUER_PATH: &str = "/auth/v1";

/// Issuer-relative path of the published JSON Web Key Set.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// base64url engine that accepts segments with or without `=` padding.
pub(crate) const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded JSON object (token header or payload).
pub type JsonObject = serde_json::Map<String, Value>;

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while decoding a token or validating its claims.
///
/// Signature and key directory failures are not represented here; they
/// belong to the service that owns the key directory.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token is not three non-empty base64url segments with JSON object
    /// header and payload, exceeds the size limit, or carries a non-numeric
    /// `exp`.
    #[error("Malformed token")]
    MalformedToken,

    /// Header `alg` is anything other than RS256.
    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,

    /// Header `kid` is absent, not a string, or empty.
    #[error("Missing key id")]
    MissingKeyId,

    /// `now >= exp`.
    #[error("Token expired")]
    TokenExpired,

    /// `iss` does not exactly equal the expected issuer.
    #[error("Invalid issuer")]
    IssuerMismatch,
}

// =============================================================================
// Decoded token
// =============================================================================

/// A structurally valid, not yet verified token.
#[derive(Clone)]
pub struct DecodedToken {
    /// Decoded header object.
    pub header: JsonObject,

    /// Decoded payload object (the claims).
    pub payload: JsonObject,

    /// Raw signature bytes.
    pub signature: Vec<u8>,

    /// The original `header.payload` text the signature was computed over.
    pub signing_input: String,
}

/// Debug output omits the payload, which carries subject identifiers and email.
impl fmt::Debug for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("header", &self.header)
            .field("payload", &"[REDACTED]")
            .field("signature_len", &self.signature.len())
            .finish_non_exhaustive()
    }
}

impl DecodedToken {
    /// The header `alg`, if it is a string.
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// The header `kid`, if it is a non-empty string.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        key_id(&self.header)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Build the expected `iss` value from the auth service base URL.
///
/// The base URL is used verbatim; callers normalize it once at configuration
/// time.
#[must_use]
pub fn expected_issuer(base_url: &str) -> String {
    format!("{base_url}{ISSUER_PATH}")
}

/// Build the JWKS document URL from the auth service base URL.
#[must_use]
pub fn jwks_url(base_url: &str) -> String {
    format!("{base_url}{ISSUER_PATH}{JWKS_PATH}")
}

/// Decode a compact token into header, payload, signature and signing input.
///
/// This function does NOT verify anything beyond structure.
///
/// # Errors
///
/// Returns `JwtValidationError::MalformedToken` when:
/// - the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - it does not split into exactly three non-empty segments on `.`
/// - the header or payload is not base64url-encoded JSON object
/// - the signature is not valid base64url
pub fn decode_token(token: &str) -> Result<DecodedToken, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let parts: Vec<&str> = token.split('.').collect();
    let [header_part, payload_part, signature_part] = parts.as_slice() else {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid segment count"
        );
        return Err(JwtValidationError::MalformedToken);
    };

    if header_part.is_empty() || payload_part.is_empty() || signature_part.is_empty() {
        tracing::debug!(target: "common.jwt", "Token rejected: empty segment");
        return Err(JwtValidationError::MalformedToken);
    }

    let header = decode_json_segment(header_part, "header")?;
    let payload = decode_json_segment(payload_part, "payload")?;

    let signature = BASE64URL.decode(signature_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode signature base64");
        JwtValidationError::MalformedToken
    })?;

    Ok(DecodedToken {
        header,
        payload,
        signature,
        signing_input: format!("{header_part}.{payload_part}"),
    })
}

fn decode_json_segment(segment: &str, name: &'static str) -> Result<JsonObject, JwtValidationError> {
    let bytes = BASE64URL.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to decode segment base64");
        JwtValidationError::MalformedToken
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => {
            tracing::debug!(target: "common.jwt", segment = name, "Segment is not a JSON object");
            Err(JwtValidationError::MalformedToken)
        }
        Err(e) => {
            tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to parse segment JSON");
            Err(JwtValidationError::MalformedToken)
        }
    }
}

fn key_id(header: &JsonObject) -> Option<&str> {
    header
        .get("kid")
        .and_then(Value::as_str)
        .filter(|kid| !kid.is_empty())
}

/// Validate header and payload claims against the expected issuer at `now`.
///
/// Checks run in a fixed order: algorithm, key ID, expiry, issuer.
///
/// # Arguments
///
/// * `header` - Decoded token header
/// * `payload` - Decoded token payload
/// * `expected_issuer` - Exact `iss` value to require (see [`expected_issuer`])
/// * `now` - Current time as Unix epoch seconds
///
/// # Errors
///
/// - `UnsupportedAlgorithm` - `alg` is not RS256
/// - `MissingKeyId` - `kid` is absent or empty
/// - `MalformedToken` - `exp` is present but not a number
/// - `TokenExpired` - `now >= exp`
/// - `IssuerMismatch` - `iss` differs from `expected_issuer` in any way
pub fn validate_claims(
    header: &JsonObject,
    payload: &JsonObject,
    expected_issuer: &str,
    now: i64,
) -> Result<(), JwtValidationError> {
    let alg = header.get("alg").and_then(Value::as_str);
    if alg != Some(EXPECTED_ALGORITHM) {
        tracing::debug!(target: "common.jwt", alg = ?alg, "Token rejected: unexpected algorithm");
        return Err(JwtValidationError::UnsupportedAlgorithm);
    }

    if key_id(header).is_none() {
        tracing::debug!(target: "common.jwt", "Token rejected: missing kid");
        return Err(JwtValidationError::MissingKeyId);
    }

    if is_expired(payload.get("exp"), now)? {
        tracing::debug!(target: "common.jwt", now = now, "Token rejected: expired");
        return Err(JwtValidationError::TokenExpired);
    }

    if payload.get("iss").and_then(Value::as_str) != Some(expected_issuer) {
        tracing::debug!(target: "common.jwt", "Token rejected: issuer mismatch");
        return Err(JwtValidationError::IssuerMismatch);
    }

    Ok(())
}

/// The expiry second itself is already expired.
fn is_expired(exp: Option<&Value>, now: i64) -> Result<bool, JwtValidationError> {
    let exp = match exp {
        None | Some(Value::Null) => return Ok(false),
        Some(exp) => exp,
    };

    if let Some(exp) = exp.as_i64() {
        return Ok(now >= exp);
    }

    // Fractional or out-of-i64-range expiry
    #[allow(clippy::cast_precision_loss)]
    let now_f = now as f64;
    exp.as_f64()
        .map(|exp| now_f >= exp)
        .ok_or(JwtValidationError::MalformedToken)
}
