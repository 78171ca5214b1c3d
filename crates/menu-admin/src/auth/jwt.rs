//! Bearer token verification.
//!
//! Verification is a fixed pipeline:
//!
//! ```text
//! decode -> validate claims -> fetch keys -> find key -> verify signature
//! ```
//!
//! The first failing stage decides the error. Nothing touches the network
//! until the token has decoded and its claims have passed.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted; `alg` values in the token never select a verifier
//! - The issuer must match exactly
//! - The signature is checked over the original `header.payload` text

use crate::auth::claims::Claims;
use crate::auth::jwks::JwksClient;
use crate::errors::AuthError;
use common::jwk::verify_signature;
use common::jwt::{decode_token, expected_issuer, validate_claims};
use std::sync::Arc;
use tracing::instrument;

/// Verifies bearer tokens issued by one auth service.
pub struct JwtVerifier {
    jwks_client: Arc<JwksClient>,

    /// Exact `iss` value tokens must carry.
    expected_issuer: String,
}

impl JwtVerifier {
    /// Create a verifier for the issuer the JWKS client serves.
    pub fn new(jwks_client: Arc<JwksClient>) -> Self {
        let expected_issuer = expected_issuer(jwks_client.issuer_base_url());
        Self {
            jwks_client,
            expected_issuer,
        }
    }

    pub fn expected_issuer(&self) -> &str {
        &self.expected_issuer
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// See [`JwtVerifier::verify_at`].
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp()).await
    }

    /// Verify a token as of `now` (Unix epoch seconds).
    ///
    /// Returns the payload unchanged on success.
    ///
    /// # Errors
    ///
    /// - `MalformedToken`, `UnsupportedAlgorithm`, `MissingKeyId`,
    ///   `TokenExpired`, `IssuerMismatch` - decode and claim checks
    /// - `KeyFetch` - the key set could not be retrieved
    /// - `UnknownKeyId` - no published key has the token's `kid`
    /// - `BadSignature` - the signature does not verify under that key
    #[instrument(skip_all, name = "menu_admin.auth.verify")]
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let decoded = decode_token(token)?;

        validate_claims(&decoded.header, &decoded.payload, &self.expected_issuer, now)?;

        let kid = decoded.key_id().ok_or(AuthError::MissingKeyId)?;

        let jwk = self.jwks_client.get_key(kid).await?;

        if !verify_signature(&decoded.signing_input, &decoded.signature, &jwk) {
            tracing::debug!(target: "menu_admin.auth.jwt", kid = %kid, "Token signature rejected");
            return Err(AuthError::BadSignature);
        }

        tracing::debug!(target: "menu_admin.auth.jwt", "Token verified");
        Ok(Claims::new(decoded.payload))
    }
}
