//! Builder for signed test tokens.

use crate::crypto_fixtures::TestSigningKey;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{crypto, Algorithm};
use serde_json::{json, Map, Value};

/// Builder for RS256 test tokens in the auth service's shape.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new("http://127.0.0.1:4000")
///     .with_email("owner@menu.com")
///     .expires_in(3600)
///     .sign(&TestSigningKey::primary());
/// ```
#[derive(Clone)]
pub struct TestTokenBuilder {
    header: Map<String, Value>,
    payload: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Claims issued by `<base_url>/auth/v1`, expiring in one hour.
    pub fn new(base_url: &str) -> Self {
        let now = Utc::now();
        let mut payload = Map::new();
        payload.insert("sub".to_string(), json!("00000000-0000-0000-0000-000000000001"));
        payload.insert("iss".to_string(), json!(format!("{base_url}/auth/v1")));
        payload.insert("aud".to_string(), json!("authenticated"));
        payload.insert("role".to_string(), json!("authenticated"));
        payload.insert("iat".to_string(), json!(now.timestamp()));
        payload.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(3600)).timestamp()),
        );

        let mut header = Map::new();
        header.insert("alg".to_string(), json!("RS256"));
        header.insert("typ".to_string(), json!("JWT"));

        Self { header, payload }
    }

    pub fn for_user(self, subject: &str) -> Self {
        self.claim("sub", json!(subject))
    }

    /// Top-level `email` claim.
    pub fn with_email(self, email: &str) -> Self {
        self.claim("email", json!(email))
    }

    /// `user_metadata.email` claim.
    pub fn with_metadata_email(self, email: &str) -> Self {
        self.claim("user_metadata", json!({ "email": email }))
    }

    pub fn issued_by(self, issuer: &str) -> Self {
        self.claim("iss", json!(issuer))
    }

    /// Set expiration in seconds from now (negative for the past).
    pub fn expires_in(self, seconds: i64) -> Self {
        self.expires_at((Utc::now() + Duration::seconds(seconds)).timestamp())
    }

    pub fn expires_at(self, timestamp: i64) -> Self {
        self.claim("exp", json!(timestamp))
    }

    pub fn without_claim(mut self, name: &str) -> Self {
        self.payload.remove(name);
        self
    }

    /// Set any payload claim.
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.payload.insert(name.to_string(), value);
        self
    }

    /// Override or add a header field. `kid` is otherwise taken from the key.
    pub fn header(mut self, name: &str, value: Value) -> Self {
        self.header.insert(name.to_string(), value);
        self
    }

    /// The payload exactly as it will be signed.
    pub fn claims(&self) -> Value {
        Value::Object(self.payload.clone())
    }

    /// Encode and sign with `key`.
    ///
    /// Segments are serialized directly, so header overrides such as
    /// `"alg": "none"` survive as written.
    pub fn sign(self, key: &TestSigningKey) -> String {
        let mut header = self.header;
        header
            .entry("kid".to_string())
            .or_insert_with(|| json!(key.kid));

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(Value::Object(header).to_string()),
            URL_SAFE_NO_PAD.encode(Value::Object(self.payload).to_string())
        );

        let signature = crypto::sign(
            signing_input.as_bytes(),
            &key.encoding_key(),
            Algorithm::RS256,
        )
        .expect("RS256 signing with fixture key must succeed");

        format!("{signing_input}.{signature}")
    }
}

/// Flip one bit in the signature segment of a compact token.
pub fn tamper_signature(token: &str) -> String {
    let (signing_input, signature) = token.rsplit_once('.').expect("token must have segments");
    let mut bytes = URL_SAFE_NO_PAD
        .decode(signature)
        .expect("signature must be base64url");
    bytes[0] ^= 0x01;
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(bytes))
}
