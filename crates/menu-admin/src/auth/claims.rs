//! Verified token claims.
//!
//! The verifier returns the token payload unchanged, so `Claims` wraps the
//! whole JSON object rather than a fixed struct. Subject identifiers and
//! emails are redacted in Debug output.

use common::jwt::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Claims of a verified token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(JsonObject);

impl Claims {
    /// Wrap a decoded payload.
    pub fn new(payload: JsonObject) -> Self {
        Self(payload)
    }

    /// Subject (user id).
    pub fn sub(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Issuer.
    pub fn iss(&self) -> Option<&str> {
        self.0.get("iss").and_then(Value::as_str)
    }

    /// Expiration timestamp (Unix epoch seconds).
    pub fn exp(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    /// Subject email.
    ///
    /// A non-empty top-level `email` takes precedence over
    /// `user_metadata.email`.
    pub fn email(&self) -> Option<&str> {
        let top_level = self
            .0
            .get("email")
            .and_then(Value::as_str)
            .filter(|email| !email.is_empty());

        top_level.or_else(|| {
            self.0
                .get("user_metadata")
                .and_then(|metadata| metadata.get("email"))
                .and_then(Value::as_str)
                .filter(|email| !email.is_empty())
        })
    }

    /// Raw claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn into_inner(self) -> JsonObject {
        self.0
    }
}

impl From<JsonObject> for Claims {
    fn from(payload: JsonObject) -> Self {
        Self::new(payload)
    }
}

/// Custom Debug implementation that redacts `sub` and email.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("email", &self.email().map(|_| "[REDACTED]"))
            .field("iss", &self.iss())
            .field("exp", &self.exp())
            .field("claim_count", &self.0.len())
            .finish()
    }
}
