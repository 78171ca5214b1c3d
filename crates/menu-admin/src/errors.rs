//! Admin gate error types.
//!
//! Every failure of the admin gate is one `AuthError` variant, and every
//! variant maps to exactly one HTTP status:
//! - Credential problems (missing, malformed, expired, unverifiable): 401
//! - Verified subject outside the admin allowlist: 403
//! - Key directory transport failures and anything unanticipated: 500
//!
//! Response bodies carry a short message and a machine-readable code. Details
//! of 500s are logged server-side only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::jwt::JwtValidationError;
use serde::Serialize;
use thiserror::Error;

/// Admin gate error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing Bearer token")]
    MissingBearerToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,

    #[error("Missing key id")]
    MissingKeyId,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid issuer")]
    IssuerMismatch,

    #[error("Failed to fetch signing keys: {0}")]
    KeyFetch(String),

    #[error("Unknown key id")]
    UnknownKeyId,

    #[error("Bad signature")]
    BadSignature,

    #[error("Not an admin")]
    NotAdmin,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingBearerToken
            | AuthError::MalformedToken
            | AuthError::UnsupportedAlgorithm
            | AuthError::MissingKeyId
            | AuthError::TokenExpired
            | AuthError::IssuerMismatch
            | AuthError::UnknownKeyId
            | AuthError::BadSignature => 401,
            AuthError::NotAdmin => 403,
            AuthError::KeyFetch(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingBearerToken => "MISSING_BEARER_TOKEN",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::UnsupportedAlgorithm => "UNSUPPORTED_ALGORITHM",
            AuthError::MissingKeyId => "MISSING_KEY_ID",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::IssuerMismatch => "ISSUER_MISMATCH",
            AuthError::KeyFetch(_) => "KEY_FETCH_ERROR",
            AuthError::UnknownKeyId => "UNKNOWN_KEY_ID",
            AuthError::BadSignature => "BAD_SIGNATURE",
            AuthError::NotAdmin => "NOT_ADMIN",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Bounded label for metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            AuthError::MissingBearerToken => "missing_bearer_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm => "unsupported_algorithm",
            AuthError::MissingKeyId => "missing_key_id",
            AuthError::TokenExpired => "token_expired",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::KeyFetch(_) => "key_fetch_error",
            AuthError::UnknownKeyId => "unknown_key_id",
            AuthError::BadSignature => "bad_signature",
            AuthError::NotAdmin => "not_admin",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to return to clients.
    ///
    /// Server-side details of 500s are replaced with a generic message.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::KeyFetch(_) => "Authentication service unavailable".to_string(),
            AuthError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<JwtValidationError> for AuthError {
    fn from(err: JwtValidationError) -> Self {
        match err {
            JwtValidationError::MalformedToken => AuthError::MalformedToken,
            JwtValidationError::UnsupportedAlgorithm => AuthError::UnsupportedAlgorithm,
            JwtValidationError::MissingKeyId => AuthError::MissingKeyId,
            JwtValidationError::TokenExpired => AuthError::TokenExpired,
            JwtValidationError::IssuerMismatch => AuthError::IssuerMismatch,
        }
    }
}

/// JSON error body: `{"error": "...", "code": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::KeyFetch(reason) => {
                tracing::error!(target: "menu_admin.errors", reason = %reason, "Key directory unavailable");
            }
            AuthError::Internal(reason) => {
                tracing::error!(target: "menu_admin.errors", reason = %reason, "Internal auth error");
            }
            _ => {}
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
        };

        let mut response = (status, Json(body)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"menu-admin\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    // Helper function to read the response body as JSON
    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn all_variants() -> Vec<AuthError> {
        vec![
            AuthError::MissingBearerToken,
            AuthError::MalformedToken,
            AuthError::UnsupportedAlgorithm,
            AuthError::MissingKeyId,
            AuthError::TokenExpired,
            AuthError::IssuerMismatch,
            AuthError::KeyFetch("status 503".to_string()),
            AuthError::UnknownKeyId,
            AuthError::BadSignature,
            AuthError::NotAdmin,
            AuthError::Internal("boom".to_string()),
        ]
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MissingBearerToken.status_code(), 401);
        assert_eq!(AuthError::MalformedToken.status_code(), 401);
        assert_eq!(AuthError::UnsupportedAlgorithm.status_code(), 401);
        assert_eq!(AuthError::MissingKeyId.status_code(), 401);
        assert_eq!(AuthError::TokenExpired.status_code(), 401);
        assert_eq!(AuthError::IssuerMismatch.status_code(), 401);
        assert_eq!(AuthError::UnknownKeyId.status_code(), 401);
        assert_eq!(AuthError::BadSignature.status_code(), 401);
        assert_eq!(AuthError::NotAdmin.status_code(), 403);
        assert_eq!(AuthError::KeyFetch("x".to_string()).status_code(), 500);
        assert_eq!(AuthError::Internal("x".to_string()).status_code(), 500);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            format!("{}", AuthError::MissingBearerToken),
            "Missing Bearer token"
        );
        assert_eq!(format!("{}", AuthError::NotAdmin), "Not an admin");
        assert_eq!(
            format!("{}", AuthError::KeyFetch("status 503".to_string())),
            "Failed to fetch signing keys: status 503"
        );
    }

    #[test]
    fn test_public_message_hides_internal_details() {
        let key_fetch = AuthError::KeyFetch("https://internal.example/jwks 503".to_string());
        assert_eq!(
            key_fetch.public_message(),
            "Authentication service unavailable"
        );

        let internal = AuthError::Internal("lock poisoned".to_string());
        assert_eq!(internal.public_message(), "An internal error occurred");

        assert_eq!(AuthError::TokenExpired.public_message(), "Token expired");
    }

    #[test]
    fn test_codes_and_labels_are_unique() {
        let variants = all_variants();
        let codes: std::collections::HashSet<_> = variants.iter().map(AuthError::code).collect();
        let labels: std::collections::HashSet<_> =
            variants.iter().map(AuthError::metric_label).collect();

        assert_eq!(codes.len(), variants.len());
        assert_eq!(labels.len(), variants.len());
    }

    #[test]
    fn test_from_jwt_validation_error() {
        assert_eq!(
            AuthError::from(JwtValidationError::MalformedToken),
            AuthError::MalformedToken
        );
        assert_eq!(
            AuthError::from(JwtValidationError::UnsupportedAlgorithm),
            AuthError::UnsupportedAlgorithm
        );
        assert_eq!(
            AuthError::from(JwtValidationError::MissingKeyId),
            AuthError::MissingKeyId
        );
        assert_eq!(
            AuthError::from(JwtValidationError::TokenExpired),
            AuthError::TokenExpired
        );
        assert_eq!(
            AuthError::from(JwtValidationError::IssuerMismatch),
            AuthError::IssuerMismatch
        );
    }

    #[tokio::test]
    async fn test_into_response_unauthorized() {
        let response = AuthError::TokenExpired.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Check WWW-Authenticate header
        let www_auth = response.headers().get("WWW-Authenticate");
        assert!(www_auth.is_some());
        let www_auth_str = www_auth.unwrap().to_str().unwrap();
        assert!(www_auth_str.contains("Bearer realm=\"menu-admin\""));

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "Token expired");
        assert_eq!(body_json["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_into_response_forbidden() {
        let response = AuthError::NotAdmin.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get("WWW-Authenticate").is_none());

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "Not an admin");
        assert_eq!(body_json["code"], "NOT_ADMIN");
    }

    #[tokio::test]
    async fn test_into_response_key_fetch_error() {
        let error = AuthError::KeyFetch("JWKS endpoint returned 503".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "Authentication service unavailable");
        assert_eq!(body_json["code"], "KEY_FETCH_ERROR");
        assert!(!body_json.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_into_response_internal() {
        let response = AuthError::Internal("lock poisoned".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "An internal error occurred");
        assert_eq!(body_json["code"], "INTERNAL_ERROR");
    }
}
