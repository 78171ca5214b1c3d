//! Mock auth service JWKS endpoint.

use crate::crypto_fixtures::{jwks_document, TestSigningKey};
use common::jwt::{ISSUER_PATH, JWKS_PATH};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wiremock server publishing a JWKS at `/auth/v1/.well-known/jwks.json`.
///
/// Its URI is the auth service base URL: tokens must be issued by
/// `<base_url>/auth/v1`.
pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    /// Serve the given keys.
    pub async fn serving(keys: &[&TestSigningKey]) -> Self {
        Self::with_response(ResponseTemplate::new(200).set_body_json(jwks_document(keys))).await
    }

    /// Serve an arbitrary JSON document.
    pub async fn serving_document(document: Value) -> Self {
        Self::with_response(ResponseTemplate::new(200).set_body_json(document)).await
    }

    /// Respond with `status` and an empty body.
    pub async fn failing(status: u16) -> Self {
        Self::with_response(ResponseTemplate::new(status)).await
    }

    pub async fn with_response(response: ResponseTemplate) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(jwks_path()))
            .respond_with(response)
            .mount(&server)
            .await;
        Self { server }
    }

    /// Replace what the endpoint serves, e.g. after a key rotation.
    pub async fn rotate_to(&self, keys: &[&TestSigningKey]) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(jwks_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_document(keys)))
            .mount(&self.server)
            .await;
    }

    /// Auth service base URL (no trailing slash).
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Number of JWKS requests received so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|request| request.url.path() == jwks_path())
                    .count()
            })
            .unwrap_or(0)
    }
}

fn jwks_path() -> String {
    format!("{ISSUER_PATH}{JWKS_PATH}")
}
