//! # Menu Admin Test Utilities
//!
//! Shared test utilities for the menu admin service.
//!
//! This crate provides:
//! - Fixed RSA signing keys and their JWKs (`crypto_fixtures`)
//! - A fluent token builder that signs RS256 tokens (`token_builders`)
//! - A wiremock-backed JWKS endpoint (`jwks_mock`)
//! - Server test harness (`TestMenuAdminServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use menu_admin_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let key = TestSigningKey::primary();
//!     let jwks = MockJwksServer::serving(&[&key]).await;
//!     let server = TestMenuAdminServer::spawn(&jwks.base_url(), "a@b.com").await?;
//!
//!     let token = TestTokenBuilder::new(&jwks.base_url())
//!         .with_email("a@b.com")
//!         .sign(&key);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/admin/session", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_mock;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_mock::*;
pub use server_harness::*;
pub use token_builders::*;
