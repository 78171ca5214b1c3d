//! Menu Admin Service Library
//!
//! The access gate in front of the digital menu's admin operations on
//! stores, categories and products:
//!
//! - Bearer token verification (RS256, keys from the auth service JWKS)
//! - Admin email allowlist
//! - A small HTTP surface exposing the gate
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> auth/gate.rs -> auth/jwt.rs -> auth/jwks.rs
//!                                                     -> auth/policy.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Token verification, key cache and allowlist
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Admin gate and HTTP metrics middleware
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
