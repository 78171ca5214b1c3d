//! Common utilities and types shared across the menu platform services.

#![warn(clippy::pedantic)]

/// Module for bearer token decoding and claim validation
pub mod jwt;

/// Module for JSON Web Key sets and RS256 signature verification
pub mod jwk;
