//! Authentication and admin authorization.
//!
//! - `claims` - Verified token claims
//! - `jwks` - Key directory and JWKS cache
//! - `jwt` - Token verification pipeline
//! - `policy` - Admin email allowlist
//! - `gate` - Bearer extraction plus verification plus allowlist

pub mod claims;
pub mod gate;
pub mod jwks;
pub mod jwt;
pub mod policy;

pub use claims::Claims;
pub use gate::{parse_bearer, AdminGate, AuthOutcome};
pub use jwks::{HttpKeyDirectory, JwksClient, KeyDirectory};
pub use jwt::JwtVerifier;
pub use policy::{parse_admin_emails, AdminPolicy, AdmissionMode};
