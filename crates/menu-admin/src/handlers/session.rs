//! Current admin session handler.
//!
//! Returns the verified admin's identity from the token claims.

use crate::auth::Claims;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/admin/session`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Subject (user id).
    pub sub: Option<String>,

    /// Email used for the allowlist decision.
    pub email: Option<String>,

    /// Token expiration timestamp.
    pub exp: Option<i64>,

    /// The full verified payload.
    pub claims: Claims,
}

impl From<Claims> for SessionResponse {
    fn from(claims: Claims) -> Self {
        Self {
            sub: claims.sub().map(str::to_string),
            email: claims.email().map(str::to_string),
            exp: claims.exp(),
            claims,
        }
    }
}

/// Handler for GET /api/admin/session
///
/// Requires the admin gate middleware.
///
/// ## Response
///
/// ```json
/// {
///   "sub": "0b6f...",
///   "email": "owner@menu.com",
///   "exp": 1900000000,
///   "claims": { "sub": "0b6f...", "email": "owner@menu.com", "...": "..." }
/// }
/// ```
#[instrument(skip_all, name = "menu_admin.handlers.session")]
pub async fn get_session(Extension(claims): Extension<Claims>) -> Json<SessionResponse> {
    tracing::debug!(target: "menu_admin.handlers.session", "Returning admin session");
    Json(SessionResponse::from(claims))
}
