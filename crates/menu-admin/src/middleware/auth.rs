//! Admin gate middleware for protected routes.
//!
//! Runs the shared [`AdminGate`] on the Authorization header and injects the
//! verified claims into request extensions.

use crate::auth::AdminGate;
use crate::errors::AuthError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use tracing::instrument;

/// Admin gate middleware.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 with `WWW-Authenticate` if the token is missing or invalid
/// - 403 if the verified subject is not an admin
/// - 500 if the signing keys cannot be fetched
/// - Otherwise continues to the handler with `Claims` in extensions
#[instrument(skip(gate, req, next), name = "menu_admin.middleware.auth")]
pub async fn require_admin(
    State(gate): State<AdminGate>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let claims = gate.check(authorization).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
