//! Gate decision endpoint.
//!
//! Lets admin handlers hosted elsewhere ask for the gate's decision on a
//! forwarded Authorization header.

use crate::auth::{AdminGate, AuthOutcome};
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::instrument;

/// Handler for POST /api/admin/authorize
///
/// Responds with the [`AuthOutcome`] as JSON and its status as the HTTP
/// status: 200 admitted, 401 bad credential, 403 not an admin, 500 key
/// directory failure.
#[instrument(skip_all, name = "menu_admin.handlers.authorize")]
pub async fn authorize(State(gate): State<AdminGate>, headers: HeaderMap) -> impl IntoResponse {
    let authorization = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());

    let outcome: AuthOutcome = gate.outcome(authorization).await;
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Json(outcome))
}
