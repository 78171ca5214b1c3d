//! Liveness endpoint.

use axum::Json;
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Handler for GET /health
///
/// Always `{"status":"healthy"}` while the process serves requests. Key
/// directory reachability is not probed here.
#[instrument(skip_all, name = "menu_admin.health.check")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;

        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"status":"healthy"}"#
        );
    }
}
