//! HTTP routes for the menu admin service.
//!
//! Defines the Axum router and application state.

use crate::auth::{AdminGate, AdminPolicy, HttpKeyDirectory, JwksClient, JwtVerifier, KeyDirectory};
use crate::config::{Config, REQUEST_TIMEOUT_SECONDS};
use crate::errors::AuthError;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_admin};
use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// The shared admin gate.
    pub gate: AdminGate,
}

impl AppState {
    /// Build state whose gate fetches keys over HTTP.
    pub fn new(config: Config) -> Self {
        let directory = Arc::new(HttpKeyDirectory::with_timeout(Duration::from_secs(
            config.jwks_http_timeout_seconds,
        )));
        Self::with_directory(config, directory)
    }

    /// Build state with a custom key directory.
    pub fn with_directory(config: Config, directory: Arc<dyn KeyDirectory>) -> Self {
        let jwks_client = Arc::new(
            JwksClient::with_directory(
                config.supabase_url.clone(),
                directory,
                Duration::from_secs(config.jwks_cache_ttl_seconds),
            )
            .with_min_refresh_interval(Duration::from_secs(
                config.jwks_min_refresh_interval_seconds,
            )),
        );
        let verifier = Arc::new(JwtVerifier::new(jwks_client));
        let gate = AdminGate::new(verifier, AdminPolicy::new(config.admin_emails.clone()));

        Self { config, gate }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/admin/session` - Verified admin identity - behind the admin gate
/// - `/api/admin/authorize` - Gate decision for a forwarded header - public,
///   the gate runs inside the handler
/// - Panics converted to a 500 `INTERNAL_ERROR` response
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - `REQUEST_TIMEOUT_SECONDS` request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let gate = state.gate.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/admin/authorize", post(handlers::authorize))
        .with_state(gate.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Admin routes (admin gate required)
    let admin_routes = Router::new()
        .route("/api/admin/session", get(handlers::get_session))
        .route_layer(middleware::from_fn_with_state(gate, require_admin));

    with_service_layers(public_routes.merge(metrics_routes).merge(admin_routes))
}

/// Wrap a router in the service-wide layer stack.
///
/// Layer order (bottom-to-top execution):
/// 1. CatchPanicLayer - Turn handler panics into 500s (innermost)
/// 2. TraceLayer - Log request details
/// 3. TimeoutLayer - Timeout the request
/// 4. http_metrics_middleware - Record ALL responses (outermost)
fn with_service_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECONDS)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AuthError::Internal(format!("handler panicked: {detail}")).into_response()
}
