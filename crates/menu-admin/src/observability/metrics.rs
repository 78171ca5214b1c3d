//! Metrics definitions for the menu admin service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `menu_admin_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: known paths plus `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: `success` plus one value per `AuthError` variant

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("menu_admin_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Validations include a JWKS fetch on cache miss
        .set_buckets_for_metric(
            Matcher::Prefix("menu_admin_token_validation".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("menu_admin_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `menu_admin_http_requests_total`, `menu_admin_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, plus `status_code` (exact) on the counter
/// and `status` (category) on the histogram
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("menu_admin_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("menu_admin_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// Unknown paths collapse to `/other`.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/admin/session" => "/api/admin/session",
        "/api/admin/authorize" => "/api/admin/authorize",
        _ => "/other",
    }
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Record the outcome of one admin gate check
///
/// Metric: `menu_admin_token_validations_total`, `menu_admin_token_validation_duration_seconds`
/// Labels: `outcome` (`success` or an `AuthError` metric label)
pub fn record_token_validation(outcome: &'static str, duration: Duration) {
    histogram!("menu_admin_token_validation_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("menu_admin_token_validations_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one JWKS fetch
///
/// Metric: `menu_admin_jwks_fetches_total`, `menu_admin_jwks_fetch_duration_seconds`
/// Labels: `status` (success, error)
pub fn record_jwks_fetch(status: &'static str, duration: Duration) {
    histogram!("menu_admin_jwks_fetch_duration_seconds",
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("menu_admin_jwks_fetches_total",
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Most tests execute the recording functions against the global no-op
    // recorder. Label values are checked with a thread-local debugging
    // recorder so parallel tests cannot interfere.

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, Duration::from_millis(5));
        record_http_request("GET", "/api/admin/session", 200, Duration::from_millis(50));
        record_http_request("GET", "/api/admin/session", 401, Duration::from_millis(3));
        record_http_request("POST", "/api/admin/authorize", 403, Duration::from_millis(40));
        record_http_request("GET", "/unknown/path", 404, Duration::from_millis(1));
        record_http_request("GET", "/api/admin/session", 408, Duration::from_secs(30));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(299), "success");

        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");

        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(403), "error");
        assert_eq!(categorize_status_code(404), "error");
        assert_eq!(categorize_status_code(500), "error");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/"), "/");
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/api/admin/session"), "/api/admin/session");
        assert_eq!(
            normalize_endpoint("/api/admin/authorize"),
            "/api/admin/authorize"
        );
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/api/admin/products/123"), "/other");
        assert_eq!(normalize_endpoint("/api/admin/session/extra"), "/other");
        assert_eq!(normalize_endpoint("/random"), "/other");
    }

    #[test]
    fn test_record_token_validation() {
        record_token_validation("success", Duration::from_millis(2));
        record_token_validation("token_expired", Duration::from_micros(150));
        record_token_validation("not_admin", Duration::from_millis(3));
        record_token_validation("key_fetch_error", Duration::from_secs(10));
    }

    #[test]
    fn test_token_validation_counter_labels() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_token_validation("success", Duration::from_millis(1));
            record_token_validation("success", Duration::from_millis(1));
            record_token_validation("not_admin", Duration::from_millis(1));
        });

        let counters: Vec<(String, u64)> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter_map(|(composite, _, _, value)| {
                let key = composite.key();
                match value {
                    DebugValue::Counter(count)
                        if key.name() == "menu_admin_token_validations_total" =>
                    {
                        let outcome = key
                            .labels()
                            .find(|label| label.key() == "outcome")
                            .map(|label| label.value().to_string())?;
                        Some((outcome, count))
                    }
                    _ => None,
                }
            })
            .collect();

        assert!(counters.contains(&("success".to_string(), 2)));
        assert!(counters.contains(&("not_admin".to_string(), 1)));
    }

    #[test]
    fn test_http_request_metric_labels() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/api/admin/session", 403, Duration::from_millis(4));
        });

        let mut counter_labels = Vec::new();
        let mut histogram_labels = Vec::new();
        for (composite, _, _, value) in snapshotter.snapshot().into_vec() {
            let key = composite.key();
            let labels: Vec<(String, String)> = key
                .labels()
                .map(|label| (label.key().to_string(), label.value().to_string()))
                .collect();
            match value {
                DebugValue::Counter(_) if key.name() == "menu_admin_http_requests_total" => {
                    counter_labels = labels;
                }
                DebugValue::Histogram(_)
                    if key.name() == "menu_admin_http_request_duration_seconds" =>
                {
                    histogram_labels = labels;
                }
                _ => {}
            }
        }

        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());
        assert!(counter_labels.contains(&pair("method", "GET")));
        assert!(counter_labels.contains(&pair("endpoint", "/api/admin/session")));
        assert!(counter_labels.contains(&pair("status_code", "403")));
        assert!(histogram_labels.contains(&pair("status", "error")));
    }

    #[test]
    fn test_record_jwks_fetch() {
        record_jwks_fetch("success", Duration::from_millis(80));
        record_jwks_fetch("error", Duration::from_secs(10));
    }
}
