//! Test server harness for E2E testing
//!
//! Provides `TestMenuAdminServer` for spawning real menu admin instances.

use menu_admin::config::Config;
use menu_admin::routes::{self, init_metrics_recorder, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers in one test binary.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Prometheus handle shared by every server in the process.
///
/// The first call installs the global recorder; if another recorder is
/// already installed a detached handle is returned instead.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the menu admin server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let jwks = MockJwksServer::serving(&[&TestSigningKey::primary()]).await;
/// let server = TestMenuAdminServer::spawn(&jwks.base_url(), "a@b.com").await?;
/// let response = reqwest::get(format!("{}/health", server.url())).await?;
/// assert_eq!(response.status(), 200);
/// ```
pub struct TestMenuAdminServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestMenuAdminServer {
    /// Spawn a server trusting `supabase_url` with the given allowlist.
    pub async fn spawn(supabase_url: &str, admin_emails: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::from([
            ("SUPABASE_URL".to_string(), supabase_url.to_string()),
            ("ADMIN_EMAILS".to_string(), admin_emails.to_string()),
        ]))
        .await
    }

    /// Spawn a server from raw configuration variables.
    ///
    /// `BIND_ADDRESS` is ignored; the server always binds 127.0.0.1:0.
    pub async fn spawn_with_vars(vars: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::new(config.clone()));
        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestMenuAdminServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
