//! JWKS client for fetching and caching the auth service's signing keys.
//!
//! Keys are fetched from `<base>/auth/v1/.well-known/jwks.json` through a
//! [`KeyDirectory`] and cached with a configurable TTL.
//!
//! # Security
//!
//! - Keys are cached to reduce load on the auth service and improve latency
//! - A `kid` missing from a fresh cache forces one refresh to pick up rotations
//! - A TTL of zero disables caching entirely
//! - An optional minimum interval bounds how often unknown `kid`s can force
//!   refreshes

use crate::errors::AuthError;
use crate::observability::metrics::record_jwks_fetch;
use async_trait::async_trait;
use common::jwk::{Jwk, JwkSet};
use common::jwt::jwks_url;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Default timeout for one JWKS request in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Source of signing keys for an issuer.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    /// Fetch the current key set for `issuer_base_url`.
    ///
    /// One attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyFetch` on transport failure, a non-2xx status
    /// or a body that is not JSON.
    async fn fetch_keys(&self, issuer_base_url: &str) -> Result<JwkSet, AuthError>;
}

/// Key directory backed by the auth service's JWKS endpoint.
pub struct HttpKeyDirectory {
    http_client: reqwest::Client,
}

impl HttpKeyDirectory {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS))
    }

    /// Create a directory whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "menu_admin.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self { http_client }
    }
}

impl Default for HttpKeyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyDirectory for HttpKeyDirectory {
    #[instrument(skip(self), name = "menu_admin.auth.jwks.fetch")]
    async fn fetch_keys(&self, issuer_base_url: &str) -> Result<JwkSet, AuthError> {
        let url = jwks_url(issuer_base_url);
        tracing::debug!(target: "menu_admin.auth.jwks", url = %url, "Fetching JWKS");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::error!(target: "menu_admin.auth.jwks", error = %e, "Failed to fetch JWKS");
            AuthError::KeyFetch(format!("request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                target: "menu_admin.auth.jwks",
                status = %status,
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeyFetch(format!(
                "JWKS endpoint returned {}",
                status.as_u16()
            )));
        }

        let document: serde_json::Value = response.json().await.map_err(|e| {
            tracing::error!(target: "menu_admin.auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeyFetch(format!("invalid JWKS body: {e}"))
        })?;

        Ok(JwkSet::from_document(&document))
    }
}

/// Cached key set with expiry time.
struct CachedJwks {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Caching JWKS client for one issuer.
///
/// Thread-safe: lookups share a read lock, refreshes take the write lock only
/// after the network fetch has completed.
pub struct JwksClient {
    /// Auth service base URL the keys belong to.
    issuer_base_url: String,

    /// Where keys come from.
    directory: Arc<dyn KeyDirectory>,

    cache: RwLock<Option<CachedJwks>>,

    /// Cache TTL duration. Zero disables caching.
    cache_ttl: Duration,

    /// Minimum age of the cached set before an unknown `kid` may force a
    /// refresh. Zero always refreshes.
    min_refresh_interval: Duration,
}

impl JwksClient {
    /// Create a client fetching over HTTP with default TTL and timeout.
    pub fn new(issuer_base_url: String) -> Self {
        Self::with_directory(
            issuer_base_url,
            Arc::new(HttpKeyDirectory::new()),
            Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
        )
    }

    /// Create a client with a custom key directory and cache TTL.
    ///
    /// # Arguments
    ///
    /// * `issuer_base_url` - Auth service base URL, without trailing slash
    /// * `directory` - Source of key sets
    /// * `cache_ttl` - How long a fetched set is trusted; zero disables caching
    pub fn with_directory(
        issuer_base_url: String,
        directory: Arc<dyn KeyDirectory>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            issuer_base_url,
            directory,
            cache: RwLock::new(None),
            cache_ttl,
            min_refresh_interval: Duration::ZERO,
        }
    }

    /// Suppress forced refreshes while the cached set is younger than
    /// `interval`. Unknown `kid`s inside that window fail without a fetch.
    #[must_use]
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn issuer_base_url(&self) -> &str {
        &self.issuer_base_url
    }

    /// Get a JWK by key ID.
    ///
    /// Serves from cache while fresh. A `kid` absent from a fresh cache
    /// triggers exactly one refresh before giving up, unless the cached set
    /// is younger than the minimum refresh interval.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyFetch` if the key set cannot be fetched.
    /// Returns `AuthError::UnknownKeyId` if no key has this `kid`.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if self.cache_ttl.is_zero() {
            let keys = self.fetch().await?;
            return find_key(&keys, kid);
        }

        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(key) = cached.keys.find_key(kid) {
                        tracing::debug!(target: "menu_admin.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    if cached.fetched_at.elapsed() < self.min_refresh_interval {
                        tracing::warn!(target: "menu_admin.auth.jwks", kid = %kid, "Key not in fresh cache, refresh suppressed");
                        return Err(AuthError::UnknownKeyId);
                    }
                    tracing::debug!(target: "menu_admin.auth.jwks", kid = %kid, "Key not in fresh cache, forcing refresh");
                }
            }
        }

        // Cache miss, expired, or unknown kid - fetch fresh JWKS once
        let keys = self.refresh_cache().await?;
        find_key(&keys, kid)
    }

    /// Refresh the cache and return the fresh key set.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<JwkSet, AuthError> {
        let keys = self.fetch().await?;

        let fetched_at = Instant::now();
        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys: keys.clone(),
            fetched_at,
            expires_at: fetched_at + self.cache_ttl,
        });

        Ok(keys)
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let start = Instant::now();
        let result = self.directory.fetch_keys(&self.issuer_base_url).await;

        match &result {
            Ok(keys) => {
                record_jwks_fetch("success", start.elapsed());
                tracing::info!(
                    target: "menu_admin.auth.jwks",
                    key_count = keys.len(),
                    "JWKS fetched"
                );
            }
            Err(_) => record_jwks_fetch("error", start.elapsed()),
        }

        result
    }
}

fn find_key(keys: &JwkSet, kid: &str) -> Result<Jwk, AuthError> {
    keys.find_key(kid).cloned().ok_or_else(|| {
        tracing::warn!(target: "menu_admin.auth.jwks", kid = %kid, "Key not found in JWKS");
        AuthError::UnknownKeyId
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: kid.to_string(),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
            n: Some("AQAB".to_string()),
            e: Some("AQAB".to_string()),
            crv: None,
            x: None,
            y: None,
        }
    }

    /// Directory serving a swappable key set and counting fetches.
    struct CountingDirectory {
        keys: Mutex<Vec<Jwk>>,
        fetches: AtomicUsize,
        fail: bool,
    }

    impl CountingDirectory {
        fn serving(kids: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                keys: Mutex::new(kids.iter().map(|kid| rsa_jwk(kid)).collect()),
                fetches: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                keys: Mutex::new(Vec::new()),
                fetches: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn rotate_to(&self, kids: &[&str]) {
            *self.keys.lock().unwrap() = kids.iter().map(|kid| rsa_jwk(kid)).collect();
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeyDirectory for CountingDirectory {
        async fn fetch_keys(&self, issuer_base_url: &str) -> Result<JwkSet, AuthError> {
            assert_eq!(issuer_base_url, "https://project.supabase.co");
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AuthError::KeyFetch("status 500".to_string()));
            }
            Ok(JwkSet::new(self.keys.lock().unwrap().clone()))
        }
    }

    fn client(directory: Arc<CountingDirectory>, ttl_secs: u64) -> JwksClient {
        JwksClient::with_directory(
            "https://project.supabase.co".to_string(),
            directory,
            Duration::from_secs(ttl_secs),
        )
    }

    #[tokio::test]
    async fn test_get_key_fetches_on_first_use() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 300);

        let key = client.get_key("key-1").await.unwrap();

        assert_eq!(key.kid, "key-1");
        assert_eq!(directory.fetches(), 1);
    }

    #[tokio::test]
    async fn test_second_lookup_within_ttl_uses_cache() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 300);

        client.get_key("key-1").await.unwrap();
        client.get_key("key-1").await.unwrap();
        client.get_key("key-1").await.unwrap();

        assert_eq!(directory.fetches(), 1);
    }

    #[tokio::test]
    async fn test_unknown_kid_forces_exactly_one_refresh() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 300);

        client.get_key("key-1").await.unwrap();
        let result = client.get_key("key-2").await;

        assert_eq!(result.unwrap_err(), AuthError::UnknownKeyId);
        assert_eq!(directory.fetches(), 2);
    }

    #[tokio::test]
    async fn test_forced_refresh_picks_up_rotated_key() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 300);

        client.get_key("key-1").await.unwrap();
        directory.rotate_to(&["key-1", "key-2"]);

        let key = client.get_key("key-2").await.unwrap();

        assert_eq!(key.kid, "key-2");
        assert_eq!(directory.fetches(), 2);

        // The refreshed set is cached again
        client.get_key("key-2").await.unwrap();
        assert_eq!(directory.fetches(), 2);
    }

    #[tokio::test]
    async fn test_unknown_kid_on_empty_cache_fetches_once() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 300);

        let result = client.get_key("missing").await;

        assert_eq!(result.unwrap_err(), AuthError::UnknownKeyId);
        assert_eq!(directory.fetches(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_fetches_every_call() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 0);

        client.get_key("key-1").await.unwrap();
        client.get_key("key-1").await.unwrap();
        let missing = client.get_key("missing").await;

        assert_eq!(missing.unwrap_err(), AuthError::UnknownKeyId);
        assert_eq!(directory.fetches(), 3);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_and_is_not_cached() {
        let directory = CountingDirectory::failing();
        let client = client(directory.clone(), 300);

        let first = client.get_key("key-1").await;
        let second = client.get_key("key-1").await;

        assert!(matches!(first, Err(AuthError::KeyFetch(_))));
        assert!(matches!(second, Err(AuthError::KeyFetch(_))));
        assert_eq!(directory.fetches(), 2);
    }

    #[tokio::test]
    async fn test_min_refresh_interval_suppresses_repeated_unknown_kids() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 300)
            .with_min_refresh_interval(Duration::from_secs(60));

        client.get_key("key-1").await.unwrap();
        for kid in ["random-1", "random-2", "random-3"] {
            let result = client.get_key(kid).await;
            assert_eq!(result.unwrap_err(), AuthError::UnknownKeyId);
        }

        assert_eq!(directory.fetches(), 1);

        // Known keys are still served from cache
        assert_eq!(client.get_key("key-1").await.unwrap().kid, "key-1");
        assert_eq!(directory.fetches(), 1);
    }

    #[tokio::test]
    async fn test_min_refresh_interval_elapsed_allows_refresh() {
        let directory = CountingDirectory::serving(&["key-1"]);
        let client = client(directory.clone(), 300)
            .with_min_refresh_interval(Duration::from_millis(20));

        client.get_key("key-1").await.unwrap();
        directory.rotate_to(&["key-1", "key-2"]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let key = client.get_key("key-2").await.unwrap();

        assert_eq!(key.kid, "key-2");
        assert_eq!(directory.fetches(), 2);
    }

    #[tokio::test]
    async fn test_http_directory_unreachable_is_key_fetch_error() {
        let directory = HttpKeyDirectory::with_timeout(Duration::from_secs(1));

        // Port 9 (discard) on localhost is not expected to serve HTTP
        let result = directory.fetch_keys("http://127.0.0.1:9").await;

        assert!(matches!(result, Err(AuthError::KeyFetch(_))));
    }
}
