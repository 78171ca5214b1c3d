//! Menu admin configuration.
//!
//! Configuration is loaded from environment variables. The admin allowlist
//! is redacted in Debug output.

use crate::auth::policy::{parse_admin_emails, AdmissionMode};
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Maximum JWKS cache TTL in seconds (1 day).
pub const MAX_JWKS_CACHE_TTL_SECONDS: u64 = 86_400;

/// Default timeout for a single JWKS HTTP request in seconds.
pub const DEFAULT_JWKS_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Maximum timeout for a single JWKS HTTP request in seconds.
///
/// Kept below `REQUEST_TIMEOUT_SECONDS` so a stalled key directory surfaces
/// as a key fetch error rather than a request timeout.
pub const MAX_JWKS_HTTP_TIMEOUT_SECONDS: u64 = 25;

/// Timeout applied to every inbound HTTP request in seconds.
pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Default minimum spacing between forced JWKS refreshes (disabled).
pub const DEFAULT_JWKS_MIN_REFRESH_INTERVAL_SECONDS: u64 = 0;

/// Maximum minimum spacing between forced JWKS refreshes in seconds.
pub const MAX_JWKS_MIN_REFRESH_INTERVAL_SECONDS: u64 = 3_600;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// Menu admin configuration.
#[derive(Clone)]
pub struct Config {
    /// Auth service base URL, without trailing slash.
    /// The expected issuer and JWKS URL are derived from it.
    pub supabase_url: String,

    /// Lowercased admin emails. Empty means open admission.
    pub admin_emails: BTreeSet<String>,

    /// Refuse to start with an empty allowlist.
    pub allowlist_required: bool,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// JWKS cache TTL in seconds. 0 disables caching.
    pub jwks_cache_ttl_seconds: u64,

    /// Timeout for one JWKS HTTP request in seconds.
    pub jwks_http_timeout_seconds: u64,

    /// Minimum seconds between refreshes forced by an unknown `kid`.
    /// 0 refreshes on every unknown `kid`.
    pub jwks_min_refresh_interval_seconds: u64,

    /// Drain period after a shutdown signal, in seconds.
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts the admin allowlist.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url)
            .field("admin_emails", &format!("[{} REDACTED]", self.admin_emails.len()))
            .field("allowlist_required", &self.allowlist_required)
            .field("bind_address", &self.bind_address)
            .field("jwks_cache_ttl_seconds", &self.jwks_cache_ttl_seconds)
            .field("jwks_http_timeout_seconds", &self.jwks_http_timeout_seconds)
            .field(
                "jwks_min_refresh_interval_seconds",
                &self.jwks_min_refresh_interval_seconds,
            )
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid auth service URL: {0}")]
    InvalidSupabaseUrl(String),

    #[error("Admin allowlist is required but ADMIN_EMAILS is empty")]
    EmptyAllowlist,

    #[error("Invalid boolean configuration: {0}")]
    InvalidBool(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid JWKS HTTP timeout configuration: {0}")]
    InvalidHttpTimeout(String),

    #[error("Invalid JWKS refresh interval configuration: {0}")]
    InvalidRefreshInterval(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw_url = vars
            .get("SUPABASE_URL")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_URL".to_string()))?;

        let supabase_url = raw_url.trim_end_matches('/').to_string();
        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(ConfigError::InvalidSupabaseUrl(format!(
                "SUPABASE_URL must start with http:// or https://, got '{}'",
                supabase_url
            )));
        }

        let admin_emails = parse_admin_emails(vars.get("ADMIN_EMAILS").map_or("", String::as_str));

        let allowlist_required = match vars.get("ADMIN_ALLOWLIST_REQUIRED") {
            Some(value) => parse_bool("ADMIN_ALLOWLIST_REQUIRED", value)?,
            None => false,
        };

        if allowlist_required && admin_emails.is_empty() {
            return Err(ConfigError::EmptyAllowlist);
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Parse JWKS cache TTL with validation (0 allowed: no caching)
        let jwks_cache_ttl_seconds = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_JWKS_CACHE_TTL_SECONDS {
                return Err(ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must not exceed {} seconds, got {}",
                    MAX_JWKS_CACHE_TTL_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_JWKS_CACHE_TTL_SECONDS
        };

        // Parse JWKS HTTP timeout with validation
        let jwks_http_timeout_seconds =
            if let Some(value_str) = vars.get("JWKS_HTTP_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidHttpTimeout(format!(
                        "JWKS_HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_JWKS_HTTP_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidHttpTimeout(format!(
                        "JWKS_HTTP_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                        MAX_JWKS_HTTP_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_JWKS_HTTP_TIMEOUT_SECONDS
            };

        let jwks_min_refresh_interval_seconds =
            if let Some(value_str) = vars.get("JWKS_MIN_REFRESH_INTERVAL_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidRefreshInterval(format!(
                        "JWKS_MIN_REFRESH_INTERVAL_SECONDS must be a valid non-negative integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value > MAX_JWKS_MIN_REFRESH_INTERVAL_SECONDS {
                    return Err(ConfigError::InvalidRefreshInterval(format!(
                        "JWKS_MIN_REFRESH_INTERVAL_SECONDS must not exceed {} seconds, got {}",
                        MAX_JWKS_MIN_REFRESH_INTERVAL_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_JWKS_MIN_REFRESH_INTERVAL_SECONDS
            };

        let drain_seconds = if let Some(value_str) = vars.get("ADMIN_DRAIN_SECONDS") {
            value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "ADMIN_DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            supabase_url,
            admin_emails,
            allowlist_required,
            bind_address,
            jwks_cache_ttl_seconds,
            jwks_http_timeout_seconds,
            jwks_min_refresh_interval_seconds,
            drain_seconds,
        })
    }

    /// Admission mode implied by the configured allowlist.
    pub fn admission_mode(&self) -> AdmissionMode {
        if self.admin_emails.is_empty() {
            AdmissionMode::Open
        } else {
            AdmissionMode::Allowlist
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidBool(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}
