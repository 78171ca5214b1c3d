//! The admin gate: bearer extraction, token verification, allowlist.
//!
//! Every admin operation runs through [`AdminGate::check`]. Handlers that
//! want a decision object instead of an error use [`AdminGate::outcome`].

use crate::auth::claims::Claims;
use crate::auth::jwt::JwtVerifier;
use crate::auth::policy::AdminPolicy;
use crate::errors::AuthError;
use crate::observability::metrics::record_token_validation;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Tri-state gate decision: admitted, rejected, or failed.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub ok: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Claims>,
}

impl AuthOutcome {
    pub fn admitted(claims: Claims) -> Self {
        Self {
            ok: true,
            status: 200,
            error: None,
            code: None,
            claims: Some(claims),
        }
    }

    pub fn rejected(error: &AuthError) -> Self {
        Self {
            ok: false,
            status: error.status_code(),
            error: Some(error.public_message()),
            code: Some(error.code().to_string()),
            claims: None,
        }
    }
}

impl From<Result<Claims, AuthError>> for AuthOutcome {
    fn from(result: Result<Claims, AuthError>) -> Self {
        match result {
            Ok(claims) => AuthOutcome::admitted(claims),
            Err(e) => AuthOutcome::rejected(&e),
        }
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively and must be followed by at
/// least one whitespace character. Surrounding whitespace around the token is
/// ignored.
///
/// # Errors
///
/// Returns `AuthError::MissingBearerToken` when the header is absent, uses
/// another scheme, or carries an empty token.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim_start).unwrap_or_default();

    let scheme = header.get(..6).unwrap_or_default();
    let rest = header.get(6..).unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") || !rest.starts_with(char::is_whitespace) {
        return Err(AuthError::MissingBearerToken);
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthError::MissingBearerToken);
    }

    Ok(token)
}

/// Shared admin authorization gate.
#[derive(Clone)]
pub struct AdminGate {
    verifier: Arc<JwtVerifier>,
    policy: Arc<AdminPolicy>,
}

impl AdminGate {
    pub fn new(verifier: Arc<JwtVerifier>, policy: AdminPolicy) -> Self {
        Self {
            verifier,
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    /// Run the gate on an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Any [`AuthError`] from bearer parsing, verification or the allowlist.
    pub async fn check(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        self.check_at(authorization, chrono::Utc::now().timestamp())
            .await
    }

    /// Run the gate as of `now` (Unix epoch seconds).
    ///
    /// # Errors
    ///
    /// See [`AdminGate::check`].
    #[instrument(skip_all, name = "menu_admin.auth.gate")]
    pub async fn check_at(
        &self,
        authorization: Option<&str>,
        now: i64,
    ) -> Result<Claims, AuthError> {
        let start = Instant::now();
        let result = self.run(authorization, now).await;

        match &result {
            Ok(_) => {
                record_token_validation("success", start.elapsed());
                tracing::debug!(target: "menu_admin.auth.gate", "Admin admitted");
            }
            Err(e) => {
                record_token_validation(e.metric_label(), start.elapsed());
                tracing::debug!(
                    target: "menu_admin.auth.gate",
                    code = e.code(),
                    status = e.status_code(),
                    "Admin rejected"
                );
            }
        }

        result
    }

    async fn run(&self, authorization: Option<&str>, now: i64) -> Result<Claims, AuthError> {
        let token = parse_bearer(authorization)?;
        let claims = self.verifier.verify_at(token, now).await?;
        self.policy.authorize(&claims)?;
        Ok(claims)
    }

    /// Run the gate and fold the result into an [`AuthOutcome`].
    pub async fn outcome(&self, authorization: Option<&str>) -> AuthOutcome {
        self.check(authorization).await.into()
    }
}
