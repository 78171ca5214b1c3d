//! Admin allowlist policy.
//!
//! The allowlist is fixed at startup. An empty allowlist admits every
//! verified subject (`AdmissionMode::Open`); a non-empty one admits only the
//! listed emails, compared in lowercase.

use crate::auth::claims::Claims;
use crate::errors::AuthError;
use std::collections::BTreeSet;
use std::fmt;

/// How the policy decides admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionMode {
    /// Any verified subject is admitted.
    Open,
    /// Only subjects whose email is on the allowlist are admitted.
    Allowlist,
}

impl AdmissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionMode::Open => "open",
            AdmissionMode::Allowlist => "allowlist",
        }
    }
}

impl fmt::Display for AdmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a comma-separated email list.
///
/// Entries are trimmed and lowercased; empty entries are dropped.
pub fn parse_admin_emails(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Immutable admin allowlist.
#[derive(Clone, Default)]
pub struct AdminPolicy {
    allowlist: BTreeSet<String>,
}

impl AdminPolicy {
    /// Build a policy from already-normalized emails.
    pub fn new(allowlist: BTreeSet<String>) -> Self {
        Self { allowlist }
    }

    /// A policy admitting every verified subject.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AdmissionMode {
        if self.allowlist.is_empty() {
            AdmissionMode::Open
        } else {
            AdmissionMode::Allowlist
        }
    }

    pub fn len(&self) -> usize {
        self.allowlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowlist.is_empty()
    }

    /// Decide whether verified claims belong to an admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAdmin` when the allowlist is non-empty and the
    /// claims carry no email or an email not on the list.
    pub fn authorize(&self, claims: &Claims) -> Result<(), AuthError> {
        if self.allowlist.is_empty() {
            return Ok(());
        }

        let Some(email) = claims.email() else {
            tracing::debug!(target: "menu_admin.auth.policy", "Rejected: token carries no email");
            return Err(AuthError::NotAdmin);
        };

        if self.allowlist.contains(&email.to_lowercase()) {
            Ok(())
        } else {
            tracing::debug!(target: "menu_admin.auth.policy", "Rejected: email not on allowlist");
            Err(AuthError::NotAdmin)
        }
    }
}

/// Debug output reports only the size of the allowlist.
impl fmt::Debug for AdminPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminPolicy")
            .field("mode", &self.mode())
            .field("allowlist_len", &self.allowlist.len())
            .finish()
    }
}
