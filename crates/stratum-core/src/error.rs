//! Error types for Stratum Core
//!
//! The error surface is deliberately closed: lower layers raise one of the
//! specific variants, and the manager wraps anything unclassified as
//! `Internal` so callers only ever match on four cases.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Tenant id failed format validation (empty, wrong length, or
    /// non-alphanumeric). Surfaced immediately, never retried.
    #[error("Invalid tenant id: {0:?}")]
    InvalidTenantId(String),

    /// No valid backing configuration record exists for the tenant.
    #[error("Tenant not configured: {0}")]
    TenantNotConfigured(String),

    /// A tenant attempted to use a resource identifier scoped to another
    /// tenant. Always surfaced and security-logged, never silently retried.
    #[error("Tenant {tenant_id} denied access to {attempted_uri}")]
    ForbiddenAccess {
        tenant_id: String,
        attempted_uri: String,
    },

    /// Any unclassified failure: malformed config data, an uncategorized
    /// session factory error, and so on.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an arbitrary failure as `Internal`.
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Error::Internal(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
