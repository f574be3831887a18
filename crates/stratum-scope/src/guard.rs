//! Resource identifier scoping and validation

use tracing::debug;

use stratum_core::{Error, Result, TenantId};

use crate::audit::AuditRecord;

/// Default URI scheme for tenant-scoped resources.
pub const DEFAULT_SCHEME: &str = "resource";

/// Stamps and validates tenant ownership of resource identifiers.
///
/// For all tenants T1 != T2 and any identifier scoped to T2,
/// `validate_access(uri, T1)` is false. Upstream handlers must call
/// [`ScopeGuard::enforce`] before dispatching any tenant operation that
/// consumes a resource identifier.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    scheme: String,
}

impl Default for ScopeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME).expect("default scheme is valid")
    }
}

impl ScopeGuard {
    /// Create a guard with an explicit URI scheme. The scheme must be
    /// non-empty lowercase ASCII alphanumeric.
    pub fn new(scheme: impl Into<String>) -> Result<Self> {
        let scheme = scheme.into();
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(Error::internal(format!("invalid URI scheme: {:?}", scheme)));
        }
        Ok(Self { scheme })
    }

    /// The guard's URI scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn prefix(&self, tenant_id: &TenantId) -> String {
        format!("{}://{}/", self.scheme, tenant_id)
    }

    /// Scope a raw identifier to a tenant.
    ///
    /// - Already scoped to this tenant: returned unchanged.
    /// - Scoped to a different tenant: re-scoped, the other tenant's scope
    ///   is stripped.
    /// - Unscoped: prefixed with `scheme://{tenant_id}/`.
    pub fn scope_uri(&self, raw: &str, tenant_id: &TenantId) -> String {
        if self.validate_access(raw, tenant_id) {
            return raw.to_string();
        }

        if let Some((_, path)) = self.split_scoped(raw) {
            debug!(tenant_id = %tenant_id, "re-scoping identifier from another tenant");
            return format!("{}{}", self.prefix(tenant_id), path);
        }

        format!("{}{}", self.prefix(tenant_id), raw.trim_start_matches('/'))
    }

    /// Whether `uri` is scoped to `tenant_id`.
    pub fn validate_access(&self, uri: &str, tenant_id: &TenantId) -> bool {
        uri.starts_with(&self.prefix(tenant_id))
    }

    /// Validate, raising `ForbiddenAccess` and emitting a security audit
    /// record when the identifier belongs to another scope.
    pub fn enforce(&self, uri: &str, tenant_id: &TenantId) -> Result<()> {
        if self.validate_access(uri, tenant_id) {
            return Ok(());
        }

        let record = AuditRecord::forbidden_access(tenant_id.as_str(), uri);
        record.emit();
        Err(Error::ForbiddenAccess {
            tenant_id: tenant_id.to_string(),
            attempted_uri: record.attempted_uri,
        })
    }

    /// Split `scheme://{owner}/{path}` into owner and path, if `uri` is a
    /// well-formed scoped identifier under this guard's scheme.
    fn split_scoped<'a>(&self, uri: &'a str) -> Option<(&'a str, &'a str)> {
        let rest = uri.strip_prefix(&self.scheme)?.strip_prefix("://")?;
        let (owner, path) = rest.split_once('/')?;
        if owner.is_empty() {
            return None;
        }
        Some((owner, path))
    }
}
