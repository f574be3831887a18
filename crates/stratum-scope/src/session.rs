//! Scope-enforced session wrapper
//!
//! The manager's session factory wraps every backend session in a
//! `ScopedSession` so tenant-scoped operations cannot reach the backend
//! without passing resource identifiers through the guard first.

use std::sync::Arc;

use stratum_core::{Result, TenantId};

use crate::guard::ScopeGuard;

/// An opaque backend session bound to its owning tenant and guard.
#[derive(Debug)]
pub struct ScopedSession<S> {
    tenant_id: TenantId,
    guard: Arc<ScopeGuard>,
    inner: S,
}

impl<S> ScopedSession<S> {
    pub fn new(tenant_id: TenantId, guard: Arc<ScopeGuard>, inner: S) -> Self {
        Self {
            tenant_id,
            guard,
            inner,
        }
    }

    /// The owning tenant.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// The wrapped backend session.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Scope a raw identifier to this session's tenant.
    pub fn scope(&self, raw: &str) -> String {
        self.guard.scope_uri(raw, &self.tenant_id)
    }

    /// Enforce that an identifier belongs to this session's tenant.
    /// Call this before dispatching any operation that consumes `uri`.
    pub fn check_access(&self, uri: &str) -> Result<()> {
        self.guard.enforce(uri, &self.tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::Error;

    fn session(tenant: &str) -> ScopedSession<&'static str> {
        ScopedSession::new(
            TenantId::parse(tenant).unwrap(),
            Arc::new(ScopeGuard::default()),
            "backend",
        )
    }

    #[test]
    fn test_scope_and_check_own_resources() {
        let s = session("tenant001");
        let uri = s.scope("tables/users");
        assert_eq!(uri, "resource://tenant001/tables/users");
        assert!(s.check_access(&uri).is_ok());
        assert_eq!(*s.inner(), "backend");
    }

    #[test]
    fn test_check_rejects_foreign_scope() {
        let s1 = session("tenant001");
        let s2 = session("tenant002");
        let foreign = s2.scope("tables/users");

        assert!(matches!(
            s1.check_access(&foreign),
            Err(Error::ForbiddenAccess { .. })
        ));
    }
}
