//! Tenant manager
//!
//! The manager wires the vault, pool, and guard together: an acquire
//! validates the tenant against the vault, then asks the pool for a handle,
//! supplying a factory that builds the caller's backend session and wraps it
//! for scope enforcement.

use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use stratum_config::{ConfigSource, ConfigVault};
use stratum_core::{Error, Result, TenantConfig, TenantId};
use stratum_pool::{PoolStats, ResourcePool, SessionHandle};
use stratum_scope::{AuditRecord, ScopeGuard, ScopedSession};

use crate::config::ManagerConfig;
use crate::reaper::{spawn_reaper, ReaperHandle};

/// Caller-supplied constructor for backend sessions.
///
/// Factories may fail with any error; the manager downcasts
/// [`stratum_core::Error`] back out unchanged and wraps everything else as
/// `Internal`, keeping the error surface closed.
pub type SessionFactory<S> =
    Arc<dyn Fn(&TenantId, &TenantConfig) -> anyhow::Result<S> + Send + Sync>;

/// A pooled handle to a scope-enforced session.
pub type ManagedHandle<S> = Arc<SessionHandle<ScopedSession<S>>>;

/// Orchestrates per-tenant configuration, session pooling, and scope
/// enforcement behind one acquire/release surface.
///
/// Construct instances directly (tests build as many independent managers as
/// they like); the [`crate::global`] module offers an optional process-wide
/// accessor as a convenience.
pub struct TenantManager<S> {
    config: ManagerConfig,
    vault: Arc<ConfigVault>,
    guard: Arc<ScopeGuard>,
    pool: Arc<ResourcePool<ScopedSession<S>>>,
    factory: SessionFactory<S>,
    reaper: Mutex<Option<ReaperHandle>>,
}

impl<S> TenantManager<S> {
    /// Create a manager with default tunables.
    pub fn new(source: Arc<dyn ConfigSource>, factory: SessionFactory<S>) -> Result<Self> {
        Self::with_config(ManagerConfig::default(), source, factory)
    }

    /// Create a manager with explicit tunables. The tunables are validated;
    /// every timing knob must be positive.
    pub fn with_config(
        config: ManagerConfig,
        source: Arc<dyn ConfigSource>,
        factory: SessionFactory<S>,
    ) -> Result<Self> {
        config.validate()?;
        let vault = Arc::new(ConfigVault::with_ttl(source, config.config_cache_ttl));
        let pool = Arc::new(ResourcePool::with_config(config.pool_config())?);
        Ok(Self {
            config,
            vault,
            guard: Arc::new(ScopeGuard::default()),
            pool,
            factory,
            reaper: Mutex::new(None),
        })
    }

    /// The manager's tunables.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The scope guard used to wrap sessions.
    pub fn scope_guard(&self) -> &Arc<ScopeGuard> {
        &self.guard
    }

    /// The configuration vault.
    pub fn vault(&self) -> &Arc<ConfigVault> {
        &self.vault
    }

    /// Acquire a pooled session for a tenant, creating one via the session
    /// factory if none is reusable.
    ///
    /// # Errors
    /// - `Error::InvalidTenantId` for a malformed id
    /// - `Error::TenantNotConfigured` when the vault has no record
    /// - `Error::Internal` for malformed config data or an unclassified
    ///   factory failure
    pub fn get_or_create_session(&self, tenant_id: &str) -> Result<ManagedHandle<S>> {
        let tenant_id = TenantId::parse(tenant_id)?;
        let config = self.vault.get_config(tenant_id.as_str())?;

        let guard = Arc::clone(&self.guard);
        let factory = Arc::clone(&self.factory);
        self.pool.acquire(&tenant_id, move |id| {
            let session = factory(id, &config).map_err(map_factory_error)?;
            debug!(tenant_id = %id, "built backend session");
            Ok(ScopedSession::new(id.clone(), guard, session))
        })
    }

    /// Release a session handle on behalf of a tenant.
    ///
    /// Releasing another tenant's handle is a cross-tenant access attempt:
    /// it is audited and rejected with `ForbiddenAccess`.
    pub fn release_session(&self, tenant_id: &str, handle: &ManagedHandle<S>) -> Result<()> {
        let tenant_id = TenantId::parse(tenant_id)?;
        if handle.tenant_id() != &tenant_id {
            let attempted = format!("session://{}/{}", handle.tenant_id(), handle.id());
            let record = AuditRecord::forbidden_access(tenant_id.as_str(), &attempted);
            record.emit();
            return Err(Error::ForbiddenAccess {
                tenant_id: tenant_id.to_string(),
                attempted_uri: record.attempted_uri,
            });
        }
        self.pool.release(handle);
        Ok(())
    }

    /// Snapshot of pool counters and gauges.
    pub fn get_pool_stats(&self) -> PoolStats {
        self.pool.get_stats()
    }

    /// Pooled session count for one tenant, or across all tenants.
    pub fn get_pool_size(&self, tenant_id: Option<&TenantId>) -> usize {
        self.pool.get_pool_size(tenant_id)
    }

    /// Configured tenant ids, sorted, malformed store keys skipped.
    pub fn list_tenants(&self) -> Result<Vec<String>> {
        self.vault.list_tenants()
    }

    /// Run one idle-eviction pass immediately. Returns evicted count.
    pub fn cleanup_idle_now(&self) -> Result<usize> {
        Ok(self.pool.cleanup_idle())
    }
}

impl<S: Send + Sync + 'static> TenantManager<S> {
    /// Start the background reaper if not already running. Requires a tokio
    /// runtime; returns whether a new task was spawned.
    pub fn start_reaper(&self) -> bool {
        let mut slot = self.reaper.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return false;
        }
        let pool = Arc::clone(&self.pool);
        *slot = Some(spawn_reaper(self.config.cleanup_interval, move || {
            Ok(pool.cleanup_idle())
        }));
        true
    }

    /// Stop the reaper (bounded wait) and clear the pool. Safe to call more
    /// than once.
    pub async fn shutdown(&self) {
        let handle = self
            .reaper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        self.pool.clear(None);
        info!("tenant manager shut down");
    }
}

fn map_factory_error(e: anyhow::Error) -> Error {
    match e.downcast::<Error>() {
        Ok(err) => err,
        Err(other) => Error::internal(other),
    }
}
