//! Per-tenant bounded session pool
//!
//! One coarse mutex guards every bucket; all scans, evictions, appends, and
//! gauge reads happen inside that critical section, so no reader ever
//! observes a partially-updated bucket. The factory also runs inside it,
//! which keeps the create path race-free at the cost of serializing factory
//! latency across tenants.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, info, warn};

use stratum_core::{Result, TenantId};

use crate::handle::SessionHandle;
use crate::stats::{PoolCounters, PoolStats};

/// Default maximum pooled handles per tenant.
pub const DEFAULT_MAX_INSTANCES_PER_TENANT: usize = 5;
/// Default idle timeout before a handle is eligible for eviction.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool tunables.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on pooled handles per tenant.
    pub max_instances_per_tenant: usize,
    /// Disuse duration after which a handle becomes evictable.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_instances_per_tenant: DEFAULT_MAX_INSTANCES_PER_TENANT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl PoolConfig {
    /// Validate the tunables; both must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_instances_per_tenant == 0 {
            return Err(stratum_core::Error::internal(
                "max_instances_per_tenant must be positive",
            ));
        }
        if self.idle_timeout.is_zero() {
            return Err(stratum_core::Error::internal("idle_timeout must be positive"));
        }
        Ok(())
    }
}

type Bucket<S> = Vec<Arc<SessionHandle<S>>>;

/// Thread-safe pool of per-tenant session handles.
///
/// Buckets are created lazily on first acquire and removed once cleanup
/// empties them. Every handle in a bucket belongs to that bucket's tenant.
pub struct ResourcePool<S> {
    buckets: Mutex<HashMap<TenantId, Bucket<S>>>,
    config: PoolConfig,
    counters: PoolCounters,
}

impl<S> ResourcePool<S> {
    /// Create a pool with default tunables.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default()).expect("default pool config is valid")
    }

    /// Create a pool with explicit tunables.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            buckets: Mutex::new(HashMap::new()),
            config,
            counters: PoolCounters::default(),
        })
    }

    /// The pool's tunables.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<TenantId, Bucket<S>>> {
        // A panic inside the critical section leaves the buckets structurally
        // intact, so the poison flag is safe to clear.
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Acquire a session handle for a tenant, reusing a pooled one when
    /// possible, otherwise building a new session via `factory`.
    ///
    /// When the bucket is full of active handles, the handle with the oldest
    /// last-use is reused even though it is active. That trades strict
    /// exclusivity for availability under load and is logged as a warning.
    ///
    /// A factory error propagates unchanged and registers nothing.
    pub fn acquire<F>(&self, tenant_id: &TenantId, factory: F) -> Result<Arc<SessionHandle<S>>>
    where
        F: FnOnce(&TenantId) -> Result<S>,
    {
        let mut buckets = self.lock_buckets();
        let bucket = buckets.entry(tenant_id.clone()).or_default();

        // Reuse the first non-idle handle.
        if let Some(handle) = bucket
            .iter()
            .find(|h| !h.is_idle(self.config.idle_timeout))
        {
            let handle = Arc::clone(handle);
            handle.touch();
            self.counters.total_acquired.fetch_add(1, Ordering::Relaxed);
            debug!(tenant_id = %tenant_id, handle_id = %handle.id(), "reusing pooled session");
            return Ok(handle);
        }

        if bucket.len() >= self.config.max_instances_per_tenant {
            let active = bucket
                .iter()
                .filter(|h| !h.is_idle(self.config.idle_timeout))
                .count();

            if active >= self.config.max_instances_per_tenant {
                // Degraded-capacity fallback: every slot is active, so hand
                // out the least-recently-used handle rather than rejecting.
                let handle = bucket
                    .iter()
                    .min_by_key(|h| h.last_used_at())
                    .map(Arc::clone)
                    .expect("bucket at capacity is non-empty");
                warn!(
                    tenant_id = %tenant_id,
                    handle_id = %handle.id(),
                    "tenant at session capacity, reusing oldest active session"
                );
                handle.touch();
                self.counters.total_acquired.fetch_add(1, Ordering::Relaxed);
                return Ok(handle);
            }

            // Make room by pruning idle handles before creating.
            let before = bucket.len();
            bucket.retain(|h| !h.is_idle(self.config.idle_timeout));
            let pruned = before - bucket.len();
            if pruned > 0 {
                self.counters
                    .total_cleaned
                    .fetch_add(pruned as u64, Ordering::Relaxed);
                debug!(tenant_id = %tenant_id, pruned, "pruned idle sessions at capacity");
            }
        }

        let session = factory(tenant_id)?;
        let handle = Arc::new(SessionHandle::new(tenant_id.clone(), session));
        handle.touch();
        bucket.push(Arc::clone(&handle));
        self.counters.total_created.fetch_add(1, Ordering::Relaxed);
        self.counters.total_acquired.fetch_add(1, Ordering::Relaxed);
        debug!(tenant_id = %tenant_id, handle_id = %handle.id(), "created pooled session");
        Ok(handle)
    }

    /// Return a handle after use. The handle stays pooled for reuse.
    pub fn release(&self, handle: &SessionHandle<S>) {
        handle.touch();
        self.counters.total_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Evict every handle idle longer than the idle timeout, dropping
    /// buckets left empty. Returns the number of handles removed.
    pub fn cleanup_idle(&self) -> usize {
        let mut buckets = self.lock_buckets();
        let mut removed = 0;

        buckets.retain(|tenant_id, bucket| {
            let before = bucket.len();
            bucket.retain(|h| !h.is_idle(self.config.idle_timeout));
            let evicted = before - bucket.len();
            if evicted > 0 {
                removed += evicted;
                info!(tenant_id = %tenant_id, evicted, "evicted idle sessions");
            }
            !bucket.is_empty()
        });

        if removed > 0 {
            self.counters
                .total_cleaned
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Pooled handle count for one tenant, or across all tenants.
    pub fn get_pool_size(&self, tenant_id: Option<&TenantId>) -> usize {
        let buckets = self.lock_buckets();
        match tenant_id {
            Some(id) => buckets.get(id).map_or(0, |b| b.len()),
            None => buckets.values().map(|b| b.len()).sum(),
        }
    }

    /// Consistent snapshot of counters and live gauges.
    pub fn get_stats(&self) -> PoolStats {
        let buckets = self.lock_buckets();
        let (total_acquired, total_created, total_released, total_cleaned) =
            self.counters.snapshot();

        let per_tenant_counts: HashMap<String, usize> = buckets
            .iter()
            .map(|(id, bucket)| (id.to_string(), bucket.len()))
            .collect();

        PoolStats {
            total_acquired,
            total_created,
            total_released,
            total_cleaned,
            current_pool_size: per_tenant_counts.values().sum(),
            active_tenants: per_tenant_counts.len(),
            per_tenant_counts,
        }
    }

    /// Drop every pooled handle for one tenant, or for all tenants.
    pub fn clear(&self, tenant_id: Option<&TenantId>) {
        let mut buckets = self.lock_buckets();
        match tenant_id {
            Some(id) => {
                if let Some(bucket) = buckets.remove(id) {
                    debug!(tenant_id = %id, dropped = bucket.len(), "cleared tenant bucket");
                }
            }
            None => {
                let dropped: usize = buckets.values().map(|b| b.len()).sum();
                buckets.clear();
                debug!(dropped, "cleared all buckets");
            }
        }
    }
}

impl<S> Default for ResourcePool<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::Error;

    fn tenant(id: &str) -> TenantId {
        TenantId::parse(id).unwrap()
    }

    fn pool(max: usize, idle: Duration) -> ResourcePool<String> {
        ResourcePool::with_config(PoolConfig {
            max_instances_per_tenant: max,
            idle_timeout: idle,
        })
        .unwrap()
    }

    fn make_session(tenant_id: &TenantId) -> Result<String> {
        Ok(format!("session-for-{}", tenant_id))
    }

    #[test]
    fn test_config_validation() {
        assert!(PoolConfig { max_instances_per_tenant: 0, ..Default::default() }
            .validate()
            .is_err());
        assert!(PoolConfig { idle_timeout: Duration::ZERO, ..Default::default() }
            .validate()
            .is_err());
        assert!(PoolConfig::default().validate().is_ok());
    }

    #[test]
    fn test_acquire_reuses_active_handle() {
        let pool = pool(5, Duration::from_secs(60));
        let t = tenant("tenant001");

        let first = pool.acquire(&t, make_session).unwrap();
        let second = pool
            .acquire(&t, |_| -> Result<String> { panic!("factory must not run on reuse") })
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(second.use_count(), 2);
        assert_eq!(pool.get_pool_size(Some(&t)), 1);

        let stats = pool.get_stats();
        assert_eq!(stats.total_created, 1);
        assert_eq!(stats.total_acquired, 2);
    }

    #[test]
    fn test_tenants_never_share_handles() {
        let pool = pool(5, Duration::from_secs(60));
        let t1 = tenant("tenant001");
        let t2 = tenant("tenant002");

        let h1 = pool.acquire(&t1, make_session).unwrap();
        let h2 = pool.acquire(&t2, make_session).unwrap();

        assert_ne!(h1.id(), h2.id());
        assert_eq!(h1.tenant_id(), &t1);
        assert_eq!(h2.tenant_id(), &t2);
        assert_eq!(h2.session(), "session-for-tenant002");
    }

    #[test]
    fn test_capacity_bound_and_degraded_reuse() {
        let pool = pool(2, Duration::from_secs(60));
        let t = tenant("tenant001");

        let h1 = pool.acquire(&t, make_session).unwrap();
        // Second acquire reuses h1 (still active); bucket stays at 1.
        let h2 = pool.acquire(&t, make_session).unwrap();
        assert_eq!(h1.id(), h2.id());
        assert_eq!(pool.get_pool_size(Some(&t)), 1);

        // Even many acquires never exceed the bound.
        for _ in 0..10 {
            pool.acquire(&t, make_session).unwrap();
        }
        assert!(pool.get_pool_size(Some(&t)) <= 2);
        assert!(pool.get_stats().total_created <= 2);
    }

    #[test]
    fn test_full_bucket_of_active_handles_reuses_oldest() {
        let pool = pool(1, Duration::from_secs(60));
        let t = tenant("tenant001");

        let h1 = pool.acquire(&t, make_session).unwrap();
        // Bucket is at capacity and every handle is active: caller still
        // gets a handle (the oldest), never a rejection.
        let h2 = pool.acquire(&t, make_session).unwrap();
        assert_eq!(h1.id(), h2.id());
        assert_eq!(pool.get_stats().total_created, 1);
    }

    #[test]
    fn test_idle_prune_on_capacity_path() {
        let pool = pool(1, Duration::from_millis(20));
        let t = tenant("tenant001");

        let h1 = pool.acquire(&t, make_session).unwrap();
        std::thread::sleep(Duration::from_millis(40));

        // h1 is now idle: the capacity path prunes it and builds fresh.
        let h2 = pool.acquire(&t, make_session).unwrap();
        assert_ne!(h1.id(), h2.id());
        assert_eq!(pool.get_pool_size(Some(&t)), 1);

        let stats = pool.get_stats();
        assert_eq!(stats.total_created, 2);
        assert_eq!(stats.total_cleaned, 1);
    }

    #[test]
    fn test_cleanup_idle_evicts_and_drops_empty_buckets() {
        let pool = pool(5, Duration::from_millis(20));
        let t1 = tenant("tenant001");
        let t2 = tenant("tenant002");

        pool.acquire(&t1, make_session).unwrap();
        pool.acquire(&t2, make_session).unwrap();
        std::thread::sleep(Duration::from_millis(40));

        // Keep t2 fresh.
        pool.acquire(&t2, make_session).unwrap();

        let removed = pool.cleanup_idle();
        assert_eq!(removed, 1);
        assert_eq!(pool.get_pool_size(Some(&t1)), 0);
        assert_eq!(pool.get_pool_size(Some(&t2)), 1);

        let stats = pool.get_stats();
        assert_eq!(stats.active_tenants, 1);
        assert_eq!(stats.total_cleaned, 1);
        assert!(!stats.per_tenant_counts.contains_key("tenant001"));
    }

    #[test]
    fn test_factory_invoked_again_after_eviction() {
        let pool = pool(5, Duration::from_millis(20));
        let t = tenant("tenant001");

        let h1 = pool.acquire(&t, make_session).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert!(pool.cleanup_idle() >= 1);

        let h2 = pool.acquire(&t, make_session).unwrap();
        assert_ne!(h1.id(), h2.id());
        assert_eq!(pool.get_stats().total_created, 2);
    }

    #[test]
    fn test_factory_error_registers_nothing() {
        let pool = pool(5, Duration::from_secs(60));
        let t = tenant("tenant001");

        let result = pool.acquire(&t, |_| -> Result<String> {
            Err(Error::internal("backend unreachable"))
        });
        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(pool.get_pool_size(None), 0);

        let stats = pool.get_stats();
        assert_eq!(stats.total_created, 0);
        assert_eq!(stats.total_acquired, 0);
    }

    #[test]
    fn test_release_touches_and_counts() {
        let pool = pool(5, Duration::from_secs(60));
        let t = tenant("tenant001");

        let handle = pool.acquire(&t, make_session).unwrap();
        pool.release(&handle);

        assert_eq!(handle.use_count(), 2);
        assert_eq!(pool.get_pool_size(Some(&t)), 1);
        assert_eq!(pool.get_stats().total_released, 1);
    }

    #[test]
    fn test_clear() {
        let pool = pool(5, Duration::from_secs(60));
        let t1 = tenant("tenant001");
        let t2 = tenant("tenant002");
        pool.acquire(&t1, make_session).unwrap();
        pool.acquire(&t2, make_session).unwrap();

        pool.clear(Some(&t1));
        assert_eq!(pool.get_pool_size(Some(&t1)), 0);
        assert_eq!(pool.get_pool_size(None), 1);

        pool.clear(None);
        assert_eq!(pool.get_pool_size(None), 0);
    }

    #[test]
    fn test_concurrent_acquire_bounded_creation() {
        let pool = Arc::new(pool(5, Duration::from_secs(60)));
        let tenants: Vec<TenantId> = (0..10)
            .map(|i| tenant(&format!("tenant{:03}", i)))
            .collect();

        let mut workers = Vec::new();
        for worker in 0..8 {
            let pool = Arc::clone(&pool);
            let tenants = tenants.clone();
            workers.push(std::thread::spawn(move || {
                for i in 0..500 {
                    let t = &tenants[(worker + i) % tenants.len()];
                    let handle = pool.acquire(t, make_session).unwrap();
                    assert_eq!(handle.tenant_id(), t);
                    pool.release(&handle);
                }
            }));
        }
        for w in workers {
            w.join().unwrap();
        }

        let stats = pool.get_stats();
        assert_eq!(stats.total_acquired, 8 * 500);
        assert!(stats.total_created <= (10 * 5) as u64);
        assert!(stats.current_pool_size <= 10 * 5);
    }
}
