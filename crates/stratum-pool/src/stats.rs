//! Pool statistics
//!
//! Monotonic counters live in atomics and are bumped as operations happen;
//! the live gauges are computed under the bucket lock when a snapshot is
//! taken, so a snapshot is internally consistent.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic operation counters, shared across the pool's lifetime.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub(crate) total_acquired: AtomicU64,
    pub(crate) total_created: AtomicU64,
    pub(crate) total_released: AtomicU64,
    pub(crate) total_cleaned: AtomicU64,
}

impl PoolCounters {
    pub(crate) fn snapshot(&self) -> (u64, u64, u64, u64) {
        (
            self.total_acquired.load(Ordering::Relaxed),
            self.total_created.load(Ordering::Relaxed),
            self.total_released.load(Ordering::Relaxed),
            self.total_cleaned.load(Ordering::Relaxed),
        )
    }
}

/// Point-in-time snapshot of pool activity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolStats {
    /// Total successful acquires (reuses and creations).
    pub total_acquired: u64,
    /// Total handles built by the factory.
    pub total_created: u64,
    /// Total releases.
    pub total_released: u64,
    /// Total handles evicted (reaper and capacity pruning).
    pub total_cleaned: u64,
    /// Handles currently held across all buckets.
    pub current_pool_size: usize,
    /// Tenants with at least one pooled handle.
    pub active_tenants: usize,
    /// Handle count per tenant.
    pub per_tenant_counts: HashMap<String, usize>,
}
