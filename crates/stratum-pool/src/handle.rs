//! Pooled session handles
//!
//! A `SessionHandle` wraps an opaque backend session with the bookkeeping
//! the pool needs: owning tenant, creation time, last-use time, and a use
//! counter. Handles are shared as `Arc`s, so the mutable bookkeeping lives
//! in atomics and "touch" needs no lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

use stratum_core::TenantId;

/// A pooled, reusable wrapper around an opaque backend session.
///
/// The pool never looks inside `S`; it only manages lifecycle metadata.
/// Two concurrent callers may hold the same handle (reuse is by design, and
/// the degraded-capacity path hands out active handles). Callers needing
/// single-owner exclusivity must serialize on top.
#[derive(Debug)]
pub struct SessionHandle<S> {
    id: Uuid,
    tenant_id: TenantId,
    session: S,
    created_at: Instant,
    /// Millis since `created_at` of the most recent touch.
    last_used_ms: AtomicU64,
    use_count: AtomicU64,
}

impl<S> SessionHandle<S> {
    pub(crate) fn new(tenant_id: TenantId, session: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            session,
            created_at: Instant::now(),
            last_used_ms: AtomicU64::new(0),
            use_count: AtomicU64::new(0),
        }
    }

    /// Unique id of this handle.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The tenant this handle belongs to.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// The wrapped backend session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// When this handle was created.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// How many times this handle has been acquired or released.
    pub fn use_count(&self) -> u64 {
        self.use_count.load(Ordering::Relaxed)
    }

    /// How long since the last touch.
    pub fn idle_for(&self) -> Duration {
        let last_used = Duration::from_millis(self.last_used_ms.load(Ordering::Relaxed));
        self.created_at.elapsed().saturating_sub(last_used)
    }

    /// Whether this handle has been idle longer than `idle_timeout`.
    pub fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.idle_for() > idle_timeout
    }

    /// Instant of the most recent touch. Orders handles by recency when the
    /// pool picks a reuse victim at capacity.
    pub fn last_used_at(&self) -> Instant {
        self.created_at + Duration::from_millis(self.last_used_ms.load(Ordering::Relaxed))
    }

    /// Record a use: update last-used and bump the use counter.
    pub(crate) fn touch(&self) {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        self.last_used_ms.store(elapsed, Ordering::Relaxed);
        self.use_count.fetch_add(1, Ordering::Relaxed);
    }
}
