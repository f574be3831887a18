//! Stratum Resource Pool
//!
//! Generic, thread-safe pool of per-tenant session handles. Each tenant gets
//! a bounded bucket of reusable handles; idle handles are evicted by
//! `cleanup_idle`, normally driven by the manager's background reaper.

pub mod handle;
pub mod pool;
pub mod stats;

pub use handle::SessionHandle;
pub use pool::{PoolConfig, ResourcePool};
pub use stats::PoolStats;
