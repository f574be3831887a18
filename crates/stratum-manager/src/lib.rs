//! Stratum Tenant Manager
//!
//! Orchestrates the config vault, resource pool, and scope guard behind a
//! single acquire/release surface, runs the background idle reaper, and
//! offers an optional process-wide accessor for embedders that want one.

pub mod config;
pub mod global;
pub mod manager;
pub mod reaper;

pub use config::ManagerConfig;
pub use manager::{ManagedHandle, SessionFactory, TenantManager};
