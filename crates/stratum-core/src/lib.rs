//! Stratum Core Types
//!
//! This crate provides the fundamental types used throughout Stratum:
//! - The closed error taxonomy shared by every component
//! - Validated tenant identifiers
//! - Per-tenant configuration records

pub mod config;
pub mod error;
pub mod tenant;

pub use config::{ConnectionParams, TenantConfig};
pub use error::{Error, Result};
pub use tenant::TenantId;
