//! Stratum Configuration Vault
//!
//! This crate provides the tenant configuration layer:
//! - `ConfigSource`: an abstraction over the backing configuration store,
//!   with file-based and in-memory implementations
//! - Environment placeholder resolution (`${NAME}` / `${NAME:default}`)
//! - `ConfigVault`: validated, TTL-cached access to per-tenant records

pub mod resolve;
pub mod source;
pub mod vault;

pub use source::{ConfigSource, FileConfigSource, MemoryConfigSource};
pub use vault::ConfigVault;
