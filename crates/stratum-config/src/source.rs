//! Backing configuration sources
//!
//! A `ConfigSource` is the external store that holds raw per-tenant records.
//! The vault layers validation, placeholder resolution, and TTL caching on
//! top of whichever source it is given.

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, error, info};

use stratum_core::{Error, Result, TenantId};

/// Abstraction over the backing store of raw tenant records.
///
/// Implementations return the record as raw JSON; deserialization into
/// `TenantConfig` is the vault's job, after placeholder resolution.
pub trait ConfigSource: Send + Sync {
    /// Load the raw record for a tenant, or `None` if the tenant is unknown.
    fn load_raw(&self, tenant_id: &TenantId) -> Result<Option<Value>>;

    /// List every tenant id key present in the store, well-formed or not.
    /// The vault filters malformed ids.
    fn tenant_ids(&self) -> Result<Vec<String>>;
}

/// File-based configuration source.
///
/// Reads a single document mapping tenant id to raw record:
///
/// ```yaml
/// tenant001:
///   tenant_id: tenant001
///   connection:
///     host: db.internal
///     database: analytics
/// ```
///
/// The file extension selects the parser: `.json` for JSON, anything else
/// (conventionally `.yaml` / `.yml`) for YAML. The file is re-read on every
/// load; the vault's TTL cache keeps that cheap in practice.
#[derive(Debug)]
pub struct FileConfigSource {
    config_path: PathBuf,
}

impl FileConfigSource {
    /// Create a file source, verifying the file exists up front.
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        if !config_path.exists() {
            return Err(Error::internal(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }
        info!(path = %config_path.display(), "initialized file config source");
        Ok(Self { config_path })
    }

    fn read_document(&self) -> Result<Value> {
        let contents = std::fs::read_to_string(&self.config_path).map_err(|e| {
            error!(path = %self.config_path.display(), error = %e, "failed to read config file");
            Error::internal(format!("failed to read config file: {}", e))
        })?;

        let document: Value =
            if self.config_path.extension().and_then(|s| s.to_str()) == Some("json") {
                serde_json::from_str(&contents)
                    .map_err(|e| Error::internal(format!("invalid JSON config: {}", e)))?
            } else {
                serde_yaml::from_str(&contents)
                    .map_err(|e| Error::internal(format!("invalid YAML config: {}", e)))?
            };

        if !document.is_object() {
            return Err(Error::internal(
                "config document must be a mapping of tenant id to record",
            ));
        }

        debug!("read tenant config document");
        Ok(document)
    }
}

impl ConfigSource for FileConfigSource {
    fn load_raw(&self, tenant_id: &TenantId) -> Result<Option<Value>> {
        let document = self.read_document()?;
        Ok(document.get(tenant_id.as_str()).cloned())
    }

    fn tenant_ids(&self) -> Result<Vec<String>> {
        let document = self.read_document()?;
        match document {
            Value::Object(map) => Ok(map.keys().cloned().collect()),
            _ => Ok(Vec::new()),
        }
    }
}

/// In-memory configuration source.
///
/// The primary source for tests and for embedders that provision tenants at
/// runtime.
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    records: RwLock<HashMap<String, Value>>,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the raw record for a tenant id key.
    ///
    /// The key is taken as-is so tests can seed malformed ids and verify
    /// that the vault filters them.
    pub fn insert(&self, tenant_id: impl Into<String>, record: Value) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tenant_id.into(), record);
    }

    /// Remove a tenant's record, returning whether one existed.
    pub fn remove(&self, tenant_id: &str) -> bool {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(tenant_id)
            .is_some()
    }
}

impl ConfigSource for MemoryConfigSource {
    fn load_raw(&self, tenant_id: &TenantId) -> Result<Option<Value>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(tenant_id.as_str())
            .cloned())
    }

    fn tenant_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }
}
