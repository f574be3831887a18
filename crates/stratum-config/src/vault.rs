//! TTL-cached per-tenant configuration access
//!
//! `ConfigVault` fronts a `ConfigSource` with id validation, environment
//! placeholder resolution, record deserialization, and a TTL cache. The
//! cache only ever hands out clones, so no caller can mutate a shared entry.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use stratum_core::{Error, Result, TenantConfig, TenantId};

use crate::resolve::resolve_value;
use crate::source::ConfigSource;

/// Default cache TTL for resolved records.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct CachedEntry {
    config: TenantConfig,
    loaded_at: Instant,
}

/// Validated, cached source of per-tenant configuration.
pub struct ConfigVault {
    source: Arc<dyn ConfigSource>,
    cache: DashMap<TenantId, CachedEntry>,
    ttl: Duration,
}

impl ConfigVault {
    /// Create a vault over a source with the default 300s TTL.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self::with_ttl(source, DEFAULT_CACHE_TTL)
    }

    /// Create a vault with an explicit cache TTL. The TTL must be positive.
    pub fn with_ttl(source: Arc<dyn ConfigSource>, ttl: Duration) -> Self {
        assert!(!ttl.is_zero(), "config cache TTL must be positive");
        Self {
            source,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Get the resolved configuration for a tenant.
    ///
    /// A cache hit within the TTL returns an independent copy of the cached
    /// record. Otherwise the record is loaded from the source, every string
    /// value has its `${NAME}` / `${NAME:default}` placeholders resolved from
    /// the environment, and the result is cached.
    ///
    /// # Errors
    /// - `Error::InvalidTenantId` if the id fails format validation
    /// - `Error::TenantNotConfigured` if the source has no record
    /// - `Error::Internal` if the record is malformed
    pub fn get_config(&self, tenant_id: &str) -> Result<TenantConfig> {
        let tenant_id = TenantId::parse(tenant_id)?;

        if let Some(entry) = self.cache.get(&tenant_id) {
            if entry.loaded_at.elapsed() <= self.ttl {
                debug!(tenant_id = %tenant_id, "config cache hit");
                return Ok(entry.config.clone());
            }
        }

        let config = self.load(&tenant_id)?;
        self.cache.insert(
            tenant_id,
            CachedEntry {
                config: config.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(config)
    }

    fn load(&self, tenant_id: &TenantId) -> Result<TenantConfig> {
        let mut raw = self
            .source
            .load_raw(tenant_id)?
            .ok_or_else(|| Error::TenantNotConfigured(tenant_id.to_string()))?;

        resolve_value(&mut raw);

        let config: TenantConfig = serde_json::from_value(raw).map_err(|e| {
            warn!(tenant_id = %tenant_id, error = %e, "malformed tenant config record");
            Error::internal(format!("malformed config for tenant {}: {}", tenant_id, e))
        })?;

        if config.tenant_id != *tenant_id {
            return Err(Error::internal(format!(
                "config record for tenant {} carries mismatched id {}",
                tenant_id, config.tenant_id
            )));
        }

        // Credential values never appear in logs, only the tenant id.
        info!(tenant_id = %tenant_id, "loaded tenant config");
        Ok(config)
    }

    /// Whether a valid backing record exists for this tenant id.
    pub fn exists(&self, tenant_id: &str) -> bool {
        self.get_config(tenant_id).is_ok()
    }

    /// List configured tenant ids, sorted, skipping malformed ids found in
    /// the backing store.
    pub fn list_tenants(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .source
            .tenant_ids()?
            .into_iter()
            .filter(|id| {
                let valid = TenantId::is_valid(id);
                if !valid {
                    debug!(tenant_id = %id, "skipping malformed tenant id in backing store");
                }
                valid
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Drop the cached record for one tenant, or all cached records.
    pub fn clear_cache(&self, tenant_id: Option<&str>) {
        match tenant_id {
            Some(id) => {
                if let Ok(id) = TenantId::parse(id) {
                    self.cache.remove(&id);
                }
            }
            None => self.cache.clear(),
        }
    }
}
