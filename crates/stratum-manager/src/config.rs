//! Manager tunables

use std::time::Duration;

use stratum_core::{Error, Result};
use stratum_pool::PoolConfig;

/// Tunables for the tenant manager and its components.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Upper bound on pooled sessions per tenant.
    pub max_instances_per_tenant: usize,
    /// Disuse duration after which a session becomes evictable.
    pub idle_timeout: Duration,
    /// Sleep between background reaper iterations.
    pub cleanup_interval: Duration,
    /// TTL for cached tenant configuration records.
    pub config_cache_ttl: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_instances_per_tenant: 5,
            idle_timeout: Duration::from_secs(600),
            cleanup_interval: Duration::from_secs(300),
            config_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_instances_per_tenant(mut self, max: usize) -> Self {
        self.max_instances_per_tenant = max;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn config_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config_cache_ttl = ttl;
        self
    }

    /// Validate the tunables; every knob must be positive.
    pub fn validate(&self) -> Result<()> {
        self.pool_config().validate()?;
        if self.cleanup_interval.is_zero() {
            return Err(Error::internal("cleanup_interval must be positive"));
        }
        if self.config_cache_ttl.is_zero() {
            return Err(Error::internal("config_cache_ttl must be positive"));
        }
        Ok(())
    }

    /// The pool-facing subset of these tunables.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_instances_per_tenant: self.max_instances_per_tenant,
            idle_timeout: self.idle_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ManagerConfig::default();
        assert_eq!(config.max_instances_per_tenant, 5);
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert_eq!(config.cleanup_interval, Duration::from_secs(300));
        assert_eq!(config.config_cache_ttl, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = ManagerConfig::new()
            .max_instances_per_tenant(2)
            .idle_timeout(Duration::from_secs(1))
            .cleanup_interval(Duration::from_millis(100))
            .config_cache_ttl(Duration::from_secs(10));
        assert_eq!(config.max_instances_per_tenant, 2);
        assert_eq!(config.pool_config().idle_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_knobs_rejected() {
        assert!(ManagerConfig::new().max_instances_per_tenant(0).validate().is_err());
        assert!(ManagerConfig::new().idle_timeout(Duration::ZERO).validate().is_err());
        assert!(ManagerConfig::new().cleanup_interval(Duration::ZERO).validate().is_err());
        assert!(ManagerConfig::new().config_cache_ttl(Duration::ZERO).validate().is_err());
    }
}
