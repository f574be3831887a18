//! End-to-end integration tests for Stratum
//!
//! The tests under `tests/` wire the vault, pool, scope guard, and manager
//! together and exercise the full acquire/release flow, isolation
//! enforcement, and the background reaper. This crate exports shared test
//! fixtures.

use std::sync::Arc;

use stratum_config::MemoryConfigSource;
use stratum_manager::{ManagerConfig, SessionFactory, TenantManager};

/// A minimal backend session for tests: remembers who it was built for.
#[derive(Debug, PartialEq)]
pub struct FakeBackendSession {
    pub tenant: String,
    pub host: String,
}

/// Raw config record for a test tenant.
pub fn tenant_record(tenant: &str) -> serde_json::Value {
    serde_json::json!({
        "tenant_id": tenant,
        "connection": {
            "host": format!("{}.db.internal", tenant),
            "database": "analytics",
            "username": "svc",
            "password": "${STRATUM_IT_UNSET_SECRET:placeholder}"
        },
        "quotas": { "max_rows": 10000, "max_queries_per_minute": 60 }
    })
}

/// A config source seeded with the given tenants.
pub fn seeded_source(tenants: &[&str]) -> Arc<MemoryConfigSource> {
    let source = Arc::new(MemoryConfigSource::new());
    for t in tenants {
        source.insert(*t, tenant_record(t));
    }
    source
}

/// The standard test factory: builds a `FakeBackendSession` from the
/// resolved config.
pub fn fake_factory() -> SessionFactory<FakeBackendSession> {
    Arc::new(|id, config| {
        Ok(FakeBackendSession {
            tenant: id.to_string(),
            host: config.connection.host.clone(),
        })
    })
}

/// A manager over the given tenants with the given tunables.
pub fn build_manager(
    tenants: &[&str],
    config: ManagerConfig,
) -> TenantManager<FakeBackendSession> {
    TenantManager::with_config(config, seeded_source(tenants), fake_factory())
        .expect("test manager config is valid")
}
