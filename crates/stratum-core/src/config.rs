//! Per-tenant configuration records
//!
//! A `TenantConfig` is the resolved, immutable view of a tenant's backing
//! record: backend connection parameters plus a quotas map. Records are
//! produced by an external configuration store and consumed by the vault;
//! once resolved they are only ever handed out as independent clones.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tenant::TenantId;

/// Backend connection parameters for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Backend host name or address.
    pub host: String,

    /// Backend port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database or namespace name on the backend.
    pub database: String,

    /// Username for backend authentication.
    #[serde(default)]
    pub username: String,

    /// Password or secret for backend authentication. May arrive as a
    /// `${ENV_VAR}` placeholder; never logged.
    #[serde(default)]
    pub password: String,

    /// Additional driver-specific options.
    #[serde(default)]
    pub options: HashMap<String, String>,
}

fn default_port() -> u16 {
    5432
}

/// Resolved configuration record for one tenant.
///
/// Immutable once resolved. The vault caches these with a TTL and always
/// returns clones, so callers can never mutate the shared cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    /// The tenant this record belongs to.
    pub tenant_id: TenantId,

    /// Backend connection parameters.
    pub connection: ConnectionParams,

    /// Named quotas (e.g. "max_rows", "max_queries_per_minute").
    #[serde(default)]
    pub quotas: HashMap<String, i64>,
}

impl TenantConfig {
    /// Look up a quota by name.
    pub fn quota(&self, name: &str) -> Option<i64> {
        self.quotas.get(name).copied()
    }
}
