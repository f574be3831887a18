//! Security audit records for isolation violations
//!
//! Every forbidden-access attempt produces an `AuditRecord` and a structured
//! warning on the `stratum::audit` target. The attempted identifier is
//! truncated so audit logs never carry arbitrarily long (or credential-laden)
//! tails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Maximum length of the attempted identifier kept in an audit record.
pub const MAX_AUDIT_URI_LEN: usize = 100;

/// Record of a cross-tenant access attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// The tenant that made the attempt.
    pub tenant_id: String,
    /// The identifier it attempted to use, truncated to 100 characters.
    pub attempted_uri: String,
    /// When the attempt happened.
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record for a forbidden access attempt.
    pub fn forbidden_access(tenant_id: &str, attempted_uri: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            attempted_uri: truncate(attempted_uri, MAX_AUDIT_URI_LEN),
            timestamp: Utc::now(),
        }
    }

    /// Emit this record as a structured security log entry.
    pub fn emit(&self) {
        warn!(
            target: "stratum::audit",
            tenant_id = %self.tenant_id,
            attempted_uri = %self.attempted_uri,
            timestamp = %self.timestamp.to_rfc3339(),
            "cross-tenant access denied"
        );
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
