//! Stratum Scope Guard
//!
//! Tenant ownership of resource identifiers. A resource URI has the shape
//! `scheme://{tenant_id}/{path}`; the guard stamps raw identifiers with the
//! requesting tenant's scope and rejects any identifier scoped to another
//! tenant, emitting a security audit record on every rejection.

pub mod audit;
pub mod guard;
pub mod session;

pub use audit::AuditRecord;
pub use guard::ScopeGuard;
pub use session::ScopedSession;
