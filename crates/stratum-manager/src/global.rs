//! Optional process-wide manager accessor
//!
//! The primary construction path is an explicit, injectable
//! [`TenantManager`] instance. This module offers a lazily-initialized,
//! lock-guarded global over a type-erased session as a convenience for
//! embedders that want exactly one manager per process. Tests should build
//! independent instances instead.

use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;

use stratum_core::{Error, Result};

use crate::manager::TenantManager;

/// Type-erased session for the process-wide manager.
pub type DynSession = Arc<dyn Any + Send + Sync>;

/// The process-wide manager's concrete type.
pub type DynTenantManager = TenantManager<DynSession>;

static GLOBAL: OnceCell<Arc<DynTenantManager>> = OnceCell::new();

/// Install the process-wide manager. Fails if one is already installed.
pub fn init(manager: Arc<DynTenantManager>) -> Result<()> {
    GLOBAL
        .set(manager)
        .map_err(|_| Error::internal("global tenant manager already initialized"))
}

/// The process-wide manager, if one has been installed.
pub fn get() -> Option<Arc<DynTenantManager>> {
    GLOBAL.get().cloned()
}

/// The process-wide manager, installing the one built by `init_fn` on first
/// call.
pub fn get_or_init(
    init_fn: impl FnOnce() -> Result<Arc<DynTenantManager>>,
) -> Result<Arc<DynTenantManager>> {
    GLOBAL.get_or_try_init(init_fn).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::SessionFactory;
    use stratum_config::MemoryConfigSource;

    fn dyn_manager() -> Arc<DynTenantManager> {
        let source = Arc::new(MemoryConfigSource::new());
        source.insert(
            "tenant001",
            serde_json::json!({
                "tenant_id": "tenant001",
                "connection": { "host": "h", "database": "d" }
            }),
        );
        let factory: SessionFactory<DynSession> =
            Arc::new(|id, _| Ok(Arc::new(id.to_string()) as DynSession));
        Arc::new(TenantManager::new(source, factory).unwrap())
    }

    // One test covers the whole lifecycle: the global is process-wide state,
    // so init-twice behavior must be observed in a fixed order.
    #[test]
    fn test_global_lifecycle() {
        assert!(get().is_none());

        let installed = get_or_init(|| Ok(dyn_manager())).unwrap();
        assert!(get().is_some());
        assert!(Arc::ptr_eq(&installed, &get().unwrap()));

        // Second init fails; get_or_init keeps returning the first instance.
        assert!(init(dyn_manager()).is_err());
        let again = get_or_init(|| panic!("must not rebuild")).unwrap();
        assert!(Arc::ptr_eq(&installed, &again));

        // The type-erased session is usable through the global.
        let handle = installed.get_or_create_session("tenant001").unwrap();
        let session = handle.session().inner();
        assert_eq!(
            session.downcast_ref::<String>().map(String::as_str),
            Some("tenant001")
        );
    }
}
