//! Assembles an [`AccessControl`] over the in-memory platform.

use std::sync::Arc;

use posgate_session::{AccessControl, IdentityResolver, ScopeProvider, SessionStore};

use crate::config::AccessConfig;
use crate::platform::InMemoryPlatform;

pub type InMemoryAccessControl =
    AccessControl<Arc<InMemoryPlatform>, Arc<InMemoryPlatform>, Arc<dyn SessionStore>>;

pub fn in_memory_access_control(
    config: &AccessConfig,
    platform: Arc<InMemoryPlatform>,
) -> InMemoryAccessControl {
    let store = config.session_store();
    let resolver = IdentityResolver::with_options(
        platform.clone(),
        platform.clone(),
        store.clone(),
        config.resolver_options(),
    );
    let scope = ScopeProvider::new(platform, store);
    AccessControl::new(Arc::new(resolver), Arc::new(scope), config.locations())
}
