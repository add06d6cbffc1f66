//! Process-wide registry installed once at startup.

use std::sync::{Arc, OnceLock};

use log::info;

use crate::config::AccessConfig;
use crate::error::{AccessError, Result};

use super::PermissionRegistry;

static REGISTRY: OnceLock<Arc<PermissionRegistry>> = OnceLock::new();

/// Install the process-wide registry.
///
/// # Errors
///
/// Returns `AccessError::RegistryAlreadyInitialized` on every call after
/// the first successful one.
pub fn install(registry: PermissionRegistry) -> Result<Arc<PermissionRegistry>> {
    let registry = Arc::new(registry);
    REGISTRY
        .set(Arc::clone(&registry))
        .map_err(|_| AccessError::RegistryAlreadyInitialized)?;
    info!(
        "installed process-wide permission registry {}",
        registry.fingerprint()
    );
    Ok(registry)
}

/// The installed registry.
pub fn get() -> Result<Arc<PermissionRegistry>> {
    REGISTRY
        .get()
        .cloned()
        .ok_or(AccessError::RegistryNotInitialized)
}

/// The installed registry, building it from `config` on first use.
///
/// When two threads race here both may build, but only one registry is
/// ever installed and both callers receive it.
pub fn get_or_init(config: &AccessConfig) -> Result<Arc<PermissionRegistry>> {
    if let Some(registry) = REGISTRY.get() {
        return Ok(Arc::clone(registry));
    }
    let built = config.load_registry()?;
    Ok(Arc::clone(REGISTRY.get_or_init(|| Arc::new(built))))
}

pub fn is_initialized() -> bool {
    REGISTRY.get().is_some()
}
