use crate::config::LiveSchedConfig;
use crate::domain::clock::clock::{SharedClock, WallClock};
use crate::domain::tenant::tenant_registry::TenantRegistry;
use crate::error::Result;

pub mod api;
pub mod config;
pub mod demo;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod persistence;

/// Builds a registry over the configured storage and loads every tenant
/// found there.
pub fn open_registry(config: &LiveSchedConfig) -> Result<TenantRegistry> {
    config.validate()?;
    let persistence = config.create_persistence();
    let registry = TenantRegistry::new(persistence, SharedClock::new(WallClock), config.save_on_mutation);

    let tenants = registry.reload()?;
    log::info!("Opened '{}' with {} tenants.", config.data_dir.display(), tenants);

    Ok(registry)
}
