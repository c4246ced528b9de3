use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::domain::clock::clock::SharedClock;
use crate::domain::model::id::TenantId;
use crate::domain::tenant::tenant_context::TenantContext;
use crate::error::Result;
use crate::persistence::persistence_trait::Persistence;

pub type SharedTenant = Arc<Mutex<TenantContext>>;

/// Holds one context per tenant. Each context sits behind its own mutex, so
/// every operation on a tenant (allocation, unscheduling, pool edits) is
/// serialized while different tenants proceed independently.
#[derive(Debug, Clone)]
pub struct TenantRegistry {
    tenants: Arc<RwLock<HashMap<TenantId, SharedTenant>>>,
    persistence: Arc<dyn Persistence>,
    clock: SharedClock,
    save_on_mutation: bool,
}

impl TenantRegistry {
    pub fn new(persistence: Arc<dyn Persistence>, clock: SharedClock, save_on_mutation: bool) -> Self {
        Self { tenants: Arc::new(RwLock::new(HashMap::new())), persistence, clock, save_on_mutation }
    }

    pub fn contains(&self, tenant_id: &TenantId) -> bool {
        self.tenants.read().unwrap_or_else(|poisoned| poisoned.into_inner()).contains_key(tenant_id)
    }

    pub fn tenant_ids(&self) -> Vec<TenantId> {
        let mut ids: Vec<TenantId> = self.tenants.read().unwrap_or_else(|poisoned| poisoned.into_inner()).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the cached context, loading it from persistence on first use.
    pub fn get_or_create(&self, tenant_id: &TenantId) -> SharedTenant {
        if let Some(tenant) = self.tenants.read().unwrap_or_else(|poisoned| poisoned.into_inner()).get(tenant_id) {
            return tenant.clone();
        }

        let mut tenants = self.tenants.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        match tenants.entry(tenant_id.clone()) {
            // Another caller loaded it between the two locks.
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                log::info!("Opening tenant '{}'.", tenant_id);
                let context = TenantContext::load(&*self.persistence, tenant_id.clone(), self.clock.clone());
                entry.insert(Arc::new(Mutex::new(context))).clone()
            }
        }
    }

    /// Replaces every cached context with the state found in persistence.
    ///
    /// # Returns
    /// Returns the number of tenants loaded.
    pub fn reload(&self) -> Result<usize> {
        let tenant_ids = self.persistence.list_tenants()?;
        let mut reloaded = HashMap::with_capacity(tenant_ids.len());
        for tenant_id in tenant_ids {
            let context = TenantContext::load(&*self.persistence, tenant_id.clone(), self.clock.clone());
            reloaded.insert(tenant_id, Arc::new(Mutex::new(context)));
        }

        let count = reloaded.len();
        *self.tenants.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = reloaded;
        log::info!("Reloaded {} tenants.", count);
        Ok(count)
    }

    /// Runs `operation` while holding the tenant's lock, then persists the
    /// tenant if the registry saves on mutation. A failed operation is not saved.
    pub fn with_tenant<R>(&self, tenant_id: &TenantId, operation: impl FnOnce(&mut TenantContext) -> Result<R>) -> Result<R> {
        let tenant = self.get_or_create(tenant_id);
        let mut context = lock(&tenant);
        let result = operation(&mut *context)?;
        if self.save_on_mutation {
            context.save(&*self.persistence)?;
        }
        Ok(result)
    }

    /// Like [`TenantRegistry::with_tenant`] for calls that do not change the tenant.
    pub fn read_tenant<R>(&self, tenant_id: &TenantId, operation: impl FnOnce(&TenantContext) -> R) -> R {
        let tenant = self.get_or_create(tenant_id);
        let context = lock(&tenant);
        operation(&*context)
    }

    pub fn save_all(&self) -> Result<()> {
        let tenants: Vec<SharedTenant> = self.tenants.read().unwrap_or_else(|poisoned| poisoned.into_inner()).values().cloned().collect();
        for tenant in tenants {
            lock(&tenant).save(&*self.persistence)?;
        }
        Ok(())
    }
}

fn lock(tenant: &SharedTenant) -> MutexGuard<'_, TenantContext> {
    tenant.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::clock_mock::MockClock;
    use crate::error::Error;
    use crate::persistence::memory_store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn registry(save_on_mutation: bool) -> (MemoryStore, TenantRegistry) {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap());
        let store = MemoryStore::new();
        let registry = TenantRegistry::new(Arc::new(store.clone()), SharedClock::new(clock), save_on_mutation);
        (store, registry)
    }

    #[test]
    fn test_get_or_create_caches_context() {
        let (_store, registry) = registry(false);
        let tenant_id = TenantId::new("a");

        let first = registry.get_or_create(&tenant_id);
        let second = registry.get_or_create(&tenant_id);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.tenant_ids(), vec![tenant_id]);
    }

    #[test]
    fn test_with_tenant_saves_on_mutation() {
        let (store, registry) = registry(true);
        let tenant_id = TenantId::new("a");

        registry.with_tenant(&tenant_id, |context| context.add_resource_type("Bed", 3, 40.84, -73.94)).unwrap();

        assert_eq!(store.list_tenants().unwrap(), vec![tenant_id]);
    }

    #[test]
    fn test_failed_operation_is_not_saved() {
        let (store, registry) = registry(true);
        let tenant_id = TenantId::new("a");

        let result = registry.with_tenant(&tenant_id, |context| context.add_resource_type("Bed", -1, 40.84, -73.94));

        assert!(matches!(result, Err(Error::InvalidQuantity(_))));
        assert!(store.list_tenants().unwrap().is_empty());
    }

    #[test]
    fn test_tenants_are_isolated() {
        let (_store, registry) = registry(false);
        let a = TenantId::new("a");
        let b = TenantId::new("b");

        registry.with_tenant(&a, |context| context.add_resource_type("Bed", 3, 40.84, -73.94)).unwrap();

        assert_eq!(registry.read_tenant(&a, |context| context.catalog.resource_types.len()), 1);
        assert_eq!(registry.read_tenant(&b, |context| context.catalog.resource_types.len()), 0);
    }

    #[test]
    fn test_reload_reads_persisted_tenants() {
        let (_store, registry) = registry(true);
        registry.with_tenant(&TenantId::new("a"), |context| context.add_resource_type("Bed", 3, 40.84, -73.94)).unwrap();
        registry.with_tenant(&TenantId::new("b"), |context| context.add_resource_type("Nurse", 1, 40.84, -73.94)).unwrap();

        let count = registry.reload().unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.read_tenant(&TenantId::new("b"), |context| context.catalog.resource_types.get_total_units()), 1);
    }
}
