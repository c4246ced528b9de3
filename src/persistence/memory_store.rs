use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::model::id::TenantId;
use crate::error::{Error, Result};
use crate::persistence::persistence_trait::{Aggregate, AggregateKind, Persistence};

/// Keeps aggregates in process memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<(TenantId, AggregateKind), Aggregate>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryStore {
    fn load(&self, tenant_id: &TenantId, kind: AggregateKind) -> Result<Aggregate> {
        let guard = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.get(&(tenant_id.clone(), kind)).cloned().ok_or_else(|| {
            Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No {} stored for tenant {}", kind.file_stem(), tenant_id),
            ))
        })
    }

    fn save(&self, tenant_id: &TenantId, aggregate: &Aggregate) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert((tenant_id.clone(), aggregate.kind()), aggregate.clone());
        Ok(())
    }

    fn list_tenants(&self) -> Result<Vec<TenantId>> {
        let guard = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut tenants: Vec<TenantId> =
            guard.keys().filter(|(_, kind)| *kind == AggregateKind::Tasks).map(|(tenant_id, _)| tenant_id.clone()).collect();
        tenants.sort();
        Ok(tenants)
    }
}
