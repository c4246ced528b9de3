use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::domain::clock::clock::SystemClock;
use crate::domain::model::id::ResourceId;
use crate::domain::model::resource_type::{ResourceType, ResourceTypeKey};
use crate::error::{Error, Result};

/// Owns every resource pool of one tenant, indexed by resource type identity.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeStore {
    types: IndexMap<ResourceTypeKey, ResourceType>,
}

impl ResourceTypeStore {
    pub fn new() -> Self {
        Self { types: IndexMap::new() }
    }

    //---------------------
    // --- Pool Methods ---
    //---------------------

    /// Inserts `resource_type`. If a type with the same key already exists,
    /// that pool grows by the new type's unit count instead.
    ///
    /// # Returns
    /// Returns the key under which the pool is stored.
    pub fn add(&mut self, resource_type: ResourceType, clock: &dyn SystemClock) -> ResourceTypeKey {
        let key = resource_type.get_key();

        match self.types.get_mut(&key) {
            Some(existing) => {
                for _ in 0..resource_type.get_total_units() {
                    existing.add_unit(clock);
                }
                log::debug!("Resource type {} grew to {} units.", key, existing.get_total_units());
            }
            None => {
                self.types.insert(key.clone(), resource_type);
            }
        }
        key
    }

    /// Inserts a persisted pool as-is, replacing any pool with the same key.
    pub(crate) fn insert_restored(&mut self, resource_type: ResourceType) {
        self.types.insert(resource_type.get_key(), resource_type);
    }

    pub fn get(&self, key: &ResourceTypeKey) -> Option<&ResourceType> {
        self.types.get(key)
    }

    pub fn get_mut(&mut self, key: &ResourceTypeKey) -> Option<&mut ResourceType> {
        self.types.get_mut(key)
    }

    pub fn contains(&self, key: &ResourceTypeKey) -> bool {
        self.types.contains_key(key)
    }

    /// First type in insertion order with the given name.
    pub fn find_by_name(&self, type_name: &str) -> Option<&ResourceType> {
        self.types.values().find(|resource_type| resource_type.get_type_name() == type_name)
    }

    pub fn remove(&mut self, key: &ResourceTypeKey) -> Option<ResourceType> {
        self.types.shift_remove(key)
    }

    /// Moves the pool at `key` to a new location.
    ///
    /// # Returns
    /// Returns the new key. The pool keeps its position in the store.
    pub fn relocate(&mut self, key: &ResourceTypeKey, latitude: f64, longitude: f64) -> Result<ResourceTypeKey> {
        let index = self.types.get_index_of(key).ok_or_else(|| Error::ResourceTypeNotFound(key.to_string()))?;

        let mut resource_type = self.types[index].clone();
        resource_type.update_location(latitude, longitude)?;
        let new_key = resource_type.get_key();

        if new_key != *key && self.types.contains_key(&new_key) {
            return Err(Error::InvalidLocation(format!("A resource type {} already exists.", new_key)));
        }

        self.types.shift_remove_index(index);
        self.types.shift_insert(index, new_key.clone(), resource_type);
        Ok(new_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    //---------------------
    // --- Unit Methods ---
    //---------------------

    /// Reserves one unit until `end`.
    ///
    /// # Returns
    /// Returns the unit's previous `available_from`, to be handed back to
    /// [`ResourceTypeStore::restore_unit`] on rollback.
    pub fn reserve_unit(
        &mut self,
        key: &ResourceTypeKey,
        resource_id: &ResourceId,
        end: DateTime<Utc>,
        clock: &dyn SystemClock,
    ) -> Result<DateTime<Utc>> {
        let resource = self
            .types
            .get_mut(key)
            .and_then(|resource_type| resource_type.get_resource_mut(resource_id))
            .ok_or_else(|| Error::InvalidReservation(format!("Unit {} of {} does not exist.", resource_id, key)))?;

        resource.reserve_until(end, clock)
    }

    /// Releases one unit. Returns false if the unit no longer exists.
    pub fn release_unit(&mut self, key: &ResourceTypeKey, resource_id: &ResourceId, clock: &dyn SystemClock) -> bool {
        match self.types.get_mut(key).and_then(|resource_type| resource_type.get_resource_mut(resource_id)) {
            Some(resource) => {
                resource.release(clock);
                true
            }
            None => false,
        }
    }

    pub(crate) fn restore_unit(&mut self, key: &ResourceTypeKey, resource_id: &ResourceId, available_from: DateTime<Utc>) {
        if let Some(resource) = self.types.get_mut(key).and_then(|resource_type| resource_type.get_resource_mut(resource_id)) {
            resource.restore_available_from(available_from);
        }
    }

    //----------------------------
    // --- Aggregation Methods ---
    //----------------------------

    pub fn get_total_units(&self) -> usize {
        self.types.values().map(|resource_type| resource_type.get_total_units()).sum()
    }

    pub fn count_available_units(&self, time: DateTime<Utc>) -> usize {
        self.types.values().map(|resource_type| resource_type.count_available_units(time)).sum()
    }
}
