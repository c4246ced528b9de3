use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::fmt;

use crate::domain::clock::clock::SystemClock;
use crate::domain::model::id::ResourceId;
use crate::domain::model::location::Location;
use crate::domain::model::resource::Resource;
use crate::error::{Error, Result};

/// Identity of a resource type: its name and its location.
///
/// Two independently constructed resource types with the same name and
/// location resolve to the same key, whatever their pool contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceTypeKey {
    pub type_name: String,
    pub location: Location,
}

impl ResourceTypeKey {
    pub fn new(type_name: impl Into<String>, location: Location) -> Self {
        Self { type_name: type_name.into(), location }
    }
}

impl fmt::Display for ResourceTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ ({})", self.type_name, self.location)
    }
}

/// A named pool of interchangeable units sharing one location.
#[derive(Debug, Clone)]
pub struct ResourceType {
    type_name: String,
    resources: IndexMap<ResourceId, Resource>,
    location: Location,
}

impl ResourceType {
    pub fn new(type_name: impl Into<String>, total_units: i64, latitude: f64, longitude: f64, clock: &dyn SystemClock) -> Result<Self> {
        let type_name = type_name.into();
        if type_name.trim().is_empty() {
            return Err(Error::InvalidIdentifier("Resource type name cannot be empty.".to_string()));
        }
        if total_units < 0 {
            return Err(Error::InvalidQuantity(format!("Number of total units cannot be negative, got {}.", total_units)));
        }
        let location = Location::new(latitude, longitude)?;

        let mut resource_type = ResourceType { type_name, resources: IndexMap::new(), location };
        for _ in 0..total_units {
            resource_type.add_unit(clock);
        }
        Ok(resource_type)
    }

    /// Rebuilds a pool from persisted units. Unit ids are taken as given.
    pub(crate) fn restore(type_name: String, location: Location, units: Vec<Resource>) -> Self {
        let resources = units.into_iter().map(|unit| (unit.get_id().clone(), unit)).collect();
        ResourceType { type_name, resources, location }
    }

    pub fn get_key(&self) -> ResourceTypeKey {
        ResourceTypeKey::new(self.type_name.clone(), self.location)
    }

    pub fn get_type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get_location(&self) -> &Location {
        &self.location
    }

    pub fn get_total_units(&self) -> usize {
        self.resources.len()
    }

    pub fn get_resource(&self, resource_id: &ResourceId) -> Option<&Resource> {
        self.resources.get(resource_id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Appends a unit named `"<type name> <n>"`, free immediately.
    pub fn add_unit(&mut self, clock: &dyn SystemClock) -> ResourceId {
        let mut number = self.resources.len() + 1;
        let mut resource_id = ResourceId::new(format!("{} {}", self.type_name, number));
        // Restored pools may carry arbitrary ids, skip any that are taken.
        while self.resources.contains_key(&resource_id) {
            number += 1;
            resource_id = ResourceId::new(format!("{} {}", self.type_name, number));
        }

        let resource = Resource::restore(resource_id.clone(), clock.get_current_time());
        self.resources.insert(resource_id.clone(), resource);
        resource_id
    }

    /// Returns the first unit in pool order that is free at `time`.
    pub fn find_available_unit(&self, time: DateTime<Utc>) -> Option<&Resource> {
        self.resources.values().find(|resource| resource.is_available_at(time))
    }

    pub fn count_available_units(&self, time: DateTime<Utc>) -> usize {
        self.resources.values().filter(|resource| resource.is_available_at(time)).count()
    }

    /// Replaces the location. The key of this type changes with it.
    pub fn update_location(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        self.location = Location::new(latitude, longitude)?;
        Ok(())
    }

    pub(crate) fn get_resource_mut(&mut self, resource_id: &ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(resource_id)
    }
}

/// Equality follows the key: name and location only.
impl PartialEq for ResourceType {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.location == other.location
    }
}

impl Eq for ResourceType {}

impl std::hash::Hash for ResourceType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        self.location.hash(state);
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Location: {}", self.type_name, self.location.get_coordinates())?;
        writeln!(f, "Resources:")?;
        for resource in self.resources.values() {
            writeln!(f, "{}", resource)?;
        }
        Ok(())
    }
}
