use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::resource_type_store::ResourceTypeStore;
use crate::domain::model::id::{ResourceId, TaskId};
use crate::domain::model::location::Location;
use crate::domain::model::resource::Resource;
use crate::domain::model::resource_type::{ResourceType, ResourceTypeKey};
use crate::domain::model::task::{MAX_PRIORITY, MIN_PRIORITY, Task};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Location> for LocationDto {
    fn from(location: &Location) -> Self {
        LocationDto { latitude: location.get_latitude(), longitude: location.get_longitude() }
    }
}

impl TryFrom<LocationDto> for Location {
    type Error = Error;

    fn try_from(dto: LocationDto) -> Result<Self> {
        Location::new(dto.latitude, dto.longitude)
    }
}

/// Identity of a resource type as it appears in persisted requirement maps
/// and assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeKeyDto {
    pub type_name: String,
    pub location: LocationDto,
}

impl From<&ResourceTypeKey> for ResourceTypeKeyDto {
    fn from(key: &ResourceTypeKey) -> Self {
        ResourceTypeKeyDto { type_name: key.type_name.clone(), location: LocationDto::from(&key.location) }
    }
}

impl TryFrom<ResourceTypeKeyDto> for ResourceTypeKey {
    type Error = Error;

    fn try_from(dto: ResourceTypeKeyDto) -> Result<Self> {
        if dto.type_name.trim().is_empty() {
            return Err(Error::InvalidIdentifier("Resource type name cannot be empty.".to_string()));
        }
        Ok(ResourceTypeKey::new(dto.type_name, Location::try_from(dto.location)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    pub resource_id: String,
    pub available_from: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeDto {
    pub type_name: String,
    pub location: LocationDto,
    pub resources: Vec<ResourceDto>,
}

impl From<&ResourceType> for ResourceTypeDto {
    fn from(resource_type: &ResourceType) -> Self {
        ResourceTypeDto {
            type_name: resource_type.get_type_name().to_string(),
            location: LocationDto::from(resource_type.get_location()),
            resources: resource_type
                .resources()
                .map(|resource| ResourceDto { resource_id: resource.get_id().to_string(), available_from: resource.get_available_from() })
                .collect(),
        }
    }
}

impl TryFrom<ResourceTypeDto> for ResourceType {
    type Error = Error;

    fn try_from(dto: ResourceTypeDto) -> Result<Self> {
        if dto.type_name.trim().is_empty() {
            return Err(Error::InvalidIdentifier("Resource type name cannot be empty.".to_string()));
        }
        let location = Location::try_from(dto.location)?;
        let units = dto
            .resources
            .into_iter()
            .map(|unit| {
                let resource_id = ResourceId::parse(unit.resource_id)?;
                Ok(Resource::restore(resource_id, unit.available_from))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResourceType::restore(dto.type_name, location, units))
    }
}

/// Builds a store from persisted pools. Pools with the same key are merged.
pub fn store_from_dtos(dtos: Vec<ResourceTypeDto>) -> Result<ResourceTypeStore> {
    let mut store = ResourceTypeStore::new();
    for dto in dtos {
        let resource_type = ResourceType::try_from(dto)?;
        let key = resource_type.get_key();
        if store.contains(&key) {
            log::warn!("Duplicate resource type {} in persisted catalog, keeping the first.", key);
            continue;
        }
        store.insert_restored(resource_type);
    }
    Ok(store)
}

pub fn store_to_dtos(store: &ResourceTypeStore) -> Vec<ResourceTypeDto> {
    store.iter().map(ResourceTypeDto::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementDto {
    pub resource_type: ResourceTypeKeyDto,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub task_id: String,
    pub task_name: String,
    pub priority: u8,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: LocationDto,
    #[serde(default)]
    pub requirements: Vec<RequirementDto>,
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        TaskDto {
            task_id: task.get_task_id().to_string(),
            task_name: task.get_task_name().to_string(),
            priority: task.get_priority(),
            start_time: task.get_start_time(),
            end_time: task.get_end_time(),
            location: LocationDto::from(task.get_location()),
            requirements: task
                .get_requirements()
                .iter()
                .map(|(key, &quantity)| RequirementDto { resource_type: ResourceTypeKeyDto::from(key), quantity })
                .collect(),
        }
    }
}

/// Persisted tasks are trusted: the time window is not checked against the
/// current time, but identifiers, priority and coordinates still are.
impl TryFrom<TaskDto> for Task {
    type Error = Error;

    fn try_from(dto: TaskDto) -> Result<Self> {
        let task_id = TaskId::parse(dto.task_id)?;
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&i64::from(dto.priority)) {
            return Err(Error::InvalidPriority(i64::from(dto.priority)));
        }
        let location = Location::try_from(dto.location)?;

        let mut requirements = IndexMap::with_capacity(dto.requirements.len());
        for requirement in dto.requirements {
            if requirement.quantity > 0 {
                requirements.insert(ResourceTypeKey::try_from(requirement.resource_type)?, requirement.quantity);
            }
        }

        Ok(Task::restore(task_id, dto.task_name, dto.priority, dto.start_time, dto.end_time, location, requirements))
    }
}
