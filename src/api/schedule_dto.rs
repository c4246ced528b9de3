use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::model_dto::{ResourceTypeKeyDto, TaskDto};
use crate::domain::model::id::ResourceId;
use crate::domain::model::resource_type::ResourceTypeKey;
use crate::domain::model::task::Task;
use crate::domain::scheduler::assignment::{AssignedResource, Assignment, ScheduledTask};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedResourceDto {
    pub resource_type: ResourceTypeKeyDto,
    pub resource_id: String,
    pub reserved_until: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTaskDto {
    pub task: TaskDto,
    pub resources: Vec<AssignedResourceDto>,
}

/// The assignment in scheduling order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub entries: Vec<ScheduledTaskDto>,
}

impl From<&Assignment> for ScheduleDto {
    fn from(assignment: &Assignment) -> Self {
        let entries = assignment
            .iter()
            .map(|(_, scheduled)| ScheduledTaskDto {
                task: TaskDto::from(&scheduled.task),
                resources: scheduled
                    .resources
                    .iter()
                    .map(|resource| AssignedResourceDto {
                        resource_type: ResourceTypeKeyDto::from(&resource.resource_type),
                        resource_id: resource.resource_id.to_string(),
                        reserved_until: resource.reserved_until,
                    })
                    .collect(),
            })
            .collect();
        ScheduleDto { entries }
    }
}

impl TryFrom<ScheduledTaskDto> for ScheduledTask {
    type Error = Error;

    fn try_from(dto: ScheduledTaskDto) -> Result<Self> {
        let task = Task::try_from(dto.task)?;
        let resources = dto
            .resources
            .into_iter()
            .map(|resource| {
                Ok(AssignedResource {
                    resource_type: ResourceTypeKey::try_from(resource.resource_type)?,
                    resource_id: ResourceId::parse(resource.resource_id)?,
                    reserved_until: resource.reserved_until,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ScheduledTask { task, resources })
    }
}
