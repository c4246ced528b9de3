use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::domain::model::id::{ResourceId, TaskId};
use crate::domain::model::resource_type::ResourceTypeKey;
use crate::domain::model::task::Task;

/// One unit held by a scheduled task.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedResource {
    pub resource_type: ResourceTypeKey,
    pub resource_id: ResourceId,
    pub reserved_until: DateTime<Utc>,
}

/// A task as it was when it got scheduled, with its units in reservation order.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub task: Task,
    pub resources: Vec<AssignedResource>,
}

/// Scheduled tasks in the order they were scheduled.
///
/// A task is present only if every one of its requirements was fully
/// reserved.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    entries: IndexMap<TaskId, ScheduledTask>,
}

impl Assignment {
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.entries.contains_key(task_id)
    }

    pub fn get(&self, task_id: &TaskId) -> Option<&ScheduledTask> {
        self.entries.get(task_id)
    }

    pub fn get_resources(&self, task_id: &TaskId) -> Option<&[AssignedResource]> {
        self.entries.get(task_id).map(|entry| entry.resources.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskId, &ScheduledTask)> {
        self.entries.iter()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any held unit belongs to the given resource type.
    pub fn uses_resource_type(&self, key: &ResourceTypeKey) -> bool {
        self.entries.values().any(|entry| entry.resources.iter().any(|resource| &resource.resource_type == key))
    }

    pub(crate) fn insert(&mut self, scheduled: ScheduledTask) {
        self.entries.insert(scheduled.task.get_task_id().clone(), scheduled);
    }

    pub(crate) fn remove(&mut self, task_id: &TaskId) -> Option<ScheduledTask> {
        self.entries.shift_remove(task_id)
    }

    pub(crate) fn rekey_resource_type(&mut self, old: &ResourceTypeKey, new: &ResourceTypeKey) {
        for entry in self.entries.values_mut() {
            entry.task.rekey_requirement(old, new.clone());
            for resource in entry.resources.iter_mut().filter(|resource| &resource.resource_type == old) {
                resource.resource_type = new.clone();
            }
        }
    }
}
