use chrono::{DateTime, Utc};

use crate::domain::catalog::resource_type_store::ResourceTypeStore;
use crate::domain::clock::clock::SystemClock;
use crate::domain::model::id::TaskId;
use crate::domain::model::resource_type::{ResourceType, ResourceTypeKey};
use crate::domain::model::task::Task;
use crate::error::{Error, Result};

/// The task list and resource pools of one tenant.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tasks: Vec<Task>,
    pub resource_types: ResourceTypeStore,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(tasks: Vec<Task>, resource_types: ResourceTypeStore) -> Self {
        Self { tasks, resource_types }
    }

    //---------------------
    // --- Task Methods ---
    //---------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Borrows the task list and the pools at the same time, as an allocation
    /// pass reads the former while reserving from the latter.
    pub(crate) fn tasks_and_resource_types_mut(&mut self) -> (&[Task], &mut ResourceTypeStore) {
        (&self.tasks, &mut self.resource_types)
    }

    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.get_task(task.get_task_id()).is_some() {
            return Err(Error::DuplicateTask(task.get_task_id().to_string()));
        }
        log::info!("Added task {} ({}).", task.get_task_id(), task.get_task_name());
        self.tasks.push(task);
        Ok(())
    }

    /// Creates a task with a fresh random id and no requirements.
    #[allow(clippy::too_many_arguments)]
    pub fn create_task(
        &mut self,
        task_name: &str,
        priority: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        clock: &dyn SystemClock,
    ) -> Result<TaskId> {
        let task_id = TaskId::new(uuid::Uuid::new_v4().to_string());
        let task = Task::new(task_id.clone(), task_name, priority, start_time, end_time, latitude, longitude, clock)?;
        self.add_task(task)?;
        Ok(task_id)
    }

    pub fn get_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.get_task_id() == task_id)
    }

    pub fn get_task_mut(&mut self, task_id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.get_task_id() == task_id)
    }

    pub fn remove_task(&mut self, task_id: &TaskId) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.get_task_id() == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    /// Sets the quantity of the named resource type a task needs. The type is
    /// resolved by name, taking the first match in catalog order.
    pub fn set_task_requirement(&mut self, task_id: &TaskId, type_name: &str, quantity: i64) -> Result<ResourceTypeKey> {
        let key = self
            .resource_types
            .find_by_name(type_name)
            .map(ResourceType::get_key)
            .ok_or_else(|| Error::ResourceTypeNotFound(type_name.to_string()))?;
        let task = self.get_task_mut(task_id).ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

        task.set_requirement(key.clone(), quantity)?;
        Ok(key)
    }

    //------------------------------
    // --- Resource Type Methods ---
    //------------------------------

    pub fn add_resource_type(&mut self, resource_type: ResourceType, clock: &dyn SystemClock) -> ResourceTypeKey {
        let key = self.resource_types.add(resource_type, clock);
        log::info!("Resource type {} now has {} units.", key, self.resource_types.get(&key).map_or(0, |t| t.get_total_units()));
        key
    }

    /// Tasks whose requirements name `key`.
    pub fn tasks_requiring<'a>(&'a self, key: &'a ResourceTypeKey) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |task| task.requires(key))
    }

    /// Removes the first resource type with the given name. Fails if any task
    /// still requires it.
    pub fn remove_resource_type(&mut self, type_name: &str) -> Result<ResourceType> {
        let key = self
            .resource_types
            .find_by_name(type_name)
            .map(ResourceType::get_key)
            .ok_or_else(|| Error::ResourceTypeNotFound(type_name.to_string()))?;

        if let Some(task) = self.tasks_requiring(&key).next() {
            log::debug!("Resource type {} is still required by task {}.", key, task.get_task_id());
            return Err(Error::ResourceTypeInUse(key.to_string()));
        }

        self.resource_types.remove(&key).ok_or_else(|| Error::ResourceTypeNotFound(type_name.to_string()))
    }

    /// Moves a resource type and rewrites every task requirement that named it.
    pub fn relocate_resource_type(&mut self, key: &ResourceTypeKey, latitude: f64, longitude: f64) -> Result<ResourceTypeKey> {
        let new_key = self.resource_types.relocate(key, latitude, longitude)?;
        for task in self.tasks.iter_mut() {
            task.rekey_requirement(key, new_key.clone());
        }
        Ok(new_key)
    }
}
