use chrono::{DateTime, Utc};

use crate::api::model_dto::{TaskDto, store_from_dtos, store_to_dtos};
use crate::api::schedule_dto::ScheduleDto;
use crate::domain::catalog::catalog::Catalog;
use crate::domain::catalog::resource_type_store::ResourceTypeStore;
use crate::domain::clock::clock::SharedClock;
use crate::domain::model::id::{TaskId, TenantId};
use crate::domain::model::resource_type::{ResourceType, ResourceTypeKey};
use crate::domain::model::task::Task;
use crate::domain::scheduler::assignment::{Assignment, ScheduledTask};
use crate::domain::scheduler::scheduler::Scheduler;
use crate::error::{Error, Result};
use crate::persistence::persistence_trait::{Aggregate, AggregateKind, Persistence};

/**
 * Everything one tenant owns: the catalog of tasks and resource pools plus
 * the scheduler holding the current assignment.
 *
 * All mutating calls go through `&mut self`. Callers sharing a context
 * between threads must hold it behind a single lock, see `TenantRegistry`.
 */
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant_id: TenantId,
    pub catalog: Catalog,
    scheduler: Scheduler,
    clock: SharedClock,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId, clock: SharedClock) -> Self {
        Self { tenant_id, catalog: Catalog::new(), scheduler: Scheduler::new(clock.clone()), clock }
    }

    pub fn get_tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn get_clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn get_scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn get_assignment(&self) -> &Assignment {
        self.scheduler.get_assignment()
    }

    //---------------------
    // --- Task Methods ---
    //---------------------

    pub fn add_task(&mut self, task: Task) -> Result<()> {
        self.catalog.add_task(task)
    }

    pub fn create_task(
        &mut self,
        task_name: &str,
        priority: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
    ) -> Result<TaskId> {
        self.catalog.create_task(task_name, priority, start_time, end_time, latitude, longitude, &*self.clock)
    }

    pub fn get_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.catalog.get_task(task_id)
    }

    /// Unschedules the task, releasing its units, then removes it from the catalog.
    pub fn delete_task(&mut self, task_id: &TaskId) -> Result<Task> {
        if self.catalog.get_task(task_id).is_none() {
            return Err(Error::TaskNotFound(task_id.to_string()));
        }
        self.unschedule(task_id);
        let task = self.catalog.remove_task(task_id)?;
        log::info!("Tenant {}: deleted task {}.", self.tenant_id, task_id);
        Ok(task)
    }

    pub fn set_task_requirement(&mut self, task_id: &TaskId, type_name: &str, quantity: i64) -> Result<ResourceTypeKey> {
        self.catalog.set_task_requirement(task_id, type_name, quantity)
    }

    //------------------------------
    // --- Resource Type Methods ---
    //------------------------------

    pub fn add_resource_type(&mut self, type_name: &str, total_units: i64, latitude: f64, longitude: f64) -> Result<ResourceTypeKey> {
        let resource_type = ResourceType::new(type_name, total_units, latitude, longitude, &*self.clock)?;
        Ok(self.catalog.add_resource_type(resource_type, &*self.clock))
    }

    /// Fails while any task requires the type or any scheduled task holds one of its units.
    pub fn delete_resource_type(&mut self, type_name: &str) -> Result<ResourceType> {
        if let Some(resource_type) = self.catalog.resource_types.find_by_name(type_name) {
            let key = resource_type.get_key();
            if self.scheduler.get_assignment().uses_resource_type(&key) {
                return Err(Error::ResourceTypeInUse(key.to_string()));
            }
        }
        let removed = self.catalog.remove_resource_type(type_name)?;
        log::info!("Tenant {}: deleted resource type {}.", self.tenant_id, removed.get_key());
        Ok(removed)
    }

    pub fn relocate_resource_type(&mut self, key: &ResourceTypeKey, latitude: f64, longitude: f64) -> Result<ResourceTypeKey> {
        let new_key = self.catalog.relocate_resource_type(key, latitude, longitude)?;
        self.scheduler.rekey_resource_type(key, &new_key);
        log::info!("Tenant {}: moved resource type {} to {}.", self.tenant_id, key, new_key.location);
        Ok(new_key)
    }

    //--------------------------
    // --- Schedule Methods ---
    //--------------------------

    /// Runs an allocation pass over every task in the catalog.
    pub fn schedule(&mut self, max_distance: f64) -> Result<&Assignment> {
        let (tasks, resource_types) = self.catalog.tasks_and_resource_types_mut();
        self.scheduler.allocate(tasks.iter(), resource_types, max_distance)
    }

    pub fn unschedule(&mut self, task_id: &TaskId) -> Option<ScheduledTask> {
        self.scheduler.unschedule(task_id, &mut self.catalog.resource_types)
    }

    //-----------------------------
    // --- Persistence Methods ---
    //-----------------------------

    /// Restores a tenant from `persistence`. Any aggregate that cannot be
    /// loaded or converted starts empty.
    pub fn load(persistence: &dyn Persistence, tenant_id: TenantId, clock: SharedClock) -> Self {
        let resource_types = match persistence.load(&tenant_id, AggregateKind::ResourceTypes) {
            Ok(Aggregate::ResourceTypes(dtos)) => restore_or_empty(&tenant_id, AggregateKind::ResourceTypes, store_from_dtos(dtos)),
            other => load_failed(&tenant_id, AggregateKind::ResourceTypes, other),
        };

        let tasks = match persistence.load(&tenant_id, AggregateKind::Tasks) {
            Ok(Aggregate::Tasks(dtos)) => restore_or_empty(&tenant_id, AggregateKind::Tasks, restore_tasks(dtos)),
            other => load_failed(&tenant_id, AggregateKind::Tasks, other),
        };

        let mut catalog = Catalog::new();
        catalog.resource_types = resource_types;
        for task in tasks {
            if let Err(e) = catalog.add_task(task) {
                log::warn!("Tenant {}: skipping persisted task. {}", tenant_id, e);
            }
        }

        let schedule = match persistence.load(&tenant_id, AggregateKind::Schedule) {
            Ok(Aggregate::Schedule(dto)) => dto,
            other => load_failed(&tenant_id, AggregateKind::Schedule, other),
        };
        let assignment = relink_assignment(&tenant_id, schedule, &catalog);

        log::info!(
            "Loaded tenant {}: {} tasks, {} resource types, {} scheduled tasks.",
            tenant_id,
            catalog.tasks().len(),
            catalog.resource_types.len(),
            assignment.len()
        );

        Self { tenant_id, catalog, scheduler: Scheduler::with_assignment(assignment, clock.clone()), clock }
    }

    pub fn save(&self, persistence: &dyn Persistence) -> Result<()> {
        let tasks = self.catalog.tasks().iter().map(TaskDto::from).collect();
        persistence.save(&self.tenant_id, &Aggregate::Tasks(tasks))?;
        persistence.save(&self.tenant_id, &Aggregate::ResourceTypes(store_to_dtos(&self.catalog.resource_types)))?;
        persistence.save(&self.tenant_id, &Aggregate::Schedule(ScheduleDto::from(self.get_assignment())))?;
        log::debug!("Saved tenant {}.", self.tenant_id);
        Ok(())
    }
}

fn restore_tasks(dtos: Vec<TaskDto>) -> Result<Vec<Task>> {
    dtos.into_iter().map(Task::try_from).collect()
}

fn restore_or_empty<T: Default>(tenant_id: &TenantId, kind: AggregateKind, restored: Result<T>) -> T {
    restored.unwrap_or_else(|e| {
        log::warn!("Tenant {}: persisted {} are invalid, starting empty. {}", tenant_id, kind.file_stem(), e);
        T::default()
    })
}

fn load_failed<T: Default>(tenant_id: &TenantId, kind: AggregateKind, loaded: Result<Aggregate>) -> T {
    match loaded {
        Err(e) => log::warn!("Tenant {}: could not load {}, starting empty. {}", tenant_id, kind.file_stem(), e),
        Ok(other) => log::warn!("Tenant {}: expected {} but storage returned {:?}.", tenant_id, kind.file_stem(), other.kind()),
    }
    T::default()
}

/// Keeps only entries whose task is in the catalog and whose units all still
/// exist in their pools. Entries take the catalog's copy of the task.
fn relink_assignment(tenant_id: &TenantId, schedule: ScheduleDto, catalog: &Catalog) -> Assignment {
    let mut assignment = Assignment::new();

    for entry in schedule.entries {
        let scheduled = match ScheduledTask::try_from(entry) {
            Ok(scheduled) => scheduled,
            Err(e) => {
                log::warn!("Tenant {}: dropping unreadable schedule entry. {}", tenant_id, e);
                continue;
            }
        };
        let task_id = scheduled.task.get_task_id().clone();

        let Some(task) = catalog.get_task(&task_id) else {
            log::warn!("Tenant {}: dropping schedule entry for unknown task {}.", tenant_id, task_id);
            continue;
        };
        if !units_exist(&scheduled, &catalog.resource_types) {
            log::warn!("Tenant {}: dropping schedule entry for task {}, a held unit no longer exists.", tenant_id, task_id);
            continue;
        }
        if assignment.contains(&task_id) {
            continue;
        }

        assignment.insert(ScheduledTask { task: task.clone(), resources: scheduled.resources });
    }
    assignment
}

fn units_exist(scheduled: &ScheduledTask, store: &ResourceTypeStore) -> bool {
    scheduled.resources.iter().all(|held| {
        store
            .get(&held.resource_type)
            .is_some_and(|resource_type| resource_type.get_resource(&held.resource_id).is_some())
    })
}
