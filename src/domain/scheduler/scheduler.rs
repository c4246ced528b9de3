use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::catalog::resource_type_store::ResourceTypeStore;
use crate::domain::clock::clock::SharedClock;
use crate::domain::model::id::TaskId;
use crate::domain::model::resource_type::ResourceTypeKey;
use crate::domain::model::task::Task;
use crate::domain::scheduler::assignment::{AssignedResource, Assignment, ScheduledTask};
use crate::domain::scheduler::priority_compare::PriorityCompare;
use crate::error::{Error, Result};

/// Why a task could not be fully reserved in an allocation pass. Never
/// surfaced to callers, only logged.
#[derive(Debug)]
enum Unsatisfiable {
    EmptyWindow,
    UnknownResourceType(ResourceTypeKey),
    NotEnoughUnits { resource_type: ResourceTypeKey, available: usize, required: u32 },
    TooFar { resource_type: ResourceTypeKey, distance: f64 },
    ReservationRefused(Error),
}

impl fmt::Display for Unsatisfiable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsatisfiable::EmptyWindow => write!(f, "time window is empty"),
            Unsatisfiable::UnknownResourceType(key) => write!(f, "resource type {} is not in the catalog", key),
            Unsatisfiable::NotEnoughUnits { resource_type, available, required } => {
                write!(f, "{} of {} units of {} available", available, required, resource_type)
            }
            Unsatisfiable::TooFar { resource_type, distance } => write!(f, "{} is {:.3} km away", resource_type, distance),
            Unsatisfiable::ReservationRefused(e) => write!(f, "reservation refused: {}", e),
        }
    }
}

/// A unit reserved during the current attempt, with the `available_from` it
/// had before.
type Held = (AssignedResource, DateTime<Utc>);

/**
 * Greedy, priority-ordered allocation engine.
 *
 * Each pass visits the given tasks by ascending priority value and tries to
 * reserve every required unit of a task. A task is committed to the
 * assignment only if all of its requirements could be met. Otherwise every
 * unit reserved for it during the attempt is put back exactly as it was and
 * the pass moves on. Already scheduled tasks are skipped, so repeating a pass
 * is safe. There is no preemption: units held by a scheduled task are never
 * taken away for a more urgent one.
 */
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    assignment: Assignment,
    clock: SharedClock,
}

impl Scheduler {
    pub fn new(clock: SharedClock) -> Self {
        Self { assignment: Assignment::new(), clock }
    }

    pub fn with_assignment(assignment: Assignment, clock: SharedClock) -> Self {
        Self { assignment, clock }
    }

    pub fn get_assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn get_clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn is_scheduled(&self, task_id: &TaskId) -> bool {
        self.assignment.contains(task_id)
    }

    /// Runs one allocation pass over `tasks`.
    ///
    /// A task is only eligible for a resource type whose location lies within
    /// `max_distance` kilometers of the task.
    ///
    /// # Returns
    /// Returns the live assignment after the pass.
    pub fn allocate<'a>(
        &mut self,
        tasks: impl IntoIterator<Item = &'a Task>,
        store: &mut ResourceTypeStore,
        max_distance: f64,
    ) -> Result<&Assignment> {
        if max_distance.is_nan() || max_distance < 0.0 {
            return Err(Error::InvalidDistance(max_distance));
        }

        let ordered = PriorityCompare::sort(tasks);
        let mut newly_scheduled = 0;

        for task in ordered {
            if self.assignment.contains(task.get_task_id()) {
                continue;
            }
            if task.get_requirements().is_empty() {
                log::debug!("Skipping task {}, it requires no resources.", task.get_task_id());
                continue;
            }

            match self.try_reserve(task, store, max_distance) {
                Ok(resources) => {
                    log::debug!("Scheduled task {} with {} units.", task.get_task_id(), resources.len());
                    self.assignment.insert(ScheduledTask { task: task.clone(), resources });
                    newly_scheduled += 1;
                }
                Err(reason) => {
                    log::debug!("Task {} remains unscheduled: {}.", task.get_task_id(), reason);
                }
            }
        }

        log::info!("Allocation pass finished: {} newly scheduled, {} scheduled in total.", newly_scheduled, self.assignment.len());
        Ok(&self.assignment)
    }

    /// Removes a task from the assignment and releases every unit it holds.
    ///
    /// # Returns
    /// Returns the removed entry, or None if the task was not scheduled.
    pub fn unschedule(&mut self, task_id: &TaskId, store: &mut ResourceTypeStore) -> Option<ScheduledTask> {
        let scheduled = self.assignment.remove(task_id)?;

        for resource in &scheduled.resources {
            if !store.release_unit(&resource.resource_type, &resource.resource_id, &*self.clock) {
                log::warn!(
                    "Unit {} of {} held by task {} no longer exists, nothing to release.",
                    resource.resource_id,
                    resource.resource_type,
                    task_id
                );
            }
        }

        log::debug!("Unscheduled task {}, released {} units.", task_id, scheduled.resources.len());
        Some(scheduled)
    }

    pub(crate) fn rekey_resource_type(&mut self, old: &ResourceTypeKey, new: &ResourceTypeKey) {
        self.assignment.rekey_resource_type(old, new);
    }

    /// Reserves every unit `task` requires, or nothing at all.
    fn try_reserve(
        &self,
        task: &Task,
        store: &mut ResourceTypeStore,
        max_distance: f64,
    ) -> std::result::Result<Vec<AssignedResource>, Unsatisfiable> {
        if task.get_end_time() <= task.get_start_time() {
            return Err(Unsatisfiable::EmptyWindow);
        }

        let mut held: Vec<Held> = Vec::new();

        for (resource_type, &required) in task.get_requirements() {
            if let Err(reason) = self.reserve_requirement(task, resource_type, required, store, max_distance, &mut held) {
                Self::rollback(store, held);
                return Err(reason);
            }
        }

        Ok(held.into_iter().map(|(resource, _)| resource).collect())
    }

    fn reserve_requirement(
        &self,
        task: &Task,
        key: &ResourceTypeKey,
        required: u32,
        store: &mut ResourceTypeStore,
        max_distance: f64,
        held: &mut Vec<Held>,
    ) -> std::result::Result<(), Unsatisfiable> {
        let start = task.get_start_time();
        let end = task.get_end_time();

        let available = store.get(key).ok_or_else(|| Unsatisfiable::UnknownResourceType(key.clone()))?.count_available_units(start);
        if available < required as usize {
            return Err(Unsatisfiable::NotEnoughUnits { resource_type: key.clone(), available, required });
        }

        for _ in 0..required {
            let resource_type = store.get(key).ok_or_else(|| Unsatisfiable::UnknownResourceType(key.clone()))?;

            let Some(unit) = resource_type.find_available_unit(start) else {
                let available = resource_type.count_available_units(start);
                return Err(Unsatisfiable::NotEnoughUnits { resource_type: key.clone(), available, required });
            };
            let distance = resource_type.get_location().distance_to(task.get_location());
            if distance > max_distance {
                return Err(Unsatisfiable::TooFar { resource_type: key.clone(), distance });
            }
            let resource_id = unit.get_id().clone();

            let previous = store.reserve_unit(key, &resource_id, end, &*self.clock).map_err(Unsatisfiable::ReservationRefused)?;
            held.push((AssignedResource { resource_type: key.clone(), resource_id, reserved_until: end }, previous));
        }
        Ok(())
    }

    /// Puts units back in reverse reservation order.
    fn rollback(store: &mut ResourceTypeStore, held: Vec<Held>) {
        for (resource, previous) in held.into_iter().rev() {
            store.restore_unit(&resource.resource_type, &resource.resource_id, previous);
        }
    }
}
