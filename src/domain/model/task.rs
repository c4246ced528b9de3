use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::domain::clock::clock::{SystemClock, truncate_to_minute};
use crate::domain::model::id::TaskId;
use crate::domain::model::location::Location;
use crate::domain::model::resource_type::ResourceTypeKey;
use crate::error::{Error, Result};

pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 5;

/// A unit of demand: a time window at a location needing a number of units
/// of one or more resource types. Lower priority values are more urgent.
///
/// Equality and hashing use the task id only.
#[derive(Debug, Clone)]
pub struct Task {
    task_id: TaskId,
    task_name: String,
    requirements: IndexMap<ResourceTypeKey, u32>,
    priority: u8,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    location: Location,
}

impl Task {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_id: TaskId,
        task_name: impl Into<String>,
        priority: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        clock: &dyn SystemClock,
    ) -> Result<Self> {
        let task_name = task_name.into();
        if task_id.as_str().trim().is_empty() {
            return Err(Error::InvalidIdentifier("Task ID cannot be empty.".to_string()));
        }
        if task_name.trim().is_empty() {
            return Err(Error::InvalidIdentifier("Task name cannot be empty.".to_string()));
        }
        let priority = validate_priority(priority)?;
        validate_window(start_time, end_time, clock)?;
        let location = Location::new(latitude, longitude)?;

        Ok(Task { task_id, task_name, requirements: IndexMap::new(), priority, start_time, end_time, location })
    }

    /// Rebuilds a persisted task. The time window is trusted as stored, since
    /// it may legitimately lie in the past by now.
    pub(crate) fn restore(
        task_id: TaskId,
        task_name: String,
        priority: u8,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        location: Location,
        requirements: IndexMap<ResourceTypeKey, u32>,
    ) -> Self {
        Task { task_id, task_name, requirements, priority, start_time, end_time, location }
    }

    pub fn get_task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn get_task_name(&self) -> &str {
        &self.task_name
    }

    pub fn get_priority(&self) -> u8 {
        self.priority
    }

    pub fn get_start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn get_end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn get_location(&self) -> &Location {
        &self.location
    }

    pub fn get_requirements(&self) -> &IndexMap<ResourceTypeKey, u32> {
        &self.requirements
    }

    pub fn get_requirement(&self, key: &ResourceTypeKey) -> Option<u32> {
        self.requirements.get(key).copied()
    }

    pub fn requires(&self, key: &ResourceTypeKey) -> bool {
        self.requirements.contains_key(key)
    }

    /// Total number of units across all requirements.
    pub fn get_total_required_units(&self) -> u64 {
        self.requirements.values().map(|&count| u64::from(count)).sum()
    }

    pub fn update_priority(&mut self, priority: i64) -> Result<()> {
        self.priority = validate_priority(priority)?;
        Ok(())
    }

    pub fn update_window(&mut self, start_time: DateTime<Utc>, end_time: DateTime<Utc>, clock: &dyn SystemClock) -> Result<()> {
        validate_window(start_time, end_time, clock)?;
        self.start_time = start_time;
        self.end_time = end_time;
        Ok(())
    }

    /// Adds, updates or removes the requirement for one resource type.
    /// A quantity of zero removes the entry.
    pub fn set_requirement(&mut self, resource_type: ResourceTypeKey, quantity: i64) -> Result<()> {
        if quantity < 0 {
            return Err(Error::InvalidQuantity(format!("Quantity cannot be negative, got {}.", quantity)));
        }
        let quantity = u32::try_from(quantity).map_err(|_| Error::InvalidQuantity(format!("Quantity {} is too large.", quantity)))?;

        if quantity == 0 {
            self.requirements.shift_remove(&resource_type);
        } else {
            self.requirements.insert(resource_type, quantity);
        }
        Ok(())
    }

    pub fn update_location(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        self.location = Location::new(latitude, longitude)?;
        Ok(())
    }

    /// Moves a requirement to a new key, keeping its position and quantity.
    pub(crate) fn rekey_requirement(&mut self, old: &ResourceTypeKey, new: ResourceTypeKey) {
        let Some(index) = self.requirements.get_index_of(old) else {
            return;
        };
        if let Some((_, count)) = self.requirements.shift_remove_index(index) {
            self.requirements.shift_insert(index, new, count);
        }
    }
}

fn validate_priority(priority: i64) -> Result<u8> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(Error::InvalidPriority(priority));
    }
    Ok(priority as u8)
}

/// Checks a window at minute granularity: neither bound before the current
/// minute, and the end strictly after the start.
fn validate_window(start_time: DateTime<Utc>, end_time: DateTime<Utc>, clock: &dyn SystemClock) -> Result<()> {
    let now = clock.get_current_minute();
    let start = truncate_to_minute(start_time);
    let end = truncate_to_minute(end_time);

    if start < now {
        return Err(Error::InvalidTimeWindow(format!("Start time {} cannot be in the past.", start_time)));
    }
    if end < now {
        return Err(Error::InvalidTimeWindow(format!("End time {} cannot be in the past.", end_time)));
    }
    if end <= start {
        return Err(Error::InvalidTimeWindow("End time cannot be before or same as the start time.".to_string()));
    }
    Ok(())
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.task_id == other.task_id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.task_id.hash(state);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Task ID: {}; Name: {}; Priority: {}", self.task_id, self.task_name, self.priority)?;
        writeln!(f, "Window: {} - {}; Location: {}", self.start_time, self.end_time, self.location)?;
        for (key, count) in &self.requirements {
            writeln!(f, "  {} x {}", count, key)?;
        }
        Ok(())
    }
}
