use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::clock::clock::{SystemClock, truncate_to_minute};
use crate::domain::model::id::ResourceId;
use crate::error::{Error, Result};

/// A single allocatable unit. The unit is free at every instant at or after
/// `available_from`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    resource_id: ResourceId,
    available_from: DateTime<Utc>,
}

impl Resource {
    /// Creates a unit that is free immediately.
    pub fn new(resource_id: ResourceId, clock: &dyn SystemClock) -> Result<Self> {
        if resource_id.as_str().trim().is_empty() {
            return Err(Error::InvalidIdentifier("Resource ID cannot be empty.".to_string()));
        }
        Ok(Resource { resource_id, available_from: clock.get_current_time() })
    }

    /// Rebuilds a unit from persisted state without consulting the clock.
    pub(crate) fn restore(resource_id: ResourceId, available_from: DateTime<Utc>) -> Self {
        Resource { resource_id, available_from }
    }

    pub fn get_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn get_available_from(&self) -> DateTime<Utc> {
        self.available_from
    }

    pub fn is_available_at(&self, time: DateTime<Utc>) -> bool {
        time >= self.available_from
    }

    /// Holds the unit until `end`.
    ///
    /// `end` is compared with the current minute at minute granularity and
    /// must lie strictly after it. Returns the previous `available_from` so a
    /// caller can undo the reservation exactly.
    pub fn reserve_until(&mut self, end: DateTime<Utc>, clock: &dyn SystemClock) -> Result<DateTime<Utc>> {
        let now = clock.get_current_minute();
        let truncated_end = truncate_to_minute(end);

        if truncated_end < now {
            return Err(Error::InvalidReservation(format!("End time {} of {} cannot be in the past.", end, self.resource_id)));
        }
        if truncated_end == now {
            return Err(Error::InvalidReservation(format!("End time {} of {} cannot be exactly now.", end, self.resource_id)));
        }

        Ok(std::mem::replace(&mut self.available_from, end))
    }

    /// Makes the unit available immediately.
    pub fn release(&mut self, clock: &dyn SystemClock) {
        self.available_from = clock.get_current_time();
    }

    /// Puts back an `available_from` value returned by [`Resource::reserve_until`].
    pub(crate) fn restore_available_from(&mut self, available_from: DateTime<Utc>) {
        self.available_from = available_from;
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource ID: {}; Available From: {}", self.resource_id, self.available_from)
    }
}
