use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use std::sync::Arc;

/// Source of "now" for every time-dependent validation in the engine.
pub trait SystemClock: std::fmt::Debug + Send + Sync {
    fn get_current_time(&self) -> DateTime<Utc>;

    fn clone_box(&self) -> SharedClock;

    /// The current time truncated to whole minutes. Window and reservation
    /// checks compare at this granularity.
    fn get_current_minute(&self) -> DateTime<Utc> {
        truncate_to_minute(self.get_current_time())
    }
}

pub fn truncate_to_minute(time: DateTime<Utc>) -> DateTime<Utc> {
    time.duration_trunc(TimeDelta::minutes(1)).unwrap_or(time)
}

#[derive(Debug)]
pub struct SharedClock(pub Arc<dyn SystemClock>);

impl SharedClock {
    pub fn new(clock: impl SystemClock + 'static) -> Self {
        SharedClock(Arc::new(clock))
    }
}

impl Clone for SharedClock {
    fn clone(&self) -> Self {
        self.0.clone_box()
    }
}

impl std::ops::Deref for SharedClock {
    type Target = dyn SystemClock;
    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        SharedClock::new(WallClock)
    }
}

impl From<SharedClock> for Arc<dyn SystemClock> {
    fn from(wrapper: SharedClock) -> Self {
        wrapper.0
    }
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl SystemClock for WallClock {
    fn get_current_time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn clone_box(&self) -> SharedClock {
        SharedClock(Arc::new(*self))
    }
}
