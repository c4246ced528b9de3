use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, RwLock};

use crate::domain::clock::clock::{SharedClock, SystemClock};

/// Manually driven clock. Clones share the same instant, so advancing one
/// handle is observed by every component holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    pub time: Arc<RwLock<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(time: DateTime<Utc>) -> MockClock {
        MockClock { time: Arc::new(RwLock::new(time)) }
    }

    pub fn set_current_time(&self, time: DateTime<Utc>) {
        *self.time.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = time;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.time.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += delta;
    }
}

impl SystemClock for MockClock {
    fn get_current_time(&self) -> DateTime<Utc> {
        *self.time.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clone_box(&self) -> SharedClock {
        SharedClock(Arc::new(self.clone()))
    }
}
