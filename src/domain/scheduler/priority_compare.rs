use std::cmp::Ordering;

use crate::domain::model::task::Task;

/// Orders tasks by ascending priority value, so priority 1 sorts first.
/// Tasks of equal priority compare equal; pair with a stable sort to keep
/// their input order.
pub struct PriorityCompare;

impl PriorityCompare {
    pub fn compare(task0: &Task, task1: &Task) -> Ordering {
        task0.get_priority().cmp(&task1.get_priority())
    }

    /// Stable sort of task references by priority.
    pub fn sort<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
        let mut ordered: Vec<&Task> = tasks.into_iter().collect();
        ordered.sort_by(|a, b| Self::compare(a, b));
        ordered
    }
}
