use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::collections::HashSet;

use crate::domain::catalog::resource_type_store::ResourceTypeStore;
use crate::domain::clock::clock::{SharedClock, SystemClock};
use crate::domain::clock::clock_mock::MockClock;
use crate::domain::model::id::TaskId;
use crate::domain::model::resource_type::{ResourceType, ResourceTypeKey};
use crate::domain::model::task::Task;
use crate::domain::scheduler::scheduler::Scheduler;
use crate::error::Error;

// --- Helper Functions ---

fn setup() -> (MockClock, Scheduler, ResourceTypeStore) {
    let clock = MockClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap());
    let scheduler = Scheduler::new(SharedClock::new(clock.clone()));
    (clock, scheduler, ResourceTypeStore::new())
}

fn add_type(store: &mut ResourceTypeStore, clock: &MockClock, name: &str, units: i64, latitude: f64, longitude: f64) -> ResourceTypeKey {
    store.add(ResourceType::new(name, units, latitude, longitude, clock).unwrap(), clock)
}

fn make_task(clock: &MockClock, id: &str, priority: i64, start: DateTime<Utc>, end: DateTime<Utc>, needs: &[(&ResourceTypeKey, i64)]) -> Task {
    let mut task = Task::new(TaskId::new(id), id, priority, start, end, 40.81, -73.96, clock).unwrap();
    for (key, count) in needs {
        task.set_requirement((*key).clone(), *count).unwrap();
    }
    task
}

fn now_plus_hours(clock: &MockClock, hours: i64) -> DateTime<Utc> {
    clock.get_current_time() + TimeDelta::hours(hours)
}

// --- Test Cases ---

#[test]
fn test_er_and_checkup_scenario() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 2, 40.84, -73.94);
    let now = clock.get_current_time();
    let end = now_plus_hours(&clock, 3);

    let er = make_task(&clock, "ER", 1, now, end, &[(&bed, 2)]);
    let checkup = make_task(&clock, "Checkup", 3, now, end, &[(&bed, 1)]);
    let tasks = vec![checkup.clone(), er.clone()];

    let assignment = scheduler.allocate(&tasks, &mut store, 10.0).unwrap();

    assert_eq!(assignment.len(), 1);
    let resources = assignment.get_resources(er.get_task_id()).unwrap();
    assert_eq!(resources.len(), 2);
    assert!(resources.iter().all(|r| r.reserved_until == end && r.resource_type == bed));
    assert!(!assignment.contains(checkup.get_task_id()));
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 0);
    for unit in store.get(&bed).unwrap().resources() {
        assert_eq!(unit.get_available_from(), end);
    }

    let released = scheduler.unschedule(er.get_task_id(), &mut store).unwrap();
    assert_eq!(released.resources.len(), 2);
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 2);

    // ER is done and no longer submitted.
    let assignment = scheduler.allocate([&checkup], &mut store, 10.0).unwrap();
    assert!(assignment.contains(checkup.get_task_id()));
    assert!(!assignment.contains(er.get_task_id()));
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 1);
}

#[test]
fn test_priority_wins_regardless_of_input_order() {
    for reversed in [false, true] {
        let (clock, mut scheduler, mut store) = setup();
        let bed = add_type(&mut store, &clock, "Bed", 1, 40.84, -73.94);
        let now = clock.get_current_time();

        let urgent = make_task(&clock, "urgent", 1, now, now_plus_hours(&clock, 2), &[(&bed, 1)]);
        let routine = make_task(&clock, "routine", 5, now, now_plus_hours(&clock, 1), &[(&bed, 1)]);
        let mut tasks = vec![routine.clone(), urgent.clone()];
        if reversed {
            tasks.reverse();
        }

        let assignment = scheduler.allocate(&tasks, &mut store, 10.0).unwrap();

        assert!(assignment.contains(urgent.get_task_id()));
        assert!(!assignment.contains(routine.get_task_id()));
    }
}

#[test]
fn test_equal_priority_keeps_input_order() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 1, 40.84, -73.94);
    let now = clock.get_current_time();

    let first = make_task(&clock, "first", 2, now, now_plus_hours(&clock, 1), &[(&bed, 1)]);
    let second = make_task(&clock, "second", 2, now, now_plus_hours(&clock, 1), &[(&bed, 1)]);

    let assignment = scheduler.allocate([&first, &second], &mut store, 10.0).unwrap();

    assert!(assignment.contains(first.get_task_id()));
    assert!(!assignment.contains(second.get_task_id()));
}

#[test]
fn test_partial_failure_rolls_back_everything() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 3, 40.84, -73.94);
    let doctor = add_type(&mut store, &clock, "Doctor", 1, 40.84, -73.94);
    let now = clock.get_current_time();

    // Beds are processed first and succeed, doctors then fall short.
    let surgery = make_task(&clock, "surgery", 1, now, now_plus_hours(&clock, 2), &[(&bed, 2), (&doctor, 2)]);
    let before: Vec<_> = store.get(&bed).unwrap().resources().map(|r| r.get_available_from()).collect();

    let assignment = scheduler.allocate([&surgery], &mut store, 10.0).unwrap();

    assert!(assignment.is_empty());
    let after: Vec<_> = store.get(&bed).unwrap().resources().map(|r| r.get_available_from()).collect();
    assert_eq!(before, after);
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 3);
    assert_eq!(store.get(&doctor).unwrap().count_available_units(now), 1);
}

#[test]
fn test_failed_task_does_not_starve_later_tasks() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 2, 40.84, -73.94);
    let doctor = add_type(&mut store, &clock, "Doctor", 0, 40.84, -73.94);
    let now = clock.get_current_time();

    let impossible = make_task(&clock, "impossible", 1, now, now_plus_hours(&clock, 2), &[(&bed, 2), (&doctor, 1)]);
    let possible = make_task(&clock, "possible", 4, now, now_plus_hours(&clock, 2), &[(&bed, 2)]);

    let assignment = scheduler.allocate([&impossible, &possible], &mut store, 10.0).unwrap();

    assert!(!assignment.contains(impossible.get_task_id()));
    assert_eq!(assignment.get_resources(possible.get_task_id()).unwrap().len(), 2);
}

#[test]
fn test_reserved_count_matches_requirements() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 5, 40.84, -73.94);
    let nurse = add_type(&mut store, &clock, "Nurse", 5, 40.84, -73.94);
    let now = clock.get_current_time();

    let task = make_task(&clock, "ward", 2, now, now_plus_hours(&clock, 4), &[(&bed, 3), (&nurse, 2)]);
    let assignment = scheduler.allocate([&task], &mut store, 10.0).unwrap();

    let resources = assignment.get_resources(task.get_task_id()).unwrap();
    assert_eq!(resources.len() as u64, task.get_total_required_units());
    // Units are listed in reservation order: beds first, then nurses.
    assert!(resources[..3].iter().all(|r| r.resource_type == bed));
    assert!(resources[3..].iter().all(|r| r.resource_type == nurse));
    let ids: HashSet<_> = resources.iter().map(|r| (r.resource_type.clone(), r.resource_id.clone())).collect();
    assert_eq!(ids.len(), 5);
}

#[test]
fn test_distance_filter_boundary() {
    let (clock, _, _) = setup();
    let now = clock.get_current_time();

    let mut probe_store = ResourceTypeStore::new();
    let bed = add_type(&mut probe_store, &clock, "Bed", 1, 40.84, -73.94);
    let task = make_task(&clock, "t", 1, now, now_plus_hours(&clock, 1), &[(&bed, 1)]);
    let distance = bed.location.distance_to(task.get_location());

    let mut store = probe_store.clone();
    let mut scheduler = Scheduler::new(SharedClock::new(clock.clone()));
    let assignment = scheduler.allocate([&task], &mut store, distance).unwrap();
    assert!(assignment.contains(task.get_task_id()));

    let mut store = probe_store.clone();
    let mut scheduler = Scheduler::new(SharedClock::new(clock.clone()));
    let assignment = scheduler.allocate([&task], &mut store, distance - 1e-9).unwrap();
    assert!(assignment.is_empty());
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 1);
}

#[test]
fn test_far_type_rolls_back_near_type() {
    let (clock, mut scheduler, mut store) = setup();
    let near = add_type(&mut store, &clock, "Bed", 2, 40.84, -73.94);
    let far = add_type(&mut store, &clock, "Ambulance", 2, 34.05, -118.24);
    let now = clock.get_current_time();

    let task = make_task(&clock, "transfer", 1, now, now_plus_hours(&clock, 1), &[(&near, 1), (&far, 1)]);
    let assignment = scheduler.allocate([&task], &mut store, 10.0).unwrap();

    assert!(assignment.is_empty());
    assert_eq!(store.get(&near).unwrap().count_available_units(now), 2);
    assert_eq!(store.get(&far).unwrap().count_available_units(now), 2);
}

#[test]
fn test_reallocation_is_idempotent() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 3, 40.84, -73.94);
    let now = clock.get_current_time();
    let tasks = vec![
        make_task(&clock, "a", 2, now, now_plus_hours(&clock, 1), &[(&bed, 2)]),
        make_task(&clock, "b", 1, now, now_plus_hours(&clock, 1), &[(&bed, 1)]),
        make_task(&clock, "c", 3, now, now_plus_hours(&clock, 1), &[(&bed, 1)]),
    ];

    let first: Vec<_> = scheduler
        .allocate(&tasks, &mut store, 10.0)
        .unwrap()
        .iter()
        .map(|(id, entry)| (id.clone(), entry.resources.clone()))
        .collect();
    let second: Vec<_> = scheduler
        .allocate(&tasks, &mut store, 10.0)
        .unwrap()
        .iter()
        .map(|(id, entry)| (id.clone(), entry.resources.clone()))
        .collect();

    assert_eq!(first, second);
    let order: Vec<&str> = first.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec!["b", "a"]);
}

#[test]
fn test_tasks_without_requirements_are_skipped() {
    let (clock, mut scheduler, mut store) = setup();
    let now = clock.get_current_time();
    let idle = make_task(&clock, "idle", 1, now, now_plus_hours(&clock, 1), &[]);

    let assignment = scheduler.allocate([&idle], &mut store, 10.0).unwrap();

    assert!(assignment.is_empty());
}

#[test]
fn test_unknown_resource_type_is_unsatisfiable() {
    let (clock, mut scheduler, mut store) = setup();
    let mut other_store = ResourceTypeStore::new();
    let ghost = add_type(&mut other_store, &clock, "Ghost", 1, 40.84, -73.94);
    let now = clock.get_current_time();
    let task = make_task(&clock, "t", 1, now, now_plus_hours(&clock, 1), &[(&ghost, 1)]);

    let assignment = scheduler.allocate([&task], &mut store, 10.0).unwrap();

    assert!(assignment.is_empty());
}

#[test]
fn test_later_window_uses_freed_units() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 1, 40.84, -73.94);
    let now = clock.get_current_time();

    let morning = make_task(&clock, "morning", 1, now, now_plus_hours(&clock, 2), &[(&bed, 1)]);
    let afternoon = make_task(&clock, "afternoon", 2, now_plus_hours(&clock, 2), now_plus_hours(&clock, 4), &[(&bed, 1)]);
    let overlapping = make_task(&clock, "overlapping", 3, now_plus_hours(&clock, 1), now_plus_hours(&clock, 3), &[(&bed, 1)]);

    let assignment = scheduler.allocate([&overlapping, &afternoon, &morning], &mut store, 10.0).unwrap();

    assert!(assignment.contains(morning.get_task_id()));
    assert!(assignment.contains(afternoon.get_task_id()));
    assert!(!assignment.contains(overlapping.get_task_id()));
}

#[test]
fn test_expired_task_is_rolled_back_not_surfaced() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 2, 40.84, -73.94);
    let nurse = add_type(&mut store, &clock, "Nurse", 1, 40.84, -73.94);
    let now = clock.get_current_time();
    let task = make_task(&clock, "late", 1, now, now_plus_hours(&clock, 1), &[(&bed, 1), (&nurse, 1)]);

    // The window has passed by the time the pass runs.
    clock.advance(TimeDelta::hours(2));
    let assignment = scheduler.allocate([&task], &mut store, 10.0).unwrap();

    assert!(assignment.is_empty());
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 2);
}

#[test]
fn test_invalid_distance() {
    let (_, mut scheduler, mut store) = setup();

    assert!(matches!(scheduler.allocate(std::iter::empty::<&Task>(), &mut store, -1.0), Err(Error::InvalidDistance(_))));
    assert!(matches!(scheduler.allocate(std::iter::empty::<&Task>(), &mut store, f64::NAN), Err(Error::InvalidDistance(_))));
    assert!(scheduler.allocate(std::iter::empty::<&Task>(), &mut store, 0.0).unwrap().is_empty());
}

#[test]
fn test_zero_distance_matches_colocated_type() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 1, 40.81, -73.96);
    let now = clock.get_current_time();
    let task = make_task(&clock, "t", 1, now, now_plus_hours(&clock, 1), &[(&bed, 1)]);

    assert!(scheduler.allocate([&task], &mut store, 0.0).unwrap().contains(task.get_task_id()));
}

#[test]
fn test_unschedule_unknown_task_is_noop() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 1, 40.84, -73.94);
    let now = clock.get_current_time();
    let task = make_task(&clock, "t", 1, now, now_plus_hours(&clock, 1), &[(&bed, 1)]);
    scheduler.allocate([&task], &mut store, 10.0).unwrap();

    assert!(scheduler.unschedule(&TaskId::new("missing"), &mut store).is_none());
    assert_eq!(scheduler.get_assignment().len(), 1);
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 0);

    assert!(scheduler.unschedule(task.get_task_id(), &mut store).is_some());
    assert!(scheduler.unschedule(task.get_task_id(), &mut store).is_none());
}

#[test]
fn test_unschedule_after_pool_removed() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 1, 40.84, -73.94);
    let now = clock.get_current_time();
    let task = make_task(&clock, "t", 1, now, now_plus_hours(&clock, 1), &[(&bed, 1)]);
    scheduler.allocate([&task], &mut store, 10.0).unwrap();

    store.remove(&bed);

    assert!(scheduler.unschedule(task.get_task_id(), &mut store).is_some());
    assert!(scheduler.get_assignment().is_empty());
}

#[test]
fn test_huge_requirement_stays_unscheduled() {
    let (clock, mut scheduler, mut store) = setup();
    let bed = add_type(&mut store, &clock, "Bed", 2, 40.84, -73.94);
    let now = clock.get_current_time();
    let task = make_task(&clock, "greedy", 1, now, now_plus_hours(&clock, 1), &[(&bed, u32::MAX as i64)]);

    let assignment = scheduler.allocate([&task], &mut store, 10.0).unwrap();

    assert!(!assignment.contains(task.get_task_id()));
    assert_eq!(store.get(&bed).unwrap().count_available_units(now), 2);
}
