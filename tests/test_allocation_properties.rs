use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use livesched::domain::catalog::resource_type_store::ResourceTypeStore;
use livesched::domain::clock::clock::{SharedClock, SystemClock};
use livesched::domain::clock::clock_mock::MockClock;
use livesched::domain::model::id::TaskId;
use livesched::domain::model::resource_type::{ResourceType, ResourceTypeKey};
use livesched::domain::model::task::Task;
use livesched::domain::scheduler::scheduler::Scheduler;

fn clock() -> MockClock {
    MockClock::new(Utc.with_ymd_and_hms(2031, 6, 1, 8, 0, 0).unwrap())
}

fn task(clock: &MockClock, id: &str, priority: i64, start: DateTime<Utc>, hours: i64, needs: &[(&ResourceTypeKey, i64)]) -> Task {
    let mut task = Task::new(TaskId::new(id), id, priority, start, start + TimeDelta::hours(hours), 40.81, -73.96, clock).unwrap();
    for (key, count) in needs {
        task.set_requirement((*key).clone(), *count).unwrap();
    }
    task
}

fn available(store: &ResourceTypeStore, key: &ResourceTypeKey, at: DateTime<Utc>) -> usize {
    store.get(key).unwrap().count_available_units(at)
}

#[test]
fn test_every_task_is_fully_scheduled_or_holds_nothing() {
    let clock = clock();
    let mut store = ResourceTypeStore::new();
    let bed = store.add(ResourceType::new("Bed", 5, 40.84, -73.94, &clock).unwrap(), &clock);
    let nurse = store.add(ResourceType::new("Nurse", 3, 40.84, -73.94, &clock).unwrap(), &clock);
    let doctor = store.add(ResourceType::new("Doctor", 2, 40.84, -73.94, &clock).unwrap(), &clock);
    let now = clock.get_current_time();

    let tasks = vec![
        task(&clock, "a", 2, now, 2, &[(&bed, 2), (&nurse, 1)]),
        task(&clock, "b", 1, now, 2, &[(&bed, 1), (&doctor, 2)]),
        task(&clock, "c", 3, now, 1, &[(&bed, 1), (&doctor, 1)]),
        task(&clock, "d", 4, now, 1, &[(&nurse, 2), (&bed, 2)]),
        task(&clock, "e", 5, now, 1, &[(&nurse, 1), (&bed, 1)]),
    ];
    let mut scheduler = Scheduler::new(SharedClock::new(clock.clone()));

    let assignment = scheduler.allocate(&tasks, &mut store, 10.0).unwrap();

    let mut held = 0;
    for task in &tasks {
        match assignment.get_resources(task.get_task_id()) {
            Some(resources) => {
                assert_eq!(resources.len() as u64, task.get_total_required_units());
                held += resources.len();
            }
            None => assert!(["c", "e"].contains(&task.get_task_id().as_str()), "task {} unexpectedly unscheduled", task.get_task_id()),
        }
    }
    // a, b and d fit; c needs a third doctor and e a fourth nurse.
    assert_eq!(assignment.len(), 3);
    assert_eq!(held, store.get_total_units() - store.count_available_units(now));
    assert_eq!(available(&store, &bed, now), 0);
    assert_eq!(available(&store, &nurse, now), 0);
    assert_eq!(available(&store, &doctor, now), 0);
}

#[test]
fn test_unschedule_restores_availability() {
    let clock = clock();
    let mut store = ResourceTypeStore::new();
    let bed = store.add(ResourceType::new("Bed", 4, 40.84, -73.94, &clock).unwrap(), &clock);
    let nurse = store.add(ResourceType::new("Nurse", 4, 40.84, -73.94, &clock).unwrap(), &clock);
    let start = clock.get_current_time() + TimeDelta::hours(1);
    let tasks = vec![task(&clock, "x", 1, start, 2, &[(&bed, 3), (&nurse, 2)]), task(&clock, "y", 2, start, 2, &[(&bed, 1)])];
    let mut scheduler = Scheduler::new(SharedClock::new(clock.clone()));

    scheduler.allocate(&tasks, &mut store, 10.0).unwrap();
    assert_eq!(available(&store, &bed, start), 0);

    clock.advance(TimeDelta::minutes(10));
    scheduler.unschedule(tasks[0].get_task_id(), &mut store).unwrap();

    assert_eq!(available(&store, &bed, start), 3);
    assert_eq!(available(&store, &nurse, start), 4);
    assert!(scheduler.is_scheduled(tasks[1].get_task_id()));
}

#[test]
fn test_repeated_passes_change_nothing() {
    let clock = clock();
    let mut store = ResourceTypeStore::new();
    let bed = store.add(ResourceType::new("Bed", 3, 40.84, -73.94, &clock).unwrap(), &clock);
    let now = clock.get_current_time();
    let tasks = vec![task(&clock, "one", 3, now, 1, &[(&bed, 2)]), task(&clock, "two", 1, now, 1, &[(&bed, 2)])];
    let mut scheduler = Scheduler::new(SharedClock::new(clock.clone()));

    let first: Vec<_> = scheduler.allocate(&tasks, &mut store, 10.0).unwrap().iter().map(|(id, s)| (id.clone(), s.resources.clone())).collect();
    let second: Vec<_> = scheduler.allocate(&tasks, &mut store, 10.0).unwrap().iter().map(|(id, s)| (id.clone(), s.resources.clone())).collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].0, TaskId::new("two"));
    assert_eq!(available(&store, &bed, now), 1);
}

#[test]
fn test_distant_pool_of_same_name_is_ignored() {
    let clock = clock();
    let mut store = ResourceTypeStore::new();
    let far_beds = store.add(ResourceType::new("Bed", 5, 51.5, -0.12, &clock).unwrap(), &clock);
    let near_beds = store.add(ResourceType::new("Bed", 1, 40.84, -73.94, &clock).unwrap(), &clock);
    let now = clock.get_current_time();
    let tasks = vec![task(&clock, "far", 1, now, 1, &[(&far_beds, 1)]), task(&clock, "near", 2, now, 1, &[(&near_beds, 1)])];
    let mut scheduler = Scheduler::new(SharedClock::new(clock.clone()));

    let assignment = scheduler.allocate(&tasks, &mut store, 10.0).unwrap();

    assert!(!assignment.contains(&TaskId::new("far")));
    assert!(assignment.contains(&TaskId::new("near")));
    assert_eq!(available(&store, &far_beds, now), 5);
}
