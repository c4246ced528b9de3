use chrono::TimeDelta;

use crate::domain::model::id::TaskId;
use crate::domain::tenant::tenant_context::TenantContext;
use crate::error::Result;

const POOL_LOCATION: (f64, f64) = (40.84, -73.94);

const RESOURCE_POOLS: [(&str, i64); 4] = [("Bed", 20), ("Nurse", 15), ("Doctor", 10), ("Ambulance", 5)];

/// Fills a tenant with a small hospital: four resource pools and three tasks
/// relative to the tenant clock's current time.
///
/// # Returns
/// Returns the ids of the created tasks in creation order.
pub fn seed(context: &mut TenantContext) -> Result<Vec<TaskId>> {
    let (latitude, longitude) = POOL_LOCATION;
    for (type_name, units) in RESOURCE_POOLS {
        context.add_resource_type(type_name, units, latitude, longitude)?;
    }

    let now = context.get_clock().get_current_time();

    let emergency = context.create_task("ER", 1, now, now + TimeDelta::hours(3), 40.81, -73.96)?;
    context.set_task_requirement(&emergency, "Bed", 2)?;
    context.set_task_requirement(&emergency, "Doctor", 2)?;
    context.set_task_requirement(&emergency, "Nurse", 2)?;

    let checkup_start = now + TimeDelta::days(2);
    let checkup = context.create_task("checkup", 3, checkup_start, checkup_start + TimeDelta::minutes(30), 40.81, -73.96)?;
    context.set_task_requirement(&checkup, "Nurse", 1)?;
    context.set_task_requirement(&checkup, "Doctor", 1)?;

    let transport = context.create_task("transport", 2, now + TimeDelta::minutes(15), now + TimeDelta::minutes(45), 40.83, -73.91)?;
    context.set_task_requirement(&transport, "Ambulance", 1)?;
    context.set_task_requirement(&transport, "Nurse", 1)?;

    log::info!("Seeded tenant {} with {} resource types and 3 tasks.", context.get_tenant_id(), RESOURCE_POOLS.len());
    Ok(vec![emergency, checkup, transport])
}
