use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use livesched::api::model_dto::{ResourceTypeDto, TaskDto};
use livesched::api::schedule_dto::ScheduleDto;
use livesched::config::LiveSchedConfig;
use livesched::domain::model::id::{TaskId, TenantId};
use livesched::domain::model::resource_type::ResourceType;
use livesched::domain::tenant::tenant_registry::TenantRegistry;
use livesched::error::Error;
use livesched::persistence::file_store::StorageFormat;
use livesched::{demo, logger, open_registry};

#[derive(Debug, Parser)]
#[command(name = "livesched", version, about = "Assigns located resource pools to prioritized, time-bound tasks.")]
struct Cli {
    /// JSON config file. Missing file means defaults.
    #[arg(long, global = true, default_value = "livesched.json")]
    config: PathBuf,

    /// Overrides `dataDir` from the config.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Overrides `storageFormat` from the config (json or binary).
    #[arg(long, global = true)]
    format: Option<StorageFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Writes the effective config to the config path.
    InitConfig,
    /// Seeds an empty tenant with demo pools and tasks.
    Setup {
        #[arg(long)]
        tenant: String,
    },
    /// Prints the tenant's tasks.
    Tasks {
        #[arg(long)]
        tenant: String,
    },
    /// Creates a task without requirements and prints its id.
    AddTask {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        name: String,
        /// 1 is the most urgent, 5 the least.
        #[arg(long)]
        priority: i64,
        /// RFC 3339 timestamp, e.g. 2030-01-01T12:00:00Z.
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Prints one task.
    GetTask {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        task_id: String,
    },
    /// Unschedules a task and removes it from the catalog.
    DeleteTask {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        task_id: String,
    },
    /// Prints the tenant's resource pools.
    ResourceTypes {
        #[arg(long)]
        tenant: String,
    },
    /// Adds a resource pool, or grows the pool with the same name and location.
    AddResourceType {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        type_name: String,
        #[arg(long, allow_negative_numbers = true)]
        units: i64,
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Removes a resource pool that no task needs.
    DeleteResourceType {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        type_name: String,
    },
    /// Moves a resource pool to a new location.
    RelocateResourceType {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        type_name: String,
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Runs an allocation pass and prints the resulting schedule.
    Schedule {
        #[arg(long)]
        tenant: String,
        /// Kilometers; defaults to `maxDistanceKm` from the config.
        #[arg(long)]
        max_distance: Option<f64>,
    },
    /// Removes a task from the schedule and frees its units.
    Unschedule {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        task_id: String,
    },
    /// Sets how many units of a resource type a task needs. Zero removes the requirement.
    Require {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        task_id: String,
        #[arg(long)]
        type_name: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },
}

fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();

    let mut config = LiveSchedConfig::load(&cli.config).with_context(|| format!("Could not read config '{}'", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(format) = cli.format {
        config.storage_format = format;
    }

    if let Command::InitConfig = cli.command {
        config.save(&cli.config).with_context(|| format!("Could not write config '{}'", cli.config.display()))?;
        println!("Wrote {}", cli.config.display());
        return Ok(());
    }

    let registry = open_registry(&config).context("Could not open tenant storage")?;
    let output = run(cli.command, &registry, &config)?;
    println!("{}", output);

    if !config.save_on_mutation {
        registry.save_all().context("Could not save tenants")?;
    }
    Ok(())
}

/// Executes one tenant command and returns what should be printed.
fn run(command: Command, registry: &TenantRegistry, config: &LiveSchedConfig) -> Result<String> {
    let output = match command {
        Command::InitConfig => String::new(),
        Command::Setup { tenant } => {
            let tenant_id = TenantId::parse(tenant)?;
            let task_ids = registry.with_tenant(&tenant_id, |context| {
                if !context.catalog.tasks().is_empty() || !context.catalog.resource_types.is_empty() {
                    return Ok(None);
                }
                demo::seed(context).map(Some)
            })?;
            let Some(task_ids) = task_ids else {
                bail!("Tenant '{}' already has data, refusing to seed it again.", tenant_id);
            };
            task_ids.iter().map(TaskId::to_string).collect::<Vec<_>>().join("\n")
        }
        Command::Tasks { tenant } => {
            let tenant_id = TenantId::parse(tenant)?;
            let tasks: Vec<TaskDto> = registry.read_tenant(&tenant_id, |context| context.catalog.tasks().iter().map(TaskDto::from).collect());
            serde_json::to_string_pretty(&tasks)?
        }
        Command::AddTask { tenant, name, priority, start, end, latitude, longitude } => {
            let tenant_id = TenantId::parse(tenant)?;
            let task_id = registry.with_tenant(&tenant_id, |context| context.create_task(&name, priority, start, end, latitude, longitude))?;
            task_id.to_string()
        }
        Command::GetTask { tenant, task_id } => {
            let tenant_id = TenantId::parse(tenant)?;
            let task_id = TaskId::parse(task_id)?;
            let task = registry
                .read_tenant(&tenant_id, |context| context.get_task(&task_id).map(TaskDto::from))
                .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
            serde_json::to_string_pretty(&task)?
        }
        Command::DeleteTask { tenant, task_id } => {
            let tenant_id = TenantId::parse(tenant)?;
            let task_id = TaskId::parse(task_id)?;
            let task = registry.with_tenant(&tenant_id, |context| context.delete_task(&task_id))?;
            format!("Deleted task {} ({})", task_id, task.get_task_name())
        }
        Command::ResourceTypes { tenant } => {
            let tenant_id = TenantId::parse(tenant)?;
            let resource_types: Vec<ResourceTypeDto> =
                registry.read_tenant(&tenant_id, |context| context.catalog.resource_types.iter().map(ResourceTypeDto::from).collect());
            serde_json::to_string_pretty(&resource_types)?
        }
        Command::AddResourceType { tenant, type_name, units, latitude, longitude } => {
            let tenant_id = TenantId::parse(tenant)?;
            let (key, total) = registry.with_tenant(&tenant_id, |context| {
                let key = context.add_resource_type(&type_name, units, latitude, longitude)?;
                let total = context.catalog.resource_types.get(&key).map_or(0, ResourceType::get_total_units);
                Ok((key, total))
            })?;
            format!("Resource type {} has {} units", key, total)
        }
        Command::DeleteResourceType { tenant, type_name } => {
            let tenant_id = TenantId::parse(tenant)?;
            let removed = registry.with_tenant(&tenant_id, |context| context.delete_resource_type(&type_name))?;
            format!("Deleted resource type {}", removed.get_key())
        }
        Command::RelocateResourceType { tenant, type_name, latitude, longitude } => {
            let tenant_id = TenantId::parse(tenant)?;
            let new_key = registry.with_tenant(&tenant_id, |context| {
                let key = context
                    .catalog
                    .resource_types
                    .find_by_name(&type_name)
                    .map(ResourceType::get_key)
                    .ok_or_else(|| Error::ResourceTypeNotFound(type_name.clone()))?;
                context.relocate_resource_type(&key, latitude, longitude)
            })?;
            format!("Moved resource type to {}", new_key)
        }
        Command::Schedule { tenant, max_distance } => {
            let tenant_id = TenantId::parse(tenant)?;
            let max_distance = max_distance.unwrap_or(config.max_distance_km);
            let schedule = registry.with_tenant(&tenant_id, |context| context.schedule(max_distance).map(ScheduleDto::from))?;
            serde_json::to_string_pretty(&schedule)?
        }
        Command::Unschedule { tenant, task_id } => {
            let tenant_id = TenantId::parse(tenant)?;
            let task_id = TaskId::parse(task_id)?;
            match registry.with_tenant(&tenant_id, |context| Ok(context.unschedule(&task_id)))? {
                Some(scheduled) => format!("Released {} units held by {}", scheduled.resources.len(), task_id),
                None => format!("Task {} was not scheduled", task_id),
            }
        }
        Command::Require { tenant, task_id, type_name, quantity } => {
            let tenant_id = TenantId::parse(tenant)?;
            let task_id = TaskId::parse(task_id)?;
            let key = registry.with_tenant(&tenant_id, |context| context.set_task_requirement(&task_id, &type_name, quantity))?;
            format!("Task {} now requires {} x {}", task_id, quantity.max(0), key)
        }
    };
    Ok(output)
}
