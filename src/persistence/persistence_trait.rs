use serde::{Deserialize, Serialize};

use crate::api::model_dto::{ResourceTypeDto, TaskDto};
use crate::api::schedule_dto::ScheduleDto;
use crate::domain::model::id::TenantId;
use crate::error::Result;

/// The three independently stored aggregates of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Tasks,
    ResourceTypes,
    Schedule,
}

impl AggregateKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            AggregateKind::Tasks => "tasks",
            AggregateKind::ResourceTypes => "resource_types",
            AggregateKind::Schedule => "schedule",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Aggregate {
    Tasks(Vec<TaskDto>),
    ResourceTypes(Vec<ResourceTypeDto>),
    Schedule(ScheduleDto),
}

impl Aggregate {
    pub fn kind(&self) -> AggregateKind {
        match self {
            Aggregate::Tasks(_) => AggregateKind::Tasks,
            Aggregate::ResourceTypes(_) => AggregateKind::ResourceTypes,
            Aggregate::Schedule(_) => AggregateKind::Schedule,
        }
    }
}

/// Storage backend for tenant state. Implementations must be safe to share
/// between tenants; each call touches exactly one aggregate of one tenant.
pub trait Persistence: std::fmt::Debug + Send + Sync {
    fn load(&self, tenant_id: &TenantId, kind: AggregateKind) -> Result<Aggregate>;

    fn save(&self, tenant_id: &TenantId, aggregate: &Aggregate) -> Result<()>;

    /// Tenants that have stored state.
    fn list_tenants(&self) -> Result<Vec<TenantId>>;
}
