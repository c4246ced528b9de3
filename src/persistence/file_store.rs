use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::model_dto::{ResourceTypeDto, TaskDto};
use crate::api::schedule_dto::ScheduleDto;
use crate::domain::model::id::TenantId;
use crate::error::{Error, Result};
use crate::persistence::persistence_trait::{Aggregate, AggregateKind, Persistence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    #[default]
    Json,
    Binary,
}

impl StorageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StorageFormat::Json => "json",
            StorageFormat::Binary => "bin",
        }
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            StorageFormat::Json => Ok(serde_json::to_vec_pretty(value)?),
            StorageFormat::Binary => Ok(bincode::serialize(value)?),
        }
    }

    fn decode<T: for<'de> Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            StorageFormat::Json => Ok(serde_json::from_slice(bytes)?),
            StorageFormat::Binary => Ok(bincode::deserialize(bytes)?),
        }
    }
}

impl std::str::FromStr for StorageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(StorageFormat::Json),
            "binary" | "bin" | "bincode" => Ok(StorageFormat::Binary),
            other => Err(Error::ConfigError(format!("Unknown storage format '{}'.", other))),
        }
    }
}

/// Stores each aggregate of a tenant in its own file:
/// `<dir>/<tenant>_tasks.<ext>`, `<dir>/<tenant>_resource_types.<ext>` and
/// `<dir>/<tenant>_schedule.<ext>`.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
    format: StorageFormat,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>, format: StorageFormat) -> Self {
        Self { data_dir: data_dir.into(), format }
    }

    pub fn get_data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, tenant_id: &TenantId, kind: AggregateKind) -> Result<PathBuf> {
        let name = tenant_id.as_str();
        if name.trim().is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(Error::InvalidIdentifier(format!("Tenant id '{}' cannot be used as a file name.", name)));
        }
        Ok(self.data_dir.join(format!("{}_{}.{}", name, kind.file_stem(), self.format.extension())))
    }
}

impl Persistence for FileStore {
    fn load(&self, tenant_id: &TenantId, kind: AggregateKind) -> Result<Aggregate> {
        let path = self.path_for(tenant_id, kind)?;
        let bytes = fs::read(&path)?;

        let aggregate = match kind {
            AggregateKind::Tasks => Aggregate::Tasks(self.format.decode::<Vec<TaskDto>>(&bytes)?),
            AggregateKind::ResourceTypes => Aggregate::ResourceTypes(self.format.decode::<Vec<ResourceTypeDto>>(&bytes)?),
            AggregateKind::Schedule => Aggregate::Schedule(self.format.decode::<ScheduleDto>(&bytes)?),
        };
        log::debug!("Loaded {} of tenant {} from '{}'.", kind.file_stem(), tenant_id, path.display());
        Ok(aggregate)
    }

    fn save(&self, tenant_id: &TenantId, aggregate: &Aggregate) -> Result<()> {
        let path = self.path_for(tenant_id, aggregate.kind())?;
        let bytes = match aggregate {
            Aggregate::Tasks(tasks) => self.format.encode(tasks)?,
            Aggregate::ResourceTypes(resource_types) => self.format.encode(resource_types)?,
            Aggregate::Schedule(schedule) => self.format.encode(schedule)?,
        };

        fs::create_dir_all(&self.data_dir)?;
        // Write next to the target and rename, so a crash never leaves a torn file.
        let tmp_path = path.with_extension(format!("{}.tmp", self.format.extension()));
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &path)?;

        log::debug!("Saved {} of tenant {} to '{}'.", aggregate.kind().file_stem(), tenant_id, path.display());
        Ok(())
    }

    fn list_tenants(&self) -> Result<Vec<TenantId>> {
        let suffix = format!("_{}.{}", AggregateKind::Tasks.file_stem(), self.format.extension());
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut tenants = Vec::new();
        for entry in entries {
            let file_name = entry?.file_name();
            if let Some(tenant) = file_name.to_str().and_then(|name| name.strip_suffix(&suffix))
                && !tenant.is_empty()
            {
                tenants.push(TenantId::new(tenant));
            }
        }
        tenants.sort();
        Ok(tenants)
    }
}
