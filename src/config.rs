use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::loader::parser::{parse_json_file, write_json_file};
use crate::persistence::file_store::{FileStore, StorageFormat};
use crate::persistence::persistence_trait::Persistence;

pub const DEFAULT_MAX_DISTANCE_KM: f64 = 10.0;

/// Runtime settings, read from a camelCase JSON file such as
/// `{"dataDir": "/var/lib/livesched", "storageFormat": "binary"}`.
/// Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveSchedConfig {
    pub data_dir: PathBuf,
    pub storage_format: StorageFormat,
    pub max_distance_km: f64,
    pub save_on_mutation: bool,
}

impl Default for LiveSchedConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/tmp"),
            storage_format: StorageFormat::Json,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            save_on_mutation: true,
        }
    }
}

impl LiveSchedConfig {
    /// Reads the config at `file_path`. A file that does not exist yields the defaults.
    pub fn load(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        if !file_path.exists() {
            log::info!("No config file at '{}', using defaults.", file_path.display());
            return Ok(Self::default());
        }

        let config: LiveSchedConfig = parse_json_file(file_path)?;
        config.validate()?;
        log::info!("Loaded config from '{}'.", file_path.display());
        Ok(config)
    }

    pub fn save(&self, file_path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        write_json_file(file_path, self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.max_distance_km.is_finite() || self.max_distance_km < 0.0 {
            return Err(Error::ConfigError(format!("maxDistanceKm must be a non-negative number, got {}.", self.max_distance_km)));
        }
        Ok(())
    }

    pub fn create_persistence(&self) -> Arc<dyn Persistence> {
        Arc::new(FileStore::new(self.data_dir.clone(), self.storage_format))
    }
}
