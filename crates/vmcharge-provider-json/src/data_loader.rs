//! JSON history data loader
//!
//! Reads `<instance_id>.json` exports from a data directory. Each file holds
//! the instance metadata and its raw action feed:
//!
//! ```json
//! {
//!   "created_at": "2024-01-01T00:00:00Z",
//!   "flavor": {"original_name": "m3.small", "vcpus": 2},
//!   "actions": [{"action": "create", "start_time": "2024-01-01T00:00:00.000000"}]
//! }
//! ```
//!
//! The directory comes from `VMCHARGE_DATA_DIR` or defaults to
//! `<data dir>/vmcharge/instances`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vmcharge_core::error::{Result, VmchargeError};
use vmcharge_core::provider::InstanceHistoryProvider;
use vmcharge_core::types::{Flavor, InstanceHistory, InstanceId, InstanceMetadata, RawAction};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "VMCHARGE_DATA_DIR";

/// One exported instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub created_at: String,
    pub flavor: Flavor,
    #[serde(default)]
    pub actions: Vec<RawAction>,
}

impl InstanceRecord {
    fn metadata(&self) -> InstanceMetadata {
        InstanceMetadata {
            created_at: self.created_at.clone(),
            flavor: self.flavor.clone(),
        }
    }
}

/// Data loader for exported instance histories.
#[derive(Debug, Clone)]
pub struct DataLoader {
    instances_dir: PathBuf,
}

impl DataLoader {
    /// Discover the data directory from the environment or the platform default
    pub fn new() -> Result<Self> {
        let instances_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .ok_or_else(|| VmchargeError::Config("Cannot determine data directory".into()))?
                .join("vmcharge")
                .join("instances"),
        };

        Ok(Self::with_dir(instances_dir))
    }

    /// Use an explicit data directory
    pub fn with_dir(instances_dir: impl Into<PathBuf>) -> Self {
        let instances_dir = instances_dir.into();
        if !instances_dir.exists() {
            debug!("Instance data directory not found: {}", instances_dir.display());
        }
        Self { instances_dir }
    }

    /// Directory records are read from
    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    /// Ids of every exported instance, sorted
    pub fn list_instances(&self) -> Result<Vec<InstanceId>> {
        if !self.instances_dir.exists() {
            return Err(VmchargeError::Config(format!(
                "Instance data directory not found: {}",
                self.instances_dir.display()
            )));
        }

        let mut ids: Vec<InstanceId> = walkdir::WalkDir::new(&self.instances_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|entry| {
                entry
                    .path()
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(InstanceId::new)
            })
            .collect();

        ids.sort();
        debug!("Found {} exported instances", ids.len());
        Ok(ids)
    }

    /// Read and parse the record for one instance
    pub fn load_record(&self, id: &InstanceId) -> Result<InstanceRecord> {
        let path = self.record_path(id)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VmchargeError::InstanceNotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| VmchargeError::Parse {
            file: path,
            error: e.to_string(),
        })
    }

    fn record_path(&self, id: &InstanceId) -> Result<PathBuf> {
        let name = id.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(VmchargeError::InvalidArgument(format!(
                "Invalid instance id '{name}'"
            )));
        }
        Ok(self.instances_dir.join(format!("{name}.json")))
    }
}

impl InstanceHistoryProvider for DataLoader {
    fn action_history(&self, id: &InstanceId) -> Result<Vec<RawAction>> {
        let record = self.load_record(id)?;
        debug!("Loaded {} raw actions for {}", record.actions.len(), id);
        Ok(record.actions)
    }

    fn instance_metadata(&self, id: &InstanceId) -> Result<InstanceMetadata> {
        self.load_record(id).map(|record| record.metadata())
    }

    fn instance_history(&self, id: &InstanceId) -> Result<InstanceHistory> {
        let record = self.load_record(id)?;
        Ok(InstanceHistory {
            metadata: record.metadata(),
            actions: record.actions,
        })
    }
}
