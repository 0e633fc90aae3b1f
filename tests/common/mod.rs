//! Common test utilities for vmcharge integration tests
//!
//! Builds exported instance histories in a temporary data directory so the
//! whole pipeline can run through the JSON provider.

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use vmcharge::InstanceBiller;
use vmcharge_pricing::{ChargeCalculator, ChargeTable};
use vmcharge_provider_json::DataLoader;

/// Temporary data directory with exported instance records
pub struct TestDataDir {
    dir: TempDir,
}

impl TestDataDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Write `<id>.json` with the given metadata and `(action, start_time)` feed
    pub fn add_instance(
        &self,
        id: &str,
        created_at: &str,
        flavor: &str,
        vcpus: u32,
        actions: &[(&str, &str)],
    ) -> &Self {
        let record = json!({
            "created_at": created_at,
            "flavor": {"original_name": flavor, "vcpus": vcpus},
            "actions": actions
                .iter()
                .map(|(action, start_time)| json!({"action": action, "start_time": start_time}))
                .collect::<Vec<_>>(),
        });
        self.write_raw(id, &record.to_string())
    }

    /// Write arbitrary file content for `<id>.json`
    pub fn write_raw(&self, id: &str, content: &str) -> &Self {
        std::fs::write(self.dir.path().join(format!("{id}.json")), content)
            .expect("Failed to write instance record");
        self
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::with_dir(self.dir.path())
    }

    /// Biller over this directory with the built-in charge table
    pub fn biller(&self) -> InstanceBiller {
        self.biller_with(ChargeTable::builtin())
    }

    pub fn biller_with(&self, table: ChargeTable) -> InstanceBiller {
        InstanceBiller::new(
            Arc::new(self.loader()),
            ChargeCalculator::new(Arc::new(table)),
        )
    }
}
