//! History provider trait
//!
//! This module defines the `InstanceHistoryProvider` trait that provider
//! crates implement. Fetching is a plain blocking call; timeouts and retries
//! belong to the implementation, never to the billing core.

use crate::error::Result;
use crate::types::{InstanceHistory, InstanceId, InstanceMetadata, RawAction};

/// Source of instance action history and metadata.
pub trait InstanceHistoryProvider: Send + Sync {
    /// All recorded actions for an instance, in any order, including noise events.
    fn action_history(&self, id: &InstanceId) -> Result<Vec<RawAction>>;

    /// Creation time and flavor of an instance.
    fn instance_metadata(&self, id: &InstanceId) -> Result<InstanceMetadata>;

    /// Metadata and actions from one consistent read.
    ///
    /// The default makes two separate calls. Providers that keep both in one
    /// record should override it so a record changing between the calls
    /// cannot mix two versions.
    fn instance_history(&self, id: &InstanceId) -> Result<InstanceHistory> {
        Ok(InstanceHistory {
            metadata: self.instance_metadata(id)?,
            actions: self.action_history(id)?,
        })
    }
}
