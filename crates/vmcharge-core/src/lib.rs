//! Core types, traits, and algorithms for vmcharge
//!
//! This crate provides the data model, error handling, timestamp parsing,
//! the history provider trait, and the two leaf stages of the billing
//! pipeline: action normalization and interval reconstruction.

pub mod error;
pub mod intervals;
pub mod normalizer;
pub mod provider;
pub mod timestamp;
pub mod timezone;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{HistoryStage, Result, VmchargeError};
pub use intervals::reconstruct;
pub use normalizer::normalize;
pub use provider::InstanceHistoryProvider;
pub use types::{
    Action, ActionKind, Flavor, FlavorFamily, InstanceHistory, InstanceId, InstanceMetadata,
    InstanceState, Interval, RawAction,
};
