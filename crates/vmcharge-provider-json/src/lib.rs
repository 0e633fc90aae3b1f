//! Exported JSON history provider for vmcharge
//!
//! This crate implements the history provider trait over a directory of
//! per-instance JSON exports, so bills can be computed offline from a
//! snapshot of the compute API.

pub mod data_loader;

pub use data_loader::{DataLoader, InstanceRecord};
