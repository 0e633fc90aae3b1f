//! vmcharge - Compute billing charges for cloud instances from their action history
//!
//! This library provides functionality to:
//! - Filter and normalize raw lifecycle action feeds
//! - Reconstruct gap-free state intervals over a billing window
//! - Price intervals with per-state and per-flavor-family multipliers
//! - Bill many instances in parallel from a history provider
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use vmcharge::biller::InstanceBiller;
//! use vmcharge_core::{InstanceId, timestamp::month_window};
//! use vmcharge_pricing::{ChargeCalculator, ChargeTable};
//! use vmcharge_provider_json::DataLoader;
//!
//! fn main() -> vmcharge::Result<()> {
//!     let biller = InstanceBiller::new(
//!         Arc::new(DataLoader::new()?),
//!         ChargeCalculator::new(Arc::new(ChargeTable::builtin())),
//!     );
//!
//!     let (start, end) = month_window("2024-03")?;
//!     let charge = biller.charge_instance(&InstanceId::new("vm-1"), start, end)?;
//!     println!("{}: {}", charge.instance_id, charge.total());
//!     Ok(())
//! }
//! ```

pub mod biller;
pub mod cli;

// Re-export commonly used types
pub use biller::InstanceBiller;
pub use vmcharge_core::{Result, VmchargeError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
