//! Charge tables and charge calculation for vmcharge
//!
//! This crate holds the per-state and per-flavor-family multiplier tables
//! and turns reconstructed state intervals into a total charge.

pub mod charge_calculator;
pub mod charge_table;
pub mod report;

pub use charge_calculator::{ChargeBreakdown, ChargeCalculator, IntervalCharge, breakdown, charge};
pub use charge_table::{ChargeTable, RateOverrides};
pub use report::{FailedInstance, InstanceCharge, Totals};
