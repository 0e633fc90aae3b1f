//! Charge report data types
//!
//! Pure data structures describing a billed instance and run totals,
//! shared by the orchestration layer and the output formatters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use vmcharge_core::error::{Result, VmchargeError};
use vmcharge_core::types::{FlavorFamily, InstanceId, InstanceState};

use crate::charge_calculator::ChargeBreakdown;

/// Charge for one instance over one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceCharge {
    /// Billed instance
    pub instance_id: InstanceId,
    /// Flavor name as reported by the provider
    pub flavor: String,
    /// Family derived from the flavor name
    pub flavor_family: FlavorFamily,
    /// Virtual CPU count of the flavor
    pub vcpus: u32,
    /// Window start (inclusive)
    pub start: DateTime<Utc>,
    /// Window end (exclusive)
    pub end: DateTime<Utc>,
    /// Per-interval charges
    pub breakdown: ChargeBreakdown,
}

impl InstanceCharge {
    /// Total charge for the window
    pub fn total(&self) -> Decimal {
        self.breakdown.total
    }

    /// Hours spent in each state during the window
    pub fn hours_by_state(&self) -> BTreeMap<InstanceState, Decimal> {
        let mut hours = BTreeMap::new();
        for item in &self.breakdown.items {
            *hours.entry(item.interval.state).or_insert(Decimal::ZERO) += item.hours;
        }
        hours
    }
}

/// Instance that could not be billed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedInstance {
    pub instance_id: InstanceId,
    pub error: String,
}

/// Totals across billed instances
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub instances: usize,
    pub total_charge: Decimal,
}

impl Totals {
    /// Sum of the billed instances
    ///
    /// # Errors
    ///
    /// `ChargeOverflow` if the sum leaves the decimal range.
    pub fn from_charges(charges: &[InstanceCharge]) -> Result<Self> {
        let total_charge = charges
            .iter()
            .try_fold(Decimal::ZERO, |acc, charge| acc.checked_add(charge.total()))
            .ok_or_else(|| {
                VmchargeError::ChargeOverflow(format!("total over {} instances", charges.len()))
            })?;
        Ok(Self {
            instances: charges.len(),
            total_charge,
        })
    }
}
