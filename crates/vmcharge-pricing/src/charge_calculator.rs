//! Charge calculator
//!
//! Reduces a window's state intervals to a monetary charge:
//!
//! ```text
//! charge = sum(hours(interval) * state_multiplier * vcpus * flavor_family_multiplier)
//! ```
//!
//! All arithmetic is decimal; durations are never truncated to whole hours.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//! use vmcharge_core::types::{FlavorFamily, InstanceState, Interval};
//! use vmcharge_pricing::{ChargeCalculator, ChargeTable};
//!
//! let calculator = ChargeCalculator::new(Arc::new(ChargeTable::builtin()));
//! let intervals = [Interval::new(
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap(),
//!     InstanceState::Stopped,
//! )];
//!
//! // 3h * 0.5 (stopped) * 2 vCPUs * 2 (g3)
//! let total = calculator.charge(&intervals, 2, &FlavorFamily::new("g3")).unwrap();
//! assert_eq!(total, dec!(6));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use vmcharge_core::error::{Result, VmchargeError};
use vmcharge_core::types::{FlavorFamily, Interval};

use crate::charge_table::ChargeTable;

const SECONDS_PER_HOUR: Decimal = dec!(3600);
const NANOS_SCALE: u32 = 9;

/// Charge attributed to a single interval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalCharge {
    /// The interval being charged
    pub interval: Interval,
    /// Interval length in hours
    pub hours: Decimal,
    /// Combined state, vCPU and flavor family multiplier
    pub multiplier: Decimal,
    /// `hours * multiplier`
    pub charge: Decimal,
}

/// Per-interval charges and their total
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChargeBreakdown {
    pub items: Vec<IntervalCharge>,
    pub total: Decimal,
}

/// Calculates charges from state intervals
///
/// Holds the process-wide charge table; cheap to clone and safe to share
/// between threads.
#[derive(Debug, Clone)]
pub struct ChargeCalculator {
    table: Arc<ChargeTable>,
}

impl ChargeCalculator {
    /// Create a new ChargeCalculator over a charge table
    pub fn new(table: Arc<ChargeTable>) -> Self {
        Self { table }
    }

    /// The charge table in use
    pub fn table(&self) -> &ChargeTable {
        &self.table
    }

    /// Total charge for a sequence of intervals
    ///
    /// # Errors
    ///
    /// See [`charge`].
    pub fn charge(
        &self,
        intervals: &[Interval],
        vcpu_count: u32,
        flavor_family: &FlavorFamily,
    ) -> Result<Decimal> {
        charge(intervals, vcpu_count, flavor_family, &self.table)
    }

    /// Per-interval charges for a sequence of intervals
    pub fn breakdown(
        &self,
        intervals: &[Interval],
        vcpu_count: u32,
        flavor_family: &FlavorFamily,
    ) -> Result<ChargeBreakdown> {
        breakdown(intervals, vcpu_count, flavor_family, &self.table)
    }
}

/// Length of an interval in hours, including sub-second precision
pub fn interval_hours(interval: &Interval) -> Decimal {
    let duration = interval.duration();
    let seconds = Decimal::from(duration.num_seconds())
        + Decimal::new(i64::from(duration.subsec_nanos()), NANOS_SCALE);
    (seconds / SECONDS_PER_HOUR).normalize()
}

fn overflow(what: impl std::fmt::Display) -> VmchargeError {
    VmchargeError::ChargeOverflow(what.to_string())
}

/// Total charge for a sequence of intervals
///
/// # Errors
///
/// - `InvalidArgument` if `vcpu_count` is zero
/// - `UnknownFlavorFamily` if the table has no entry for `flavor_family`
/// - `UnknownState` if the table has no entry for an interval's state
/// - `ChargeOverflow` if a multiplier, contribution or the total leaves the
///   decimal range
pub fn charge(
    intervals: &[Interval],
    vcpu_count: u32,
    flavor_family: &FlavorFamily,
    table: &ChargeTable,
) -> Result<Decimal> {
    breakdown(intervals, vcpu_count, flavor_family, table).map(|b| b.total)
}

/// Per-interval charges for a sequence of intervals
///
/// # Errors
///
/// Same as [`charge`].
pub fn breakdown(
    intervals: &[Interval],
    vcpu_count: u32,
    flavor_family: &FlavorFamily,
    table: &ChargeTable,
) -> Result<ChargeBreakdown> {
    if vcpu_count == 0 {
        return Err(VmchargeError::InvalidArgument(
            "vCPU count must be positive".to_string(),
        ));
    }

    let family_multiplier = table.flavor_family_multiplier(flavor_family)?;
    let instance_multiplier = Decimal::from(vcpu_count)
        .checked_mul(family_multiplier)
        .ok_or_else(|| overflow(format!("{vcpu_count} vCPUs of family {flavor_family}")))?;

    let items = intervals
        .iter()
        .map(|interval| -> Result<IntervalCharge> {
            let hours = interval_hours(interval);
            let multiplier = table
                .state_multiplier(interval.state)?
                .checked_mul(instance_multiplier)
                .ok_or_else(|| overflow(format!("multiplier for state {}", interval.state)))?;
            let charge = hours
                .checked_mul(multiplier)
                .ok_or_else(|| overflow(format!("{hours}h at multiplier {multiplier}")))?;
            Ok(IntervalCharge {
                interval: *interval,
                hours,
                multiplier,
                charge,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let total = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.charge))
        .ok_or_else(|| overflow(format!("total over {} intervals", items.len())))?;

    debug!(
        "Calculated charge {} over {} intervals ({} vCPUs, family {})",
        total,
        items.len(),
        vcpu_count,
        flavor_family
    );

    Ok(ChargeBreakdown { items, total })
}
