//! Output formatting module for vmcharge
//!
//! This module provides formatters for displaying charge data in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```
//! use vmcharge_core::timezone::DisplayZone;
//! use vmcharge_pricing::{ChargeTable, Totals};
//! use vmcharge_terminal::get_formatter;
//!
//! let formatter = get_formatter(false, DisplayZone::utc());
//! println!("{}", formatter.format_rates(&ChargeTable::builtin()));
//!
//! let json_formatter = get_formatter(true, DisplayZone::utc());
//! println!("{}", json_formatter.format_charges(&[], &Totals::default(), &[]));
//! ```

use prettytable::{Table, format, row};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Value, json};
use vmcharge_core::timezone::DisplayZone;
use vmcharge_pricing::{ChargeTable, FailedInstance, InstanceCharge, Totals};

/// Trait for output formatters
///
/// Implementations render charge reports, per-interval breakdowns, and the
/// effective charge table.
pub trait OutputFormatter {
    /// Format per-instance charges with totals and any instances that failed
    fn format_charges(
        &self,
        charges: &[InstanceCharge],
        totals: &Totals,
        failures: &[FailedInstance],
    ) -> String;

    /// Format the interval breakdown of a single instance
    fn format_intervals(&self, charge: &InstanceCharge) -> String;

    /// Format the effective charge table
    fn format_rates(&self, table: &ChargeTable) -> String;
}

/// Table formatter for human-readable output
///
/// Produces ASCII tables; instants are shown in the configured display zone.
pub struct TableFormatter {
    zone: DisplayZone,
}

impl TableFormatter {
    /// Create a new TableFormatter
    pub fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    /// Round half away from zero to two decimal places
    fn two_places(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format a charge with two decimal places
    fn format_charge(amount: Decimal) -> String {
        format!("{:.2}", Self::two_places(amount))
    }

    /// Format a duration in hours with two decimal places
    fn format_hours(hours: Decimal) -> String {
        format!("{:.2}h", Self::two_places(hours))
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }
}

impl OutputFormatter for TableFormatter {
    fn format_charges(
        &self,
        charges: &[InstanceCharge],
        totals: &Totals,
        failures: &[FailedInstance],
    ) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Instance",
            b -> "Flavor",
            b -> "vCPUs",
            b -> "Window Start",
            b -> "Window End",
            b -> "Intervals",
            b -> "Charge"
        ]);

        for charge in charges {
            table.add_row(row![
                charge.instance_id.as_str(),
                charge.flavor,
                r -> charge.vcpus,
                self.zone.format(&charge.start),
                self.zone.format(&charge.end),
                r -> charge.breakdown.items.len(),
                r -> Self::format_charge(charge.total())
            ]);
        }

        let intervals: usize = charges.iter().map(|c| c.breakdown.items.len()).sum();
        table.add_row(row![
            b -> format!("TOTAL ({})", totals.instances),
            "",
            "",
            "",
            "",
            br -> intervals,
            br -> Self::format_charge(totals.total_charge)
        ]);

        let mut output = table.to_string();

        if !failures.is_empty() {
            let mut failed = Self::new_table();
            failed.set_titles(row![b -> "Failed Instance", b -> "Error"]);
            for failure in failures {
                failed.add_row(row![failure.instance_id.as_str(), failure.error]);
            }
            output.push('\n');
            output.push_str(&failed.to_string());
        }

        output
    }

    fn format_intervals(&self, charge: &InstanceCharge) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Start",
            b -> "End",
            b -> "State",
            b -> "Hours",
            b -> "Multiplier",
            b -> "Charge"
        ]);

        for item in &charge.breakdown.items {
            table.add_row(row![
                self.zone.format(&item.interval.start),
                self.zone.format(&item.interval.end),
                item.interval.state,
                r -> Self::format_hours(item.hours),
                r -> item.multiplier.normalize(),
                r -> Self::format_charge(item.charge)
            ]);
        }

        table.add_row(row![
            b -> "TOTAL",
            "",
            "",
            "",
            "",
            br -> Self::format_charge(charge.total())
        ]);

        format!(
            "Instance {} ({}, {} vCPUs, family {})\n{}",
            charge.instance_id,
            charge.flavor,
            charge.vcpus,
            charge.flavor_family,
            table
        )
    }

    fn format_rates(&self, table: &ChargeTable) -> String {
        let mut states = Self::new_table();
        states.set_titles(row![b -> "State", b -> "Multiplier"]);
        for (state, multiplier) in table.states() {
            states.add_row(row![state, r -> multiplier.normalize()]);
        }

        let mut families = Self::new_table();
        families.set_titles(row![b -> "Flavor Family", b -> "Multiplier"]);
        for (family, multiplier) in table.flavor_families() {
            families.add_row(row![family, r -> multiplier.normalize()]);
        }

        format!("{states}\n{families}")
    }
}

/// JSON formatter for machine-readable output
///
/// Decimal amounts are emitted as strings to keep their exact value.
pub struct JsonFormatter;

impl JsonFormatter {
    fn render(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }

    fn charge_json(charge: &InstanceCharge, with_intervals: bool) -> Value {
        let mut value = json!({
            "instance_id": charge.instance_id,
            "flavor": charge.flavor,
            "flavor_family": charge.flavor_family,
            "vcpus": charge.vcpus,
            "start": charge.start.to_rfc3339(),
            "end": charge.end.to_rfc3339(),
            "hours_by_state": charge.hours_by_state(),
            "total_charge": charge.total(),
        });

        if with_intervals {
            value["intervals"] = json!(
                charge
                    .breakdown
                    .items
                    .iter()
                    .map(|item| json!({
                        "start": item.interval.start.to_rfc3339(),
                        "end": item.interval.end.to_rfc3339(),
                        "state": item.interval.state,
                        "hours": item.hours,
                        "multiplier": item.multiplier,
                        "charge": item.charge,
                    }))
                    .collect::<Vec<_>>()
            );
        }

        value
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_charges(
        &self,
        charges: &[InstanceCharge],
        totals: &Totals,
        failures: &[FailedInstance],
    ) -> String {
        let output = json!({
            "charges": charges
                .iter()
                .map(|c| Self::charge_json(c, false))
                .collect::<Vec<_>>(),
            "totals": totals,
            "failures": failures,
        });

        Self::render(&output)
    }

    fn format_intervals(&self, charge: &InstanceCharge) -> String {
        Self::render(&Self::charge_json(charge, true))
    }

    fn format_rates(&self, table: &ChargeTable) -> String {
        Self::render(&json!(table))
    }
}

/// Pick a formatter for the requested output mode
pub fn get_formatter(json: bool, zone: DisplayZone) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new(zone))
    }
}
