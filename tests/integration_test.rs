//! End-to-end tests through the JSON history provider

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::TestDataDir;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use vmcharge_core::timestamp::month_window;
use vmcharge_core::timezone::DisplayZone;
use vmcharge_core::{FlavorFamily, InstanceId, InstanceState, Interval, VmchargeError};
use vmcharge_pricing::{ChargeTable, Totals};
use vmcharge_terminal::get_formatter;

fn march(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

fn states(intervals: &[Interval]) -> Vec<(DateTime<Utc>, DateTime<Utc>, InstanceState)> {
    intervals.iter().map(|i| (i.start, i.end, i.state)).collect()
}

#[test]
fn test_window_before_creation() {
    let data = TestDataDir::new();
    data.add_instance(
        "vm-late",
        "2024-03-10T00:00:00Z",
        "m3.small",
        2,
        &[("create", "2024-03-10T00:00:00.000000")],
    );
    let biller = data.biller();
    let id = InstanceId::new("vm-late");

    let intervals = biller.intervals(&id, march(1, 0), march(5, 0)).unwrap();
    assert_eq!(
        states(&intervals),
        vec![(march(1, 0), march(5, 0), InstanceState::Deleted)]
    );

    let charge = biller.charge_instance(&id, march(1, 0), march(5, 0)).unwrap();
    assert_eq!(charge.total(), Decimal::ZERO);
}

#[test]
fn test_window_spanning_one_action() {
    let data = TestDataDir::new();
    data.add_instance(
        "vm-1",
        "2024-03-01T00:00:00Z",
        "m3.small",
        1,
        &[
            ("create", "2024-03-01T00:00:00.000000"),
            ("stop", "2024-03-01T05:00:00.000000"),
        ],
    );
    let biller = data.biller();
    let id = InstanceId::new("vm-1");

    let intervals = biller.intervals(&id, march(1, 2), march(1, 8)).unwrap();
    assert_eq!(
        states(&intervals),
        vec![
            (march(1, 2), march(1, 5), InstanceState::Active),
            (march(1, 5), march(1, 8), InstanceState::Stopped),
        ]
    );

    // 3h active + 3h stopped at 0.5
    let charge = biller.charge_instance(&id, march(1, 2), march(1, 8)).unwrap();
    assert_eq!(charge.total(), dec!(4.5));
}

#[test]
fn test_missing_create_is_synthesized() {
    let data = TestDataDir::new();
    data.add_instance(
        "vm-old",
        "2024-03-01T00:00:00Z",
        "m3.small",
        1,
        &[
            ("reboot", "2024-03-01T01:00:00.000000"),
            ("stop", "2024-03-02T00:00:00.000000"),
        ],
    );

    let intervals = data
        .biller()
        .intervals(&InstanceId::new("vm-old"), march(1, 0), march(3, 0))
        .unwrap();
    assert_eq!(
        states(&intervals),
        vec![
            (march(1, 0), march(1, 0), InstanceState::Deleted),
            (march(1, 0), march(2, 0), InstanceState::Active),
            (march(2, 0), march(3, 0), InstanceState::Stopped),
        ]
    );
}

#[test]
fn test_irrelevant_actions_do_not_split_intervals() {
    let data = TestDataDir::new();
    data.add_instance(
        "vm-noisy",
        "2024-03-01T00:00:00Z",
        "g3.large",
        2,
        &[
            ("create", "2024-03-01T00:00:00.000000"),
            ("attach_volume", "2024-03-01T03:00:00.000000"),
            ("live_migration", "2024-03-01T04:00:00.000000"),
            ("reboot", "not even a timestamp"),
        ],
    );

    let intervals = data
        .biller()
        .intervals(&InstanceId::new("vm-noisy"), march(1, 1), march(1, 6))
        .unwrap();
    assert_eq!(
        states(&intervals),
        vec![(march(1, 1), march(1, 6), InstanceState::Active)]
    );
}

#[test]
fn test_charge_arithmetic_with_custom_table() {
    let data = TestDataDir::new();
    data.add_instance(
        "vm-x",
        "2024-03-01T00:00:00Z",
        "x2.medium",
        4,
        &[
            ("create", "2024-03-01T00:00:00.000000"),
            ("delete", "2024-03-01T02:00:00.000000"),
        ],
    );
    let table = ChargeTable::from_parts(
        InstanceState::ALL
            .into_iter()
            .map(|s| (s, if s == InstanceState::Active { dec!(1) } else { dec!(0) }))
            .collect(),
        BTreeMap::from([(FlavorFamily::new("x2"), dec!(2))]),
    )
    .unwrap();

    let charge = data
        .biller_with(table)
        .charge_instance(&InstanceId::new("vm-x"), march(1, 0), march(2, 0))
        .unwrap();
    // 2h * 1 * 4 vCPUs * 2
    assert_eq!(charge.total(), dec!(16));
    assert_eq!(charge.flavor_family, FlavorFamily::new("x2"));
}

#[test]
fn test_inverted_range() {
    let data = TestDataDir::new();
    data.add_instance(
        "vm-1",
        "2024-03-01T00:00:00Z",
        "m3.small",
        1,
        &[("create", "2024-03-01T00:00:00.000000")],
    );

    let result = data
        .biller()
        .charge_instance(&InstanceId::new("vm-1"), march(2, 0), march(1, 0));
    assert!(matches!(result, Err(VmchargeError::InvalidRange { .. })));
}

#[test]
fn test_empty_history_without_creation_time() {
    let data = TestDataDir::new();
    data.add_instance("vm-ghost", "", "m3.small", 1, &[("reboot", "2024-03-01T00:00:00")]);

    let result = data
        .biller()
        .charge_instance(&InstanceId::new("vm-ghost"), march(1, 0), march(2, 0));
    assert!(matches!(result, Err(VmchargeError::EmptyHistory(_))));
}

#[test]
fn test_bill_all_instances_for_a_month() {
    let data = TestDataDir::new();
    data.add_instance(
        "vm-a",
        "2024-02-20T00:00:00Z",
        "m3.small",
        1,
        &[
            ("create", "2024-02-20T00:00:00.000000"),
            ("delete", "2024-03-02T00:00:00.000000"),
        ],
    )
    .add_instance(
        "vm-b",
        "2024-03-31T00:00:00Z",
        "r3.xlarge",
        4,
        &[("create", "2024-03-31T00:00:00.000000")],
    )
    .write_raw("vm-broken", "{\"created_at\": ");

    let ids = data.loader().list_instances().unwrap();
    assert_eq!(ids.len(), 3);

    let (start, end) = month_window("2024-03").unwrap();
    let (charges, failures) = data.biller().charge_many(&ids, start, end);

    let billed: Vec<_> = charges.iter().map(|c| c.instance_id.as_str()).collect();
    assert_eq!(billed, vec!["vm-a", "vm-b"]);
    // vm-a: 24h active in March on 1 vCPU
    assert_eq!(charges[0].total(), dec!(24));
    // vm-b: 24h active on 4 vCPUs of family r3 (x2)
    assert_eq!(charges[1].total(), dec!(192));

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].instance_id.as_str(), "vm-broken");

    let totals = Totals::from_charges(&charges).unwrap();
    assert_eq!(totals.total_charge, dec!(216));

    let output =
        get_formatter(true, DisplayZone::utc()).format_charges(&charges, &totals, &failures);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let total: Decimal = value["totals"]["total_charge"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(216));
    assert_eq!(value["failures"][0]["instance_id"], "vm-broken");
}

#[test]
fn test_unknown_instance() {
    let data = TestDataDir::new();
    let result = data
        .biller()
        .charge_instance(&InstanceId::new("nope"), march(1, 0), march(2, 0));
    assert!(matches!(result, Err(VmchargeError::InstanceNotFound(_))));
}
