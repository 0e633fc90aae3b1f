//! Instance billing orchestration
//!
//! Wires a history provider through the three pipeline stages:
//! normalize the raw feed, reconstruct state intervals for the window,
//! then price them with the shared charge table.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};
use vmcharge_core::{
    InstanceHistory, InstanceHistoryProvider, InstanceId, Interval, Result, normalize, reconstruct,
};
use vmcharge_pricing::{ChargeCalculator, FailedInstance, InstanceCharge};

/// Bills instances using a history provider and a charge calculator
#[derive(Clone)]
pub struct InstanceBiller {
    provider: Arc<dyn InstanceHistoryProvider>,
    calculator: ChargeCalculator,
}

impl InstanceBiller {
    pub fn new(provider: Arc<dyn InstanceHistoryProvider>, calculator: ChargeCalculator) -> Self {
        Self {
            provider,
            calculator,
        }
    }

    /// State intervals of one instance over `[start, end)`
    pub fn intervals(
        &self,
        id: &InstanceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Interval>> {
        let history = self.provider.instance_history(id)?;
        Self::intervals_for(id, &history, start, end)
    }

    fn intervals_for(
        id: &InstanceId,
        history: &InstanceHistory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Interval>> {
        let actions = normalize(&history.actions, &history.metadata.created_at)?;
        debug!(
            "{}: {} of {} raw actions are relevant",
            id,
            actions.len(),
            history.actions.len()
        );
        reconstruct(&actions, start, end)
    }

    /// Charge for one instance over `[start, end)`
    ///
    /// Metadata and actions come from a single provider read.
    ///
    /// # Errors
    ///
    /// Propagates provider, normalization, reconstruction and pricing
    /// errors unchanged.
    pub fn charge_instance(
        &self,
        id: &InstanceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<InstanceCharge> {
        let history = self.provider.instance_history(id)?;
        let family = history.metadata.flavor.family()?;
        let intervals = Self::intervals_for(id, &history, start, end)?;
        let vcpus = history.metadata.flavor.vcpus;
        let breakdown = self.calculator.breakdown(&intervals, vcpus, &family)?;

        Ok(InstanceCharge {
            instance_id: id.clone(),
            flavor: history.metadata.flavor.original_name,
            flavor_family: family,
            vcpus,
            start,
            end,
            breakdown,
        })
    }

    /// Bill several instances in parallel
    ///
    /// Results keep the order of `ids`. A failing instance is reported in the
    /// second list and does not affect the others.
    pub fn charge_many(
        &self,
        ids: &[InstanceId],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (Vec<InstanceCharge>, Vec<FailedInstance>) {
        let results: Vec<_> = ids
            .par_iter()
            .map(|id| (id, self.charge_instance(id, start, end)))
            .collect();

        let mut charges = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (id, result) in results {
            match result {
                Ok(charge) => charges.push(charge),
                Err(e) => {
                    warn!("Failed to bill {}: {}", id, e);
                    failures.push(FailedInstance {
                        instance_id: id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        debug!(
            "Billed {} instances, {} failed",
            charges.len(),
            failures.len()
        );
        (charges, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vmcharge_core::{Flavor, InstanceMetadata, RawAction, VmchargeError};
    use vmcharge_pricing::ChargeTable;

    #[derive(Default)]
    struct MockProvider {
        records: HashMap<InstanceId, (InstanceMetadata, Vec<RawAction>)>,
        reads: AtomicUsize,
    }

    impl MockProvider {
        fn with(mut self, id: &str, flavor: &str, vcpus: u32, actions: &[(&str, &str)]) -> Self {
            let metadata = InstanceMetadata {
                created_at: "2024-01-01T00:00:00Z".to_string(),
                flavor: Flavor {
                    original_name: flavor.to_string(),
                    vcpus,
                },
            };
            let actions = actions
                .iter()
                .map(|(action, ts)| RawAction::new(*action, *ts))
                .collect();
            self.records.insert(InstanceId::new(id), (metadata, actions));
            self
        }

        fn lookup(&self, id: &InstanceId) -> Result<&(InstanceMetadata, Vec<RawAction>)> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.records
                .get(id)
                .ok_or_else(|| VmchargeError::InstanceNotFound(id.clone()))
        }
    }

    impl InstanceHistoryProvider for MockProvider {
        fn action_history(&self, id: &InstanceId) -> Result<Vec<RawAction>> {
            self.lookup(id).map(|(_, actions)| actions.clone())
        }

        fn instance_metadata(&self, id: &InstanceId) -> Result<InstanceMetadata> {
            self.lookup(id).map(|(metadata, _)| metadata.clone())
        }

        fn instance_history(&self, id: &InstanceId) -> Result<InstanceHistory> {
            self.lookup(id).map(|(metadata, actions)| InstanceHistory {
                metadata: metadata.clone(),
                actions: actions.clone(),
            })
        }
    }

    fn biller(provider: MockProvider) -> InstanceBiller {
        InstanceBiller::new(
            Arc::new(provider),
            ChargeCalculator::new(Arc::new(ChargeTable::builtin())),
        )
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_charge_instance() {
        let provider = MockProvider::default().with(
            "vm-1",
            "g3.large",
            2,
            &[
                ("create", "2024-01-01T00:00:00.000000"),
                ("stop", "2024-01-02T00:00:00.000000"),
            ],
        );
        let charge = biller(provider)
            .charge_instance(&InstanceId::new("vm-1"), day(1), day(3))
            .unwrap();

        assert_eq!(charge.flavor_family.as_str(), "g3");
        assert_eq!(charge.breakdown.items.len(), 3);
        // 24h active + 24h stopped at 0.5, times 2 vCPUs and family 2
        assert_eq!(charge.total(), dec!(144));
    }

    #[test]
    fn test_charge_instance_reads_provider_once() {
        let provider = Arc::new(MockProvider::default().with(
            "vm-1",
            "m3.small",
            1,
            &[("create", "2024-01-01T00:00:00")],
        ));
        let biller = InstanceBiller::new(
            provider.clone(),
            ChargeCalculator::new(Arc::new(ChargeTable::builtin())),
        );

        biller
            .charge_instance(&InstanceId::new("vm-1"), day(1), day(2))
            .unwrap();
        assert_eq!(provider.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_create_uses_metadata() {
        let provider = MockProvider::default().with(
            "vm-1",
            "m3.small",
            1,
            &[("stop", "2024-01-02T00:00:00.000000")],
        );
        let intervals = biller(provider)
            .intervals(&InstanceId::new("vm-1"), day(1), day(3))
            .unwrap();

        let states: Vec<_> = intervals.iter().map(|i| i.state.as_str()).collect();
        assert_eq!(states, vec!["deleted", "active", "stopped"]);
        assert!(intervals[0].is_degenerate());
    }

    #[test]
    fn test_unknown_family_propagates() {
        let provider = MockProvider::default().with(
            "vm-1",
            "z9.tiny",
            1,
            &[("create", "2024-01-01T00:00:00.000000")],
        );
        let result = biller(provider).charge_instance(&InstanceId::new("vm-1"), day(1), day(2));
        assert!(matches!(result, Err(VmchargeError::UnknownFlavorFamily(_))));
    }

    #[test]
    fn test_charge_many_isolates_failures() {
        let provider = MockProvider::default()
            .with("vm-a", "m3.small", 1, &[("create", "2024-01-01T00:00:00")])
            .with("vm-b", "m3.small", 2, &[("create", "2024-01-01T00:00:00")])
            .with("vm-bad", "nodot", 1, &[("create", "2024-01-01T00:00:00")]);
        let ids = [
            InstanceId::new("vm-b"),
            InstanceId::new("vm-bad"),
            InstanceId::new("ghost"),
            InstanceId::new("vm-a"),
        ];

        let (charges, failures) = biller(provider).charge_many(&ids, day(1), day(2));

        let billed: Vec<_> = charges.iter().map(|c| c.instance_id.as_str()).collect();
        assert_eq!(billed, vec!["vm-b", "vm-a"]);
        assert_eq!(charges[0].total(), dec!(48));
        assert_eq!(charges[1].total(), dec!(24));

        let failed: Vec<_> = failures.iter().map(|f| f.instance_id.as_str()).collect();
        assert_eq!(failed, vec!["vm-bad", "ghost"]);
        assert!(failures[1].error.contains("ghost"));
    }

    #[test]
    fn test_inverted_window() {
        let provider =
            MockProvider::default().with("vm-1", "m3.small", 1, &[("create", "2024-01-01T00:00:00")]);
        let result = biller(provider).charge_instance(&InstanceId::new("vm-1"), day(3), day(1));
        assert!(matches!(result, Err(VmchargeError::InvalidRange { .. })));
    }
}
