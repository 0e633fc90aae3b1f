//! Charge multiplier tables
//!
//! A [`ChargeTable`] maps every instance state and every known flavor family
//! to a non-negative multiplier. The built-in table is fixed at compile
//! time; a rates file can override or extend it once at startup.
//!
//! # Examples
//!
//! ```
//! use rust_decimal_macros::dec;
//! use vmcharge_core::types::{FlavorFamily, InstanceState};
//! use vmcharge_pricing::ChargeTable;
//!
//! let table = ChargeTable::builtin();
//! assert_eq!(table.state_multiplier(InstanceState::Stopped).unwrap(), dec!(0.5));
//! assert_eq!(
//!     table.flavor_family_multiplier(&FlavorFamily::new("g3")).unwrap(),
//!     dec!(2)
//! );
//! ```

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use vmcharge_core::error::{Result, VmchargeError};
use vmcharge_core::types::{FlavorFamily, InstanceState};

/// Built-in multiplier for a state
pub fn default_state_multiplier(state: InstanceState) -> Decimal {
    match state {
        InstanceState::Active => dec!(1),
        InstanceState::Deleted => dec!(0),
        InstanceState::Error => dec!(0),
        InstanceState::NotYetCreated => dec!(0),
        InstanceState::Paused => dec!(0.75),
        InstanceState::Resized => dec!(1),
        InstanceState::ShelvedOffloaded => dec!(0),
        InstanceState::Stopped => dec!(0.5),
        InstanceState::Suspended => dec!(0.75),
    }
}

const DEFAULT_FLAVOR_FAMILIES: [(&str, Decimal); 5] = [
    ("m3", dec!(1)),
    ("g3", dec!(2)),
    ("g3p", dec!(0)),
    ("r3", dec!(2)),
    ("p3", dec!(1)),
];

static BUILTIN: Lazy<ChargeTable> = Lazy::new(|| ChargeTable {
    states: InstanceState::ALL
        .into_iter()
        .map(|state| (state, default_state_multiplier(state)))
        .collect(),
    flavor_families: DEFAULT_FLAVOR_FAMILIES
        .into_iter()
        .map(|(family, multiplier)| (FlavorFamily::new(family), multiplier))
        .collect(),
});

/// Per-state and per-flavor-family charge multipliers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeTable {
    states: BTreeMap<InstanceState, Decimal>,
    flavor_families: BTreeMap<FlavorFamily, Decimal>,
}

/// Entries read from a rates file
///
/// ```json
/// {"states": {"stopped": "0.4"}, "flavor_families": {"x1": "3"}}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateOverrides {
    #[serde(default)]
    pub states: BTreeMap<InstanceState, Decimal>,
    #[serde(default)]
    pub flavor_families: BTreeMap<FlavorFamily, Decimal>,
}

impl ChargeTable {
    /// The compiled-in table
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Build a table from explicit entries
    ///
    /// The result may be partial; lookups of missing keys fail with
    /// `UnknownState` or `UnknownFlavorFamily`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if any multiplier is negative.
    pub fn from_parts(
        states: BTreeMap<InstanceState, Decimal>,
        flavor_families: BTreeMap<FlavorFamily, Decimal>,
    ) -> Result<Self> {
        let table = Self {
            states,
            flavor_families,
        };
        table.validate()?;
        Ok(table)
    }

    /// Load the built-in table with overrides from a JSON rates file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let overrides: RateOverrides =
            serde_json::from_str(&content).map_err(|e| VmchargeError::Parse {
                file: path.to_path_buf(),
                error: e.to_string(),
            })?;

        info!("Loaded charge rates from {}", path.display());
        Self::builtin().with_overrides(overrides)
    }

    /// Apply overrides on top of this table
    pub fn with_overrides(mut self, overrides: RateOverrides) -> Result<Self> {
        debug!(
            "Applying {} state and {} flavor family rate overrides",
            overrides.states.len(),
            overrides.flavor_families.len()
        );
        self.states.extend(overrides.states);
        self.flavor_families.extend(overrides.flavor_families);
        self.validate()?;
        Ok(self)
    }

    /// Multiplier for a state
    pub fn state_multiplier(&self, state: InstanceState) -> Result<Decimal> {
        self.states
            .get(&state)
            .copied()
            .ok_or(VmchargeError::UnknownState(state))
    }

    /// Multiplier for a flavor family
    pub fn flavor_family_multiplier(&self, family: &FlavorFamily) -> Result<Decimal> {
        self.flavor_families
            .get(family)
            .copied()
            .ok_or_else(|| VmchargeError::UnknownFlavorFamily(family.clone()))
    }

    /// State multipliers in state order
    pub fn states(&self) -> impl Iterator<Item = (InstanceState, Decimal)> + '_ {
        self.states.iter().map(|(state, m)| (*state, *m))
    }

    /// Flavor family multipliers in name order
    pub fn flavor_families(&self) -> impl Iterator<Item = (&FlavorFamily, Decimal)> + '_ {
        self.flavor_families.iter().map(|(family, m)| (family, *m))
    }

    fn validate(&self) -> Result<()> {
        if let Some((state, m)) = self.states.iter().find(|(_, m)| **m < Decimal::ZERO) {
            return Err(VmchargeError::Config(format!(
                "Multiplier for state '{state}' must not be negative, got {m}"
            )));
        }
        if let Some((family, m)) = self
            .flavor_families
            .iter()
            .find(|(_, m)| **m < Decimal::ZERO)
        {
            return Err(VmchargeError::Config(format!(
                "Multiplier for flavor family '{family}' must not be negative, got {m}"
            )));
        }
        Ok(())
    }
}

impl Default for ChargeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
