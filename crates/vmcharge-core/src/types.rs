//! Core domain types for vmcharge
//!
//! This module contains the fundamental types used throughout the vmcharge
//! crates: lifecycle actions, instance states, charge intervals, and the
//! collaborator-facing shapes returned by history providers.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VmchargeError};

/// Strongly-typed instance identifier
///
/// # Examples
/// ```
/// use vmcharge_core::types::InstanceId;
///
/// let id = InstanceId::new("6f1e2a44-0c1b-4a57-9d43-2b8f0d1f5e10");
/// assert_eq!(id.as_str(), "6f1e2a44-0c1b-4a57-9d43-2b8f0d1f5e10");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    /// Create a new InstanceId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle action kinds that change billable state
///
/// Providers report many more kinds (volume attachments, reboots, ...);
/// those are noise and never make it past the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Delete,
    Pause,
    Resume,
    Shelve,
    Start,
    Stop,
    Suspend,
    Unpause,
    Unshelve,
}

impl ActionKind {
    /// Every relevant action kind
    pub const ALL: [ActionKind; 10] = [
        Self::Create,
        Self::Delete,
        Self::Pause,
        Self::Resume,
        Self::Shelve,
        Self::Start,
        Self::Stop,
        Self::Suspend,
        Self::Unpause,
        Self::Unshelve,
    ];

    /// Map a provider-reported action name to a relevant kind
    ///
    /// Returns `None` for kinds that do not affect billing.
    ///
    /// # Examples
    /// ```
    /// use vmcharge_core::types::ActionKind;
    ///
    /// assert_eq!(ActionKind::parse_relevant("stop"), Some(ActionKind::Stop));
    /// assert_eq!(ActionKind::parse_relevant("attach_volume"), None);
    /// ```
    pub fn parse_relevant(name: &str) -> Option<Self> {
        match name {
            "create" => Some(Self::Create),
            "delete" => Some(Self::Delete),
            "pause" => Some(Self::Pause),
            "resume" => Some(Self::Resume),
            "shelve" => Some(Self::Shelve),
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "suspend" => Some(Self::Suspend),
            "unpause" => Some(Self::Unpause),
            "unshelve" => Some(Self::Unshelve),
            _ => None,
        }
    }

    /// State the instance is in after this action, until the next relevant action
    pub fn resulting_state(self) -> InstanceState {
        match self {
            Self::Create | Self::Resume | Self::Start | Self::Unpause | Self::Unshelve => {
                InstanceState::Active
            }
            Self::Delete => InstanceState::Deleted,
            // A paused instance bills like a suspended one.
            Self::Pause | Self::Suspend => InstanceState::Suspended,
            Self::Shelve => InstanceState::ShelvedOffloaded,
            Self::Stop => InstanceState::Stopped,
        }
    }

    /// Provider-facing name of the action
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Shelve => "shelve",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Suspend => "suspend",
            Self::Unpause => "unpause",
            Self::Unshelve => "unshelve",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Active,
    Deleted,
    Suspended,
    ShelvedOffloaded,
    Stopped,
    Paused,
    Resized,
    Error,
    NotYetCreated,
}

impl InstanceState {
    /// Every instance state
    pub const ALL: [InstanceState; 9] = [
        Self::Active,
        Self::Deleted,
        Self::Suspended,
        Self::ShelvedOffloaded,
        Self::Stopped,
        Self::Paused,
        Self::Resized,
        Self::Error,
        Self::NotYetCreated,
    ];

    /// Snake-case name of the state
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::Suspended => "suspended",
            Self::ShelvedOffloaded => "shelved_offloaded",
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Resized => "resized",
            Self::Error => "error",
            Self::NotYetCreated => "not_yet_created",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Invalid instance state: {s}"))
    }
}

/// A relevant lifecycle action with its UTC timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// What happened
    pub kind: ActionKind,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl Action {
    /// Create a new Action
    pub fn new(kind: ActionKind, timestamp: DateTime<Utc>) -> Self {
        Self { kind, timestamp }
    }
}

/// A contiguous sub-range of a billing window spent in a single state
///
/// `start <= end` always holds; zero-length intervals are legitimate and
/// record a state transition that happened exactly at a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
    /// State held for the whole interval
    pub state: InstanceState,
}

impl Interval {
    /// Create a new Interval
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, state: InstanceState) -> Self {
        debug_assert!(start <= end, "interval start must not be after its end");
        Self { start, end, state }
    }

    /// Length of the interval
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Whether the interval has zero length
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// Flavor family used to select a charge multiplier tier
///
/// # Examples
/// ```
/// use vmcharge_core::types::FlavorFamily;
///
/// let family = FlavorFamily::from_flavor_name("g3.large").unwrap();
/// assert_eq!(family.as_str(), "g3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlavorFamily(String);

impl FlavorFamily {
    /// Create a new FlavorFamily from an already-extracted prefix
    pub fn new(family: impl Into<String>) -> Self {
        Self(family.into())
    }

    /// Extract the family from a flavor name: everything before the first `.`
    pub fn from_flavor_name(name: &str) -> Result<Self> {
        match name.split_once('.') {
            Some((prefix, _)) => Ok(Self(prefix.to_string())),
            None => Err(VmchargeError::InvalidFlavorName(format!(
                "'{name}' has no '.' separating the family prefix"
            ))),
        }
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlavorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Action record as reported by a history provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAction {
    /// Provider action name, relevant or not
    pub action: String,
    /// Start time, usually without a zone marker
    pub start_time: String,
}

impl RawAction {
    /// Create a new RawAction
    pub fn new(action: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            start_time: start_time.into(),
        }
    }
}

/// Flavor assigned to an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    /// Flavor name, e.g. `m3.small`
    pub original_name: String,
    /// Virtual CPU count
    pub vcpus: u32,
}

impl Flavor {
    /// Family prefix of this flavor
    pub fn family(&self) -> Result<FlavorFamily> {
        FlavorFamily::from_flavor_name(&self.original_name)
    }
}

/// Instance metadata as reported by a history provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    /// Creation time, used when the action feed lacks a `create`
    pub created_at: String,
    /// Current flavor
    pub flavor: Flavor,
}

/// Metadata and raw action feed of one instance, read together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHistory {
    pub metadata: InstanceMetadata,
    pub actions: Vec<RawAction>,
}
