//! Action history normalization
//!
//! Turns the raw, unordered provider feed into a chronologically ordered
//! log of relevant actions that always begins with a `create`.
//!
//! # Examples
//!
//! ```
//! use vmcharge_core::normalizer::normalize;
//! use vmcharge_core::types::{ActionKind, RawAction};
//!
//! let raw = vec![
//!     RawAction::new("stop", "2024-01-02T00:00:00"),
//!     RawAction::new("attach_volume", "2024-01-01T12:00:00"),
//! ];
//! let actions = normalize(&raw, "2024-01-01T00:00:00Z").unwrap();
//!
//! let kinds: Vec<_> = actions.iter().map(|a| a.kind).collect();
//! assert_eq!(kinds, vec![ActionKind::Create, ActionKind::Stop]);
//! ```

use tracing::{debug, warn};

use crate::error::{HistoryStage, Result, VmchargeError};
use crate::timestamp::parse_utc_timestamp;
use crate::types::{Action, ActionKind, RawAction};

/// Filter, parse, and order a raw action feed
///
/// Irrelevant kinds are dropped before their timestamps are parsed. The
/// sort is stable, so actions sharing a timestamp keep their feed order.
/// When the earliest action is not a `create`, one is synthesized at
/// `fallback_created_at`; a blank fallback means no creation time is known.
///
/// # Errors
///
/// - `InvalidTimestamp` if a relevant action or the fallback cannot be parsed
/// - `EmptyHistory(Normalize)` if nothing is left and no creation time is known
pub fn normalize(raw_actions: &[RawAction], fallback_created_at: &str) -> Result<Vec<Action>> {
    let mut actions = raw_actions
        .iter()
        .filter_map(|raw| ActionKind::parse_relevant(&raw.action).map(|kind| (kind, raw)))
        .map(|(kind, raw)| parse_utc_timestamp(&raw.start_time).map(|ts| Action::new(kind, ts)))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Kept {} of {} raw actions after filtering",
        actions.len(),
        raw_actions.len()
    );

    actions.sort_by_key(|action| action.timestamp);

    let starts_with_create = actions
        .first()
        .is_some_and(|first| first.kind == ActionKind::Create);

    if !starts_with_create {
        if fallback_created_at.trim().is_empty() {
            if actions.is_empty() {
                return Err(VmchargeError::EmptyHistory(HistoryStage::Normalize));
            }
            warn!("Action history has no create event and no creation time is known");
        } else {
            let created_at = parse_utc_timestamp(fallback_created_at)?;
            let created_at = match actions.first() {
                Some(first) if first.timestamp < created_at => {
                    warn!(
                        "Creation time {} is after the first recorded action at {}; using the action time",
                        created_at, first.timestamp
                    );
                    first.timestamp
                }
                _ => created_at,
            };
            debug!("Synthesizing create action at {}", created_at);
            actions.insert(0, Action::new(ActionKind::Create, created_at));
        }
    }

    Ok(actions)
}
