//! Interval reconstruction
//!
//! Converts an ordered action log into a gap-free partition of a billing
//! window `[start, end)` into state intervals.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use vmcharge_core::intervals::reconstruct;
//! use vmcharge_core::types::{Action, ActionKind, InstanceState};
//!
//! let t = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
//! let actions = [
//!     Action::new(ActionKind::Create, t(0)),
//!     Action::new(ActionKind::Stop, t(5)),
//! ];
//!
//! let intervals = reconstruct(&actions, t(2), t(8)).unwrap();
//! assert_eq!(intervals.len(), 2);
//! assert_eq!(intervals[0].state, InstanceState::Active);
//! assert_eq!(intervals[1].state, InstanceState::Stopped);
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::iter;
use tracing::debug;

use crate::error::{HistoryStage, Result, VmchargeError};
use crate::types::{Action, InstanceState, Interval};

/// Partition `[start, end)` into the states the instance occupied
///
/// `actions` must be in chronological order, as produced by
/// [`normalize`](crate::normalizer::normalize).
///
/// A window starting at or before the earliest action opens in
/// `InstanceState::Deleted`; this covers windows that end before the
/// instance was created. Otherwise the opening state comes from the last
/// action at or before `start`. Every action inside the window starts
/// a new interval, including zero-length ones for actions sharing a
/// timestamp or landing exactly on `start`.
///
/// # Errors
///
/// - `InvalidRange` if `end` is before `start`
/// - `EmptyHistory(Reconstruct)` if `actions` is empty
pub fn reconstruct(
    actions: &[Action],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Interval>> {
    if end < start {
        return Err(VmchargeError::InvalidRange { start, end });
    }

    let Some(earliest) = actions.first() else {
        return Err(VmchargeError::EmptyHistory(HistoryStage::Reconstruct));
    };

    let before_end: Vec<&Action> = actions.iter().filter(|a| a.timestamp < end).collect();

    let starting_state = if start <= earliest.timestamp {
        InstanceState::Deleted
    } else {
        before_end
            .iter()
            .take_while(|a| a.timestamp <= start)
            .fold(InstanceState::Deleted, |_, a| a.kind.resulting_state())
    };

    let in_window: Vec<&Action> = before_end
        .into_iter()
        .filter(|a| a.timestamp >= start)
        .collect();

    let Some(first) = in_window.first() else {
        debug!("No actions inside window, state stays {}", starting_state);
        return Ok(vec![Interval::new(start, end, starting_state)]);
    };

    let mut intervals = Vec::with_capacity(in_window.len() + 1);
    intervals.push(Interval::new(start, first.timestamp, starting_state));

    let next_boundaries = in_window
        .iter()
        .skip(1)
        .map(|a| a.timestamp)
        .chain(iter::once(end));
    intervals.extend(
        in_window
            .iter()
            .zip(next_boundaries)
            .map(|(a, next)| Interval::new(a.timestamp, next, a.kind.resulting_state())),
    );

    debug!(
        "Reconstructed {} intervals from {} actions in window",
        intervals.len(),
        in_window.len()
    );

    Ok(intervals)
}

/// Whether `intervals` chain exactly from `start` to `end` without gaps or overlaps
pub fn covers_window(intervals: &[Interval], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    let (Some(first), Some(last)) = (intervals.first(), intervals.last()) else {
        return false;
    };

    first.start == start
        && last.end == end
        && intervals.windows(2).all(|pair| pair[0].end == pair[1].start)
        && intervals.iter().all(|i| i.start <= i.end)
}

/// Total time spent in each state
pub fn time_per_state(intervals: &[Interval]) -> BTreeMap<InstanceState, TimeDelta> {
    intervals.iter().fold(BTreeMap::new(), |mut totals, interval| {
        *totals.entry(interval.state).or_insert_with(TimeDelta::zero) += interval.duration();
        totals
    })
}
