//! Batch window planning: how long to sleep, and which plans are due.

use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime};

use crate::calculator::ScheduledPlan;

/// Lookahead window in seconds.
///
/// The loop wakes this long before the nearest fire so that plans
/// scheduled for near-simultaneous instants can be assembled into one
/// batch without busy-waiting.
pub const LOOKAHEAD_SECS: i64 = 30;

/// One planning cycle's decision: sleep bound plus imminent plans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// How long to sleep before the next scan. `None` when a plan is
    /// already inside the lookahead window (no sleep), or when the plan
    /// list is empty (nothing to wait for).
    pub sleep: Option<StdDuration>,
    /// Indices of plans whose fire time lies within the lookahead
    /// window, in input order. Rebuilt every cycle.
    pub due: Vec<usize>,
}

/// Plan the next cycle.
///
/// The caller sleeps `sleep`, then must re-derive each due plan's
/// remaining time before executing it, because the sleep itself consumes
/// wall-clock time.
#[must_use]
pub fn plan(plans: &[ScheduledPlan], now: NaiveDateTime) -> BatchPlan {
    let window = Duration::seconds(LOOKAHEAD_SECS);

    let mut closest: Option<Duration> = None;
    let mut due = Vec::new();
    for (idx, scheduled) in plans.iter().enumerate() {
        let remaining = scheduled.next_fire - now;
        if closest.map_or(true, |c| remaining < c) {
            closest = Some(remaining);
        }
        if remaining < window {
            due.push(idx);
        }
    }

    let sleep = match closest {
        Some(c) if c > window => (c - window).to_std().ok(),
        _ => None,
    };

    BatchPlan { sleep, due }
}
