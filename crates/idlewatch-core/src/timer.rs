//! Single-deadline timer slots.
//!
//! A [`TimerSlot`] holds at most one pending deadline. Arming replaces the
//! previous deadline, so a re-armed timer can never fire twice. Slots do not
//! sleep themselves; the lifecycle shell waits on the earliest armed deadline
//! and then asks each slot whether it is due.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot, replacing any pending deadline.
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Arm the slot `delay` after `now`.
    ///
    /// A deadline past the clock's range leaves the slot disarmed and
    /// returns false.
    pub fn arm_after(&mut self, now: Instant, delay: Duration) -> bool {
        match now.checked_add(delay) {
            Some(deadline) => {
                self.deadline = Some(deadline);
                true
            }
            None => {
                warn!(
                    event = "core.timer.deadline_out_of_range",
                    delay_ms = millis(delay)
                );
                self.deadline = None;
                false
            }
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and return true if the deadline has been reached.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of a set of optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
