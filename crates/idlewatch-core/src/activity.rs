//! User activity tracking.
//!
//! The monitor records the last qualifying interaction and tells the caller
//! when the auto-logout timers must be re-armed. Tracking is suspended while
//! the view is hidden and while the current route is excluded.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Minimum spacing between two recorded activities.
pub const ACTIVITY_THROTTLE: Duration = Duration::from_secs(1);

/// Interaction kinds that count as user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 6] = [
        InteractionKind::PointerDown,
        InteractionKind::PointerMove,
        InteractionKind::KeyPress,
        InteractionKind::Scroll,
        InteractionKind::TouchStart,
        InteractionKind::Click,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::PointerDown => "pointer-down",
            InteractionKind::PointerMove => "pointer-move",
            InteractionKind::KeyPress => "key-press",
            InteractionKind::Scroll => "scroll",
            InteractionKind::TouchStart => "touch-start",
            InteractionKind::Click => "click",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InteractionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown interaction '{}'. Valid: pointer-down, pointer-move, key-press, scroll, touch-start, click",
                    s
                )
            })
    }
}

/// Snapshot of the monitor's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityState {
    pub last_activity: Instant,
    pub is_tracking_active: bool,
}

#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    last_activity: Instant,
    throttle: Duration,
    hidden: bool,
    route_excluded: bool,
}

impl ActivityMonitor {
    pub fn new(now: Instant) -> Self {
        Self::with_throttle(now, ACTIVITY_THROTTLE)
    }

    pub fn with_throttle(now: Instant, throttle: Duration) -> Self {
        Self {
            last_activity: now,
            throttle,
            hidden: false,
            route_excluded: false,
        }
    }

    /// Record an interaction.
    ///
    /// Returns true when the activity qualified (tracking active, throttle
    /// elapsed) and the inactivity timers must be re-armed.
    pub fn record(&mut self, kind: InteractionKind, now: Instant) -> bool {
        if !self.is_tracking_active() {
            return false;
        }

        if now.saturating_duration_since(self.last_activity) < self.throttle {
            return false;
        }

        tracing::trace!(event = "core.activity.recorded", kind = %kind);
        self.last_activity = now;
        true
    }

    /// Reset the inactivity clock without throttling (explicit session extension).
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn set_route_excluded(&mut self, excluded: bool) {
        self.route_excluded = excluded;
    }

    pub fn is_tracking_active(&self) -> bool {
        !self.hidden && !self.route_excluded
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub fn state(&self) -> ActivityState {
        ActivityState {
            last_activity: self.last_activity,
            is_tracking_active: self.is_tracking_active(),
        }
    }
}
