//! Auto-logout state machine.
//!
//! The controller owns the cascading warning and logout timers. It never
//! sleeps and never performs side effects: the lifecycle shell feeds it the
//! current instant, waits on [`AutoLogoutController::next_deadline`], and acts
//! on the [`LogoutAction`]s returned by [`AutoLogoutController::poll`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::timer::{TimerSlot, earliest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutState {
    Idle,
    Tracking,
    Warned,
    LoggedOut,
}

impl fmt::Display for LogoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogoutState::Idle => "idle",
            LogoutState::Tracking => "tracking",
            LogoutState::Warned => "warned",
            LogoutState::LoggedOut => "logged_out",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    Inactivity,
    SessionMissing,
    SessionExpiring,
    SessionCheckFailed,
    UserRequested,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogoutReason::Inactivity => "inactivity",
            LogoutReason::SessionMissing => "session_missing",
            LogoutReason::SessionExpiring => "session_expiring",
            LogoutReason::SessionCheckFailed => "session_check_failed",
            LogoutReason::UserRequested => "user_requested",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutTimeouts {
    pub inactivity: Duration,
    pub warning: Duration,
}

impl LogoutTimeouts {
    pub fn new(inactivity: Duration, warning: Duration) -> Self {
        Self {
            inactivity,
            warning,
        }
    }

    /// Delay from the last activity until the warning fires.
    pub fn warning_delay(&self) -> Duration {
        self.inactivity.saturating_sub(self.warning)
    }
}

impl Default for LogoutTimeouts {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60), Duration::from_secs(5 * 60))
    }
}

/// What the shell must do after a timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutAction {
    Warn { logout_in: Duration },
    Logout(LogoutReason),
}

#[derive(Debug, Clone)]
pub struct AutoLogoutController {
    timeouts: LogoutTimeouts,
    state: LogoutState,
    warning_timer: TimerSlot,
    logout_timer: TimerSlot,
    paused: bool,
}

impl AutoLogoutController {
    pub fn new(timeouts: LogoutTimeouts) -> Self {
        Self {
            timeouts,
            state: LogoutState::Idle,
            warning_timer: TimerSlot::new(),
            logout_timer: TimerSlot::new(),
            paused: false,
        }
    }

    pub fn timeouts(&self) -> LogoutTimeouts {
        self.timeouts
    }

    pub fn state(&self) -> LogoutState {
        self.state
    }

    /// Tracking or warned: the session is being watched.
    pub fn is_active(&self) -> bool {
        matches!(self.state, LogoutState::Tracking | LogoutState::Warned)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `Idle → Tracking`. Returns false when already active or logged out.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != LogoutState::Idle {
            return false;
        }

        self.state = LogoutState::Tracking;
        self.logout_timer.cancel();
        if !self.paused {
            self.arm_warning(now);
        }
        info!(
            event = "core.logout.tracking_started",
            inactivity_secs = self.timeouts.inactivity.as_secs(),
            warning_secs = self.timeouts.warning.as_secs()
        );
        true
    }

    /// Any non-terminal state `→ Idle`, clearing both timers.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }

        self.state = LogoutState::Idle;
        self.warning_timer.cancel();
        self.logout_timer.cancel();
        info!(event = "core.logout.tracking_stopped");
        true
    }

    /// Qualifying activity while tracking re-arms the warning timer.
    ///
    /// Activity during the warning phase does not dismiss the warning; only
    /// [`extend`](Self::extend) does.
    pub fn record_activity(&mut self, now: Instant) -> bool {
        if self.state != LogoutState::Tracking || self.paused {
            return false;
        }
        self.arm_warning(now);
        true
    }

    /// Explicit session extension. Returns true when a warning was dismissed.
    pub fn extend(&mut self, now: Instant) -> bool {
        if !self.is_active() {
            return false;
        }

        let was_warned = self.state == LogoutState::Warned;
        self.state = LogoutState::Tracking;
        self.logout_timer.cancel();
        if !self.paused {
            self.arm_warning(now);
        }
        if was_warned {
            info!(event = "core.logout.warning_dismissed");
        }
        was_warned
    }

    /// Suspend both timers while the view is hidden.
    ///
    /// A pending warning is withdrawn. Returns true in that case.
    pub fn pause(&mut self) -> bool {
        if self.paused {
            return false;
        }

        self.paused = true;
        self.warning_timer.cancel();
        self.logout_timer.cancel();

        if self.state == LogoutState::Warned {
            self.state = LogoutState::Tracking;
            debug!(event = "core.logout.warning_withdrawn");
            return true;
        }
        false
    }

    /// Resume after the view became visible, counting from `now`.
    pub fn resume(&mut self, now: Instant) {
        if !self.paused {
            return;
        }

        self.paused = false;
        if self.state == LogoutState::Tracking {
            self.arm_warning(now);
        }
    }

    /// Fire due timers, at most one action per call.
    pub fn poll(&mut self, now: Instant) -> Option<LogoutAction> {
        if self.logout_timer.fire_if_due(now) && self.state == LogoutState::Warned {
            info!(event = "core.logout.logout_timer_fired");
            return Some(LogoutAction::Logout(LogoutReason::Inactivity));
        }

        if self.warning_timer.fire_if_due(now) && self.state == LogoutState::Tracking {
            self.state = LogoutState::Warned;
            self.logout_timer.arm_after(now, self.timeouts.warning);
            info!(
                event = "core.logout.warning_fired",
                logout_in_secs = self.timeouts.warning.as_secs()
            );
            return Some(LogoutAction::Warn {
                logout_in: self.timeouts.warning,
            });
        }

        None
    }

    /// Enter the terminal state. Returns true only for the first call, so
    /// sign-out and navigation run exactly once.
    pub fn begin_logout(&mut self, reason: LogoutReason) -> bool {
        if self.state == LogoutState::LoggedOut {
            debug!(event = "core.logout.duplicate_ignored", reason = %reason);
            return false;
        }

        self.state = LogoutState::LoggedOut;
        self.warning_timer.cancel();
        self.logout_timer.cancel();
        info!(event = "core.logout.started", reason = %reason);
        true
    }

    pub fn warning_deadline(&self) -> Option<Instant> {
        self.warning_timer.deadline()
    }

    pub fn logout_deadline(&self) -> Option<Instant> {
        self.logout_timer.deadline()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.warning_deadline(), self.logout_deadline()])
    }

    fn arm_warning(&mut self, now: Instant) {
        self.warning_timer
            .arm_after(now, self.timeouts.warning_delay());
    }
}
