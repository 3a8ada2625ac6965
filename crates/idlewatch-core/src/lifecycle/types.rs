use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::activity::InteractionKind;
use crate::config::IdlewatchConfig;
use crate::logout::{LogoutReason, LogoutState, LogoutTimeouts};
use crate::navigation::RouteGuard;
use crate::refresh::{LoadingTracker, RefreshReason};
use crate::timer::millis;
use crate::visibility::VisibilitySignal;

/// Inputs fed to a mounted shell through its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleInput {
    Activity(InteractionKind),
    Visibility(VisibilitySignal),
    ExtendSession,
    RefreshDashboard,
    Navigate(String),
    LogoutNow,
}

/// Externally visible transitions, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    TrackingStarted {
        route: String,
    },
    TrackingStopped {
        route: String,
    },
    WarningIssued {
        logout_in_secs: u64,
    },
    SessionExtended {
        warning_dismissed: bool,
    },
    LoggedOut {
        reason: LogoutReason,
        redirect_to: String,
    },
    VisibilityChanged {
        visible: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        hidden_for_ms: Option<u64>,
    },
    SessionRefreshed {
        reason: RefreshReason,
    },
    SessionRefreshFailed {
        reason: RefreshReason,
        error: String,
    },
    DashboardRefreshed {
        sources: Vec<String>,
    },
    DashboardRefreshFailed {
        succeeded: Vec<String>,
        failed: Vec<String>,
    },
}

/// Point-in-time view of a mounted shell.
///
/// Countdowns are measured from the instant the snapshot was taken, see
/// [`LifecycleView::snapshot_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleSnapshot {
    pub state: LogoutState,
    pub route: String,
    pub is_visible: bool,
    pub tracking_active: bool,
    pub loading: bool,
    pub loading_sources: Vec<String>,
    pub idle_for_ms: u64,
    pub warning_in_ms: Option<u64>,
    pub logout_in_ms: Option<u64>,
    pub dashboard_refresh_pending: bool,
}

/// Shell state published after every loop step.
///
/// Holds absolute instants only, so a view published minutes ago still
/// yields current countdowns.
#[derive(Debug, Clone)]
pub struct LifecycleView {
    pub(crate) state: LogoutState,
    pub(crate) route: String,
    pub(crate) is_visible: bool,
    pub(crate) tracking_active: bool,
    pub(crate) loading: LoadingTracker,
    pub(crate) last_activity: Instant,
    pub(crate) warning_deadline: Option<Instant>,
    pub(crate) logout_deadline: Option<Instant>,
    pub(crate) dashboard_refresh_pending: bool,
}

impl LifecycleView {
    pub(crate) fn initial(route: &str, loading: LoadingTracker, now: Instant) -> Self {
        Self {
            state: LogoutState::Idle,
            route: route.to_string(),
            is_visible: true,
            tracking_active: false,
            loading,
            last_activity: now,
            warning_deadline: None,
            logout_deadline: None,
            dashboard_refresh_pending: false,
        }
    }

    pub fn state(&self) -> LogoutState {
        self.state
    }

    pub fn warning_deadline(&self) -> Option<Instant> {
        self.warning_deadline
    }

    pub fn logout_deadline(&self) -> Option<Instant> {
        self.logout_deadline
    }

    pub fn snapshot_at(&self, now: Instant) -> LifecycleSnapshot {
        let until = |deadline: Option<Instant>| {
            deadline.map(|d| millis(d.saturating_duration_since(now)))
        };

        LifecycleSnapshot {
            state: self.state,
            route: self.route.clone(),
            is_visible: self.is_visible,
            tracking_active: self.tracking_active,
            loading: self.loading.is_loading(now),
            loading_sources: self.loading.loading_sources(),
            idle_for_ms: millis(now.saturating_duration_since(self.last_activity)),
            warning_in_ms: until(self.warning_deadline),
            logout_in_ms: until(self.logout_deadline),
            dashboard_refresh_pending: self.dashboard_refresh_pending,
        }
    }
}

/// Callbacks run by the shell. Both default to no-ops.
pub trait LifecycleHooks: Send + Sync {
    fn on_warning(&self, _logout_in: Duration) {}

    fn on_logout(&self, _reason: LogoutReason) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}

/// Resolved settings for one mounted shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub timeouts: LogoutTimeouts,
    pub session_check_interval: Duration,
    pub expiry_margin: Duration,
    pub login_route: String,
    pub route_guard: RouteGuard,
}

impl LifecycleConfig {
    pub fn from_config(config: &IdlewatchConfig) -> Self {
        Self {
            timeouts: LogoutTimeouts::new(
                config.logout.inactivity_timeout(),
                config.logout.warning_time(),
            ),
            session_check_interval: config.logout.session_check_interval(),
            expiry_margin: config.logout.expiry_margin(),
            login_route: config.routes.login_route().to_string(),
            route_guard: RouteGuard::new(config.routes.excluded_prefixes()),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self::from_config(&IdlewatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = LifecycleEvent::LoggedOut {
            reason: LogoutReason::Inactivity,
            redirect_to: "/login".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"logged_out","reason":"inactivity","redirect_to":"/login"}"#
        );
    }

    #[test]
    fn test_visibility_event_omits_missing_duration() {
        let event = LifecycleEvent::VisibilityChanged {
            visible: false,
            hidden_for_ms: None,
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"event":"visibility_changed","visible":false}"#
        );
    }

    #[test]
    fn test_snapshot_counts_down_from_read_time() {
        let t0 = Instant::now();
        let mut view = LifecycleView::initial("/dashboard", LoadingTracker::new(t0), t0);
        view.state = LogoutState::Warned;
        view.logout_deadline = Some(t0 + Duration::from_secs(300));

        let early = view.snapshot_at(t0 + Duration::from_secs(60));
        assert_eq!(early.logout_in_ms, Some(240_000));
        assert_eq!(early.idle_for_ms, 60_000);

        let late = view.snapshot_at(t0 + Duration::from_secs(400));
        assert_eq!(late.logout_in_ms, Some(0));
        assert_eq!(late.warning_in_ms, None);
    }

    #[test]
    fn test_snapshot_loading_window_closes_on_read() {
        let t0 = Instant::now();
        let mut loading = LoadingTracker::new(t0);
        loading.register("stats");
        let chart = loading.register("chart");
        loading.set_loading(chart, true);
        let view = LifecycleView::initial("/dashboard", loading, t0);

        let inside = view.snapshot_at(t0 + Duration::from_secs(2));
        assert!(inside.loading);
        assert_eq!(inside.loading_sources, vec!["chart".to_string()]);

        let after = view.snapshot_at(t0 + Duration::from_secs(6));
        assert!(!after.loading);
        assert_eq!(after.loading_sources, vec!["chart".to_string()]);
    }

    #[test]
    fn test_default_config_matches_defaults() {
        let config = LifecycleConfig::default();
        assert_eq!(config.timeouts.inactivity, Duration::from_secs(30 * 60));
        assert_eq!(config.timeouts.warning, Duration::from_secs(5 * 60));
        assert_eq!(config.session_check_interval, Duration::from_secs(300));
        assert_eq!(config.login_route, "/login");
        assert!(config.route_guard.is_excluded("/auth/callback"));
    }
}
