//! The mounted event loop.
//!
//! One task owns every monitor and timer of a mounted view. Each loop step
//! (an input, a due timer, a finished data source, a periodic session check)
//! runs to completion before the next one is selected, so hooks, events and
//! navigation never interleave. Dashboard refetches are polled as one more
//! branch of the loop and never hold it up.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::activity::ActivityMonitor;
use crate::lifecycle::types::{
    LifecycleConfig, LifecycleEvent, LifecycleHooks, LifecycleInput, LifecycleView,
};
use crate::logout::{AutoLogoutController, LogoutAction, LogoutReason, LogoutState};
use crate::navigation::Navigator;
use crate::refresh::{DashboardRefresher, RefreshOutcome, SessionRefreshPolicy, SourceCompletion};
use crate::session::{SessionHealth, SessionStore};
use crate::timer::{earliest, millis};
use crate::visibility::{VisibilityMonitor, VisibilityTransition};

pub(crate) struct Shell {
    config: LifecycleConfig,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    hooks: Arc<dyn LifecycleHooks>,
    route: String,
    activity: ActivityMonitor,
    visibility: VisibilityMonitor,
    logout: AutoLogoutController,
    refresh_policy: SessionRefreshPolicy,
    dashboard: DashboardRefresher,
    events: broadcast::Sender<LifecycleEvent>,
    view: watch::Sender<LifecycleView>,
}

pub(crate) struct ShellParts {
    pub config: LifecycleConfig,
    pub store: Arc<dyn SessionStore>,
    pub navigator: Arc<dyn Navigator>,
    pub hooks: Arc<dyn LifecycleHooks>,
    pub route: String,
    pub dashboard: DashboardRefresher,
    pub events: broadcast::Sender<LifecycleEvent>,
    pub view: watch::Sender<LifecycleView>,
}

impl Shell {
    pub(crate) fn new(parts: ShellParts, now: Instant) -> Self {
        let ShellParts {
            config,
            store,
            navigator,
            hooks,
            route,
            dashboard,
            events,
            view,
        } = parts;

        Self {
            activity: ActivityMonitor::new(now),
            visibility: VisibilityMonitor::new(),
            logout: AutoLogoutController::new(config.timeouts),
            refresh_policy: SessionRefreshPolicy::new(config.expiry_margin),
            config,
            store,
            navigator,
            hooks,
            route,
            dashboard,
            events,
            view,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<LifecycleInput>,
        cancel: CancellationToken,
        initial_load: bool,
    ) {
        info!(
            event = "core.lifecycle.mounted",
            route = %self.route,
            sources = self.dashboard.source_names().len()
        );

        self.enter_route(Instant::now());
        if initial_load {
            self.dashboard.start_refetch();
        }
        self.publish();

        // First tick completes immediately and doubles as the mount-time check.
        // A zero period would make `interval` panic.
        let period = self.config.session_check_interval.max(Duration::from_secs(1));
        let mut session_check = tokio::time::interval(period);
        session_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.next_deadline();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(event = "core.lifecycle.cancelled");
                    break;
                }
                input = inputs.recv() => match input {
                    Some(input) => self.handle_input(input).await,
                    None => {
                        debug!(event = "core.lifecycle.inputs_closed");
                        break;
                    }
                },
                _ = sleep_until_deadline(deadline) => self.fire_timers().await,
                Some(completion) = self.dashboard.next_completion(), if self.dashboard.is_refetching() => {
                    self.finish_source(completion)
                }
                _ = session_check.tick(), if self.logout.is_active() => self.check_session().await,
            }

            self.publish();

            if self.logout.state() == LogoutState::LoggedOut {
                break;
            }
        }

        self.logout.stop();
        self.dashboard.cancel();
        self.publish();
        info!(event = "core.lifecycle.unmounted", state = %self.logout.state());
    }

    async fn handle_input(&mut self, input: LifecycleInput) {
        let now = Instant::now();

        match input {
            LifecycleInput::Activity(kind) => {
                if self.activity.record(kind, now) {
                    self.logout.record_activity(now);
                }
            }
            LifecycleInput::Visibility(signal) => {
                let document_was_hidden = self.visibility.is_document_hidden();
                let transition = self.visibility.apply(signal, now);

                match (document_was_hidden, self.visibility.is_document_hidden()) {
                    (false, true) => self.suspend_tracking(),
                    (true, false) => self.resume_tracking(now),
                    _ => {}
                }

                match transition {
                    Some(VisibilityTransition::Hidden) => {
                        self.emit(LifecycleEvent::VisibilityChanged {
                            visible: false,
                            hidden_for_ms: None,
                        });
                    }
                    Some(VisibilityTransition::Visible { hidden_for }) => {
                        self.on_visible(hidden_for, now).await
                    }
                    None => debug!(event = "core.lifecycle.visibility_unchanged", signal = %signal),
                }
            }
            LifecycleInput::ExtendSession => {
                if !self.logout.is_active() {
                    debug!(event = "core.lifecycle.extend_ignored", state = %self.logout.state());
                    return;
                }
                self.activity.touch(now);
                let warning_dismissed = self.logout.extend(now);
                info!(
                    event = "core.lifecycle.session_extended",
                    warning_dismissed = warning_dismissed
                );
                self.emit(LifecycleEvent::SessionExtended { warning_dismissed });
            }
            LifecycleInput::RefreshDashboard => {
                if self.dashboard.has_sources() {
                    self.dashboard.request(now);
                } else {
                    debug!(event = "core.lifecycle.refresh_without_sources");
                }
            }
            LifecycleInput::Navigate(route) => {
                debug!(event = "core.lifecycle.route_changed", from = %self.route, to = %route);
                self.route = route;
                self.enter_route(now);
            }
            LifecycleInput::LogoutNow => self.perform_logout(LogoutReason::UserRequested).await,
        }
    }

    fn enter_route(&mut self, now: Instant) {
        let excluded = self.config.route_guard.is_excluded(&self.route);
        self.activity.set_route_excluded(excluded);

        if excluded {
            if self.logout.stop() {
                self.emit(LifecycleEvent::TrackingStopped {
                    route: self.route.clone(),
                });
            }
        } else if self.logout.start(now) {
            self.activity.touch(now);
            self.emit(LifecycleEvent::TrackingStarted {
                route: self.route.clone(),
            });
        }
    }

    /// The document went hidden: stop counting inactivity.
    fn suspend_tracking(&mut self) {
        self.activity.set_hidden(true);
        if self.logout.pause() {
            info!(event = "core.lifecycle.warning_withdrawn");
        }
    }

    fn resume_tracking(&mut self, now: Instant) {
        self.activity.set_hidden(false);
        self.activity.touch(now);
        self.logout.resume(now);
    }

    async fn on_visible(&mut self, hidden_for: Duration, now: Instant) {
        self.emit(LifecycleEvent::VisibilityChanged {
            visible: true,
            hidden_for_ms: Some(millis(hidden_for)),
        });

        if !self.visibility.needs_attention() {
            return;
        }

        if self.logout.is_active() {
            match self
                .refresh_policy
                .evaluate(self.store.as_ref(), hidden_for)
                .await
            {
                RefreshOutcome::NotNeeded => {}
                RefreshOutcome::Refreshed(reason) => {
                    self.emit(LifecycleEvent::SessionRefreshed { reason });
                }
                RefreshOutcome::Failed { reason, error } => {
                    self.emit(LifecycleEvent::SessionRefreshFailed {
                        reason,
                        error: error.to_string(),
                    });
                }
            }
        }

        if self.dashboard.has_sources() && self.dashboard.is_stale(now) {
            debug!(event = "core.lifecycle.dashboard_stale");
            self.dashboard.request(now);
        }

        self.visibility.clear_was_hidden();
    }

    async fn fire_timers(&mut self) {
        let now = Instant::now();

        while let Some(action) = self.logout.poll(now) {
            match action {
                LogoutAction::Warn { logout_in } => {
                    self.hooks.on_warning(logout_in);
                    self.emit(LifecycleEvent::WarningIssued {
                        logout_in_secs: logout_in.as_secs(),
                    });
                }
                LogoutAction::Logout(reason) => {
                    self.perform_logout(reason).await;
                    return;
                }
            }
        }

        if self.dashboard.take_due(now) {
            self.dashboard.start_refetch();
        }
    }

    async fn check_session(&mut self) {
        let margin = self.config.expiry_margin;

        let reason = match self.store.get_session().await {
            Ok(Some(session)) => match session.health(Utc::now(), margin) {
                SessionHealth::Valid => {
                    debug!(event = "core.lifecycle.session_check_passed");
                    return;
                }
                SessionHealth::ExpiringSoon | SessionHealth::Expired => {
                    LogoutReason::SessionExpiring
                }
            },
            Ok(None) => LogoutReason::SessionMissing,
            Err(e) => {
                warn!(event = "core.lifecycle.session_check_failed", error = %e);
                LogoutReason::SessionCheckFailed
            }
        };

        info!(event = "core.lifecycle.session_invalid", reason = %reason);
        self.perform_logout(reason).await;
    }

    async fn perform_logout(&mut self, reason: LogoutReason) {
        if !self.logout.begin_logout(reason) {
            return;
        }
        self.dashboard.cancel();

        if let Err(e) = self.store.sign_out().await {
            warn!(event = "core.lifecycle.sign_out_failed", error = %e);
        }

        self.hooks.on_logout(reason);
        let redirect_to = self.config.login_route.clone();
        self.emit(LifecycleEvent::LoggedOut {
            reason,
            redirect_to: redirect_to.clone(),
        });
        self.navigator.navigate_to(&redirect_to);
        info!(
            event = "core.lifecycle.logged_out",
            reason = %reason,
            redirect_to = %redirect_to
        );
    }

    fn finish_source(&mut self, completion: SourceCompletion) {
        let Some(report) = self.dashboard.finish_source(completion, Instant::now()) else {
            return;
        };

        if report.is_success() {
            self.emit(LifecycleEvent::DashboardRefreshed {
                sources: report.succeeded,
            });
        } else {
            self.emit(LifecycleEvent::DashboardRefreshFailed {
                succeeded: report.succeeded,
                failed: report.failed.into_iter().map(|(name, _)| name).collect(),
            });
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        earliest([self.logout.next_deadline(), self.dashboard.next_deadline()])
    }

    fn emit(&self, event: LifecycleEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.view.send_replace(LifecycleView {
            state: self.logout.state(),
            route: self.route.clone(),
            is_visible: self.visibility.is_visible(),
            tracking_active: self.activity.is_tracking_active() && self.logout.is_active(),
            loading: self.dashboard.loading().clone(),
            last_activity: self.activity.last_activity(),
            warning_deadline: self.logout.warning_deadline(),
            logout_deadline: self.logout.logout_deadline(),
            dashboard_refresh_pending: self.dashboard.next_deadline().is_some(),
        });
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
