use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::activity::InteractionKind;
use crate::errors::LifecycleError;
use crate::lifecycle::shell::{Shell, ShellParts};
use crate::lifecycle::types::{
    LifecycleConfig, LifecycleEvent, LifecycleHooks, LifecycleInput, LifecycleSnapshot, LifecycleView,
    NoopHooks,
};
use crate::navigation::{LogNavigator, Navigator};
use crate::refresh::{DashboardRefresher, DataSource};
use crate::session::SessionStore;
use crate::visibility::VisibilitySignal;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Collects collaborators for one authenticated view and mounts its shell.
pub struct LifecycleBuilder {
    store: Arc<dyn SessionStore>,
    config: LifecycleConfig,
    navigator: Arc<dyn Navigator>,
    hooks: Arc<dyn LifecycleHooks>,
    sources: Vec<Arc<dyn DataSource>>,
    route: String,
    initial_load: bool,
}

impl LifecycleBuilder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            config: LifecycleConfig::default(),
            navigator: Arc::new(LogNavigator),
            hooks: Arc::new(NoopHooks),
            sources: Vec::new(),
            route: "/".to_string(),
            initial_load: true,
        }
    }

    pub fn config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Route the view is mounted on.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    /// Whether all sources are fetched once at mount (default: true).
    pub fn initial_load(mut self, enabled: bool) -> Self {
        self.initial_load = enabled;
        self
    }

    /// Spawn the shell on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn mount(self) -> LifecycleHandle {
        let now = Instant::now();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let dashboard = DashboardRefresher::new(self.sources, now);
        let (view_tx, view_rx) = watch::channel(LifecycleView::initial(
            &self.route,
            dashboard.loading().clone(),
            now,
        ));
        let cancel = CancellationToken::new();

        let shell = Shell::new(
            ShellParts {
                dashboard,
                config: self.config,
                store: self.store,
                navigator: self.navigator,
                hooks: self.hooks,
                route: self.route,
                events: event_tx.clone(),
                view: view_tx,
            },
            now,
        );

        let task = tokio::spawn(shell.run(input_rx, cancel.clone(), self.initial_load));

        LifecycleHandle {
            inputs: Some(input_tx),
            events: event_tx,
            first_events: Some(event_rx),
            view: view_rx,
            cancel,
            task: Some(task),
        }
    }
}

/// Control surface of a mounted shell.
///
/// Dropping the handle cancels the shell; [`unmount`](Self::unmount)
/// additionally waits until it has stopped.
pub struct LifecycleHandle {
    inputs: Option<mpsc::UnboundedSender<LifecycleInput>>,
    events: broadcast::Sender<LifecycleEvent>,
    first_events: Option<broadcast::Receiver<LifecycleEvent>>,
    view: watch::Receiver<LifecycleView>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LifecycleHandle {
    pub fn send(&self, input: LifecycleInput) -> Result<(), LifecycleError> {
        let inputs = self.inputs.as_ref().ok_or(LifecycleError::ShellStopped)?;
        inputs.send(input).map_err(|_| LifecycleError::ShellStopped)
    }

    pub fn activity(&self, kind: InteractionKind) -> Result<(), LifecycleError> {
        self.send(LifecycleInput::Activity(kind))
    }

    pub fn visibility(&self, signal: VisibilitySignal) -> Result<(), LifecycleError> {
        self.send(LifecycleInput::Visibility(signal))
    }

    pub fn extend_session(&self) -> Result<(), LifecycleError> {
        self.send(LifecycleInput::ExtendSession)
    }

    pub fn refresh_dashboard(&self) -> Result<(), LifecycleError> {
        self.send(LifecycleInput::RefreshDashboard)
    }

    pub fn navigate(&self, route: impl Into<String>) -> Result<(), LifecycleError> {
        self.send(LifecycleInput::Navigate(route.into()))
    }

    pub fn logout_now(&self) -> Result<(), LifecycleError> {
        self.send(LifecycleInput::LogoutNow)
    }

    /// Subscribe to lifecycle events.
    ///
    /// The first call returns a receiver created before the shell started, so
    /// it sees every event since mount. Later calls only see new events.
    pub fn subscribe(&mut self) -> broadcast::Receiver<LifecycleEvent> {
        self.first_events
            .take()
            .unwrap_or_else(|| self.events.subscribe())
    }

    /// Current snapshot, with countdowns measured from now.
    pub fn snapshot(&self) -> LifecycleSnapshot {
        self.view.borrow().snapshot_at(Instant::now())
    }

    /// Receiver notified after every loop step of the shell.
    pub fn watch_view(&self) -> watch::Receiver<LifecycleView> {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait until the shell stops on its own (logged out or inputs closed).
    ///
    /// Cancel safe: dropping the future keeps the shell running.
    pub async fn stopped(&mut self) -> Result<(), LifecycleError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let result = task.await;
        self.task = None;
        result.map_err(|e| LifecycleError::TaskFailed {
            message: e.to_string(),
        })
    }

    /// Stop accepting inputs and wait until the shell has handled the ones
    /// already queued. Timers still pending at that point never fire.
    pub async fn close(mut self) -> Result<(), LifecycleError> {
        self.inputs = None;
        self.stopped().await
    }

    /// Cancel the shell and wait for it to stop. No hook, event or
    /// navigation happens after this returns.
    pub async fn unmount(mut self) -> Result<(), LifecycleError> {
        self.cancel.cancel();
        self.stopped().await
    }
}

impl Drop for LifecycleHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
