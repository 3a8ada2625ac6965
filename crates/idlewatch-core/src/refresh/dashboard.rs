use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::refresh::errors::RefreshError;
use crate::refresh::loading::LoadingTracker;
use crate::refresh::{DASHBOARD_STALE_THRESHOLD, REFRESH_DEBOUNCE};
use crate::timer::TimerSlot;

/// A dashboard data source (stats, recent records, chart series).
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn refetch(&self) -> Result<(), RefreshError>;
}

/// Result of one coordinated refetch.
#[derive(Debug, Default)]
pub struct RefetchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, RefreshError)>,
}

impl RefetchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One source of a running refetch that has finished.
#[derive(Debug)]
pub struct SourceCompletion {
    index: usize,
    result: Result<(), RefreshError>,
}

type SourceFuture = BoxFuture<'static, SourceCompletion>;

/// Debounced, concurrent refetching of every registered data source.
///
/// Each request re-arms a single debounce deadline, so a burst of requests
/// collapses into one refetch that runs after the burst has been quiet for
/// the debounce delay.
///
/// A refetch does not block its owner: [`start_refetch`](Self::start_refetch)
/// only launches the source futures, which are then driven through
/// [`next_completion`](Self::next_completion). Each source clears its own
/// loading flag when it finishes.
pub struct DashboardRefresher {
    sources: Vec<Arc<dyn DataSource>>,
    debounce: TimerSlot,
    debounce_delay: Duration,
    stale_after: Duration,
    last_refresh: Instant,
    loading: LoadingTracker,
    in_flight: FuturesUnordered<SourceFuture>,
    round: RefetchReport,
}

impl DashboardRefresher {
    pub fn new(sources: Vec<Arc<dyn DataSource>>, mounted_at: Instant) -> Self {
        let mut loading = LoadingTracker::new(mounted_at);
        for source in &sources {
            loading.register(source.name());
        }

        Self {
            sources,
            debounce: TimerSlot::new(),
            debounce_delay: REFRESH_DEBOUNCE,
            stale_after: DASHBOARD_STALE_THRESHOLD,
            last_refresh: mounted_at,
            loading,
            in_flight: FuturesUnordered::new(),
            round: RefetchReport::default(),
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Ask for a refetch; collapses with any request still pending.
    pub fn request(&mut self, now: Instant) {
        if self.debounce.is_armed() {
            debug!(event = "core.refresh.dashboard_request_collapsed");
        }
        self.debounce.arm_after(now, self.debounce_delay);
    }

    /// More than the stale threshold has passed since the last successful refresh.
    pub fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_refresh) > self.stale_after
    }

    /// True once the debounce deadline passed; disarms it.
    pub fn take_due(&mut self, now: Instant) -> bool {
        self.debounce.fire_if_due(now)
    }

    /// Drop the pending request and abandon a running refetch.
    pub fn cancel(&mut self) {
        self.debounce.cancel();
        if self.is_refetching() {
            debug!(
                event = "core.refresh.dashboard_refetch_abandoned",
                pending = self.in_flight.len()
            );
            self.in_flight = FuturesUnordered::new();
            self.round = RefetchReport::default();
            self.loading.set_all(false);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn last_refresh(&self) -> Instant {
        self.last_refresh
    }

    pub fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    pub fn is_loading(&self, now: Instant) -> bool {
        self.loading.is_loading(now)
    }

    pub fn is_refetching(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Launch a refetch of every source and raise their loading flags.
    ///
    /// Returns false when there is nothing to fetch or a refetch is already
    /// running; the running one absorbs the request.
    pub fn start_refetch(&mut self) -> bool {
        if self.sources.is_empty() {
            return false;
        }
        if self.is_refetching() {
            debug!(
                event = "core.refresh.dashboard_refetch_collapsed",
                pending = self.in_flight.len()
            );
            return false;
        }

        self.round = RefetchReport::default();
        for (index, source) in self.sources.iter().enumerate() {
            self.loading.set_loading(index, true);
            let source = Arc::clone(source);
            self.in_flight.push(
                async move {
                    let result = source.refetch().await;
                    SourceCompletion { index, result }
                }
                .boxed(),
            );
        }

        info!(
            event = "core.refresh.dashboard_refetch_started",
            sources = self.sources.len()
        );
        true
    }

    /// Wait for the next source of the running refetch to finish.
    ///
    /// Returns `None` right away when nothing is running. Cancel safe.
    pub async fn next_completion(&mut self) -> Option<SourceCompletion> {
        self.in_flight.next().await
    }

    /// Record a finished source and lower its loading flag.
    ///
    /// Returns the report once the last source of the refetch finished. The
    /// last-refresh instant advances only when every source succeeded.
    pub fn finish_source(
        &mut self,
        completion: SourceCompletion,
        now: Instant,
    ) -> Option<RefetchReport> {
        let SourceCompletion { index, result } = completion;
        self.loading.set_loading(index, false);

        let name = self
            .sources
            .get(index)
            .map(|s| s.name().to_string())
            .unwrap_or_default();
        match result {
            Ok(()) => {
                debug!(event = "core.refresh.dashboard_source_completed", source_name = %name);
                self.round.succeeded.push(name);
            }
            Err(e) => {
                warn!(
                    event = "core.refresh.dashboard_source_failed",
                    source_name = %name,
                    error = %e
                );
                self.round.failed.push((name, e));
            }
        }

        if self.is_refetching() {
            return None;
        }

        let report = std::mem::take(&mut self.round);
        if report.is_success() {
            self.last_refresh = now;
            info!(
                event = "core.refresh.dashboard_refetch_completed",
                sources = report.succeeded.len()
            );
        }
        Some(report)
    }

    /// Refetch all sources and wait for every one of them.
    pub async fn refetch_all(&mut self) -> RefetchReport {
        self.start_refetch();
        while let Some(completion) = self.next_completion().await {
            if let Some(report) = self.finish_source(completion, Instant::now()) {
                return report;
            }
        }
        RefetchReport::default()
    }
}
