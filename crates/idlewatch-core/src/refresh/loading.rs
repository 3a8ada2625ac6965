use std::time::Duration;

use tokio::time::Instant;

use crate::refresh::INITIAL_LOADING_WINDOW;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceLoading {
    name: String,
    loading: bool,
}

/// Per-source loading flags folded into one global flag.
///
/// The global flag is raised only while every source is loading, so sources
/// refreshing independently do not flicker it. Right after mount any single
/// loading source raises it as well.
#[derive(Debug, Clone)]
pub struct LoadingTracker {
    mounted_at: Instant,
    window: Duration,
    sources: Vec<SourceLoading>,
}

impl LoadingTracker {
    pub fn new(mounted_at: Instant) -> Self {
        Self::with_window(mounted_at, INITIAL_LOADING_WINDOW)
    }

    pub fn with_window(mounted_at: Instant, window: Duration) -> Self {
        Self {
            mounted_at,
            window,
            sources: Vec::new(),
        }
    }

    /// Register a source and return its index.
    pub fn register(&mut self, name: impl Into<String>) -> usize {
        self.sources.push(SourceLoading {
            name: name.into(),
            loading: false,
        });
        self.sources.len() - 1
    }

    pub fn set_loading(&mut self, index: usize, loading: bool) {
        if let Some(source) = self.sources.get_mut(index) {
            source.loading = loading;
        }
    }

    pub fn set_all(&mut self, loading: bool) {
        for source in &mut self.sources {
            source.loading = loading;
        }
    }

    pub fn source_loading(&self, name: &str) -> Option<bool> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.loading)
    }

    pub fn loading_sources(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|s| s.loading)
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn is_loading(&self, now: Instant) -> bool {
        if self.sources.is_empty() {
            return false;
        }

        let all = self.sources.iter().all(|s| s.loading);
        let any = self.sources.iter().any(|s| s.loading);
        let fresh = now.saturating_duration_since(self.mounted_at) < self.window;

        all || (any && fresh)
    }
}
