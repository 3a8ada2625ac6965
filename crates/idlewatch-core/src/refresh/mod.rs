//! Session refresh on return and debounced dashboard refetching.

use std::time::Duration;

pub mod dashboard;
pub mod errors;
pub mod loading;
pub mod session_refresh;

pub use dashboard::{DashboardRefresher, DataSource, RefetchReport, SourceCompletion};
pub use errors::RefreshError;
pub use loading::LoadingTracker;
pub use session_refresh::{RefreshOutcome, RefreshReason, SessionRefreshPolicy};

/// Hidden for at least this long forces a session refresh on return.
pub const HIDDEN_REFRESH_THRESHOLD: Duration = Duration::from_millis(300_000);

/// Dashboard data older than this is refetched when the view returns.
pub const DASHBOARD_STALE_THRESHOLD: Duration = Duration::from_millis(60_000);

pub const REFRESH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Any single loading source raises the global flag this long after mount.
pub const INITIAL_LOADING_WINDOW: Duration = Duration::from_millis(5_000);
