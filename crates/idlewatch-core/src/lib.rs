//! idlewatch-core: Session lifecycle for authenticated views
//!
//! This library implements inactivity-driven auto-logout with a warning
//! phase, session refresh when a hidden view comes back, and debounced
//! multi-source dashboard refetching. It is used by the `idlewatch` CLI.
//!
//! # Main Entry Points
//!
//! - [`lifecycle`] - Mount a view and drive it through a handle
//! - [`session`] - Session tokens and stores
//! - [`refresh`] - Refresh policies and data sources
//! - [`config`] - Configuration management

pub mod activity;
pub mod config;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod logout;
pub mod navigation;
pub mod refresh;
pub mod session;
pub mod timer;
pub mod visibility;

// Re-export commonly used types at crate root for convenience
pub use activity::{ActivityMonitor, ActivityState, InteractionKind};
pub use config::IdlewatchConfig;
pub use errors::{ConfigError, IdlewatchError, LifecycleError};
pub use lifecycle::{
    LifecycleBuilder, LifecycleConfig, LifecycleEvent, LifecycleHandle, LifecycleHooks,
    LifecycleInput, LifecycleSnapshot, LifecycleView, NoopHooks,
};
pub use logout::{AutoLogoutController, LogoutReason, LogoutState, LogoutTimeouts};
pub use navigation::{LogNavigator, Navigator, RouteGuard};
pub use refresh::{DashboardRefresher, DataSource, RefreshError, RefreshReason};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionError, SessionHealth, SessionStore,
};
pub use visibility::{VisibilityMonitor, VisibilitySignal, VisibilityState};

// Re-export logging initialization
pub use logging::init_logging;
