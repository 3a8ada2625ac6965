//! Configuration type definitions.
//!
//! These types are deserialized from TOML config files. Every field is
//! optional so that a project config can override a single value of the
//! user config; accessors in [`super::defaults`] supply the built-in values.
//!
//! # Example Configuration
//!
//! ```toml
//! [logout]
//! inactivity_timeout_minutes = 30
//! warning_time_minutes = 5
//! session_check_interval_secs = 300
//! expiry_margin_secs = 300
//!
//! [routes]
//! login_route = "/login"
//! excluded_prefixes = ["/login", "/auth"]
//! ```

use serde::{Deserialize, Serialize};

/// Main configuration loaded from TOML config files.
///
/// Loaded from:
/// 1. User config: `~/.idlewatch/config.toml`
/// 2. Project config: `./.idlewatch/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IdlewatchConfig {
    /// Inactivity and session-validity settings
    #[serde(default)]
    pub logout: LogoutConfig,

    /// Route handling
    #[serde(default)]
    pub routes: RouteConfig,
}

/// Auto-logout configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LogoutConfig {
    /// Minutes without activity before the session is terminated.
    /// Default: 30.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout_minutes: Option<u64>,

    /// Minutes before logout at which the warning is raised.
    /// Default: 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_time_minutes: Option<u64>,

    /// Seconds between periodic session validity checks.
    /// Default: 300.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_check_interval_secs: Option<u64>,

    /// A session expiring within this many seconds counts as invalid.
    /// Default: 300.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_margin_secs: Option<u64>,
}

/// Route configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RouteConfig {
    /// Route to navigate to after logout.
    /// Default: `/login`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_route: Option<String>,

    /// Path prefixes on which no inactivity tracking happens.
    /// Default: `["/login", "/auth"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_prefixes: Option<Vec<String>>,
}
