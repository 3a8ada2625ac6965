//! Default values and accessors for configuration types.

use std::time::Duration;

use crate::config::types::{IdlewatchConfig, LogoutConfig, RouteConfig};

pub const DEFAULT_INACTIVITY_TIMEOUT_MINUTES: u64 = 30;
pub const DEFAULT_WARNING_TIME_MINUTES: u64 = 5;
pub const DEFAULT_SESSION_CHECK_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_EXPIRY_MARGIN_SECS: u64 = 5 * 60;
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 2] = ["/login", "/auth"];

/// Upper bounds accepted by validation.
pub const MAX_INACTIVITY_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;
pub const MAX_SESSION_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;
pub const MAX_EXPIRY_MARGIN_SECS: u64 = 24 * 60 * 60;

impl LogoutConfig {
    /// Returns the inactivity timeout in minutes, defaulting to 30.
    pub fn inactivity_timeout_minutes(&self) -> u64 {
        self.inactivity_timeout_minutes
            .unwrap_or(DEFAULT_INACTIVITY_TIMEOUT_MINUTES)
    }

    /// Returns the warning time in minutes, defaulting to 5.
    pub fn warning_time_minutes(&self) -> u64 {
        self.warning_time_minutes
            .unwrap_or(DEFAULT_WARNING_TIME_MINUTES)
    }

    /// Returns the session check interval in seconds, defaulting to 300.
    pub fn session_check_interval_secs(&self) -> u64 {
        self.session_check_interval_secs
            .unwrap_or(DEFAULT_SESSION_CHECK_INTERVAL_SECS)
    }

    /// Returns the expiry margin in seconds, defaulting to 300.
    pub fn expiry_margin_secs(&self) -> u64 {
        self.expiry_margin_secs.unwrap_or(DEFAULT_EXPIRY_MARGIN_SECS)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_minutes().saturating_mul(60))
    }

    pub fn warning_time(&self) -> Duration {
        Duration::from_secs(self.warning_time_minutes().saturating_mul(60))
    }

    pub fn session_check_interval(&self) -> Duration {
        Duration::from_secs(self.session_check_interval_secs())
    }

    pub fn expiry_margin(&self) -> Duration {
        Duration::from_secs(self.expiry_margin_secs())
    }
}

impl RouteConfig {
    /// Returns the login route, defaulting to `/login`.
    pub fn login_route(&self) -> &str {
        self.login_route.as_deref().unwrap_or(DEFAULT_LOGIN_ROUTE)
    }

    /// Returns the excluded route prefixes, defaulting to `/login` and `/auth`.
    pub fn excluded_prefixes(&self) -> Vec<String> {
        match &self.excluded_prefixes {
            Some(prefixes) => prefixes.clone(),
            None => DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl IdlewatchConfig {
    /// Copy with every field filled in, for display of the effective values.
    pub fn resolved(&self) -> IdlewatchConfig {
        IdlewatchConfig {
            logout: LogoutConfig {
                inactivity_timeout_minutes: Some(self.logout.inactivity_timeout_minutes()),
                warning_time_minutes: Some(self.logout.warning_time_minutes()),
                session_check_interval_secs: Some(self.logout.session_check_interval_secs()),
                expiry_margin_secs: Some(self.logout.expiry_margin_secs()),
            },
            routes: RouteConfig {
                login_route: Some(self.routes.login_route().to_string()),
                excluded_prefixes: Some(self.routes.excluded_prefixes()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::types::IdlewatchConfig;

    #[test]
    fn test_logout_config_defaults() {
        let config = IdlewatchConfig::default();
        assert_eq!(config.logout.inactivity_timeout_minutes(), 30);
        assert_eq!(config.logout.warning_time_minutes(), 5);
        assert_eq!(config.logout.session_check_interval_secs(), 300);
        assert_eq!(config.logout.expiry_margin_secs(), 300);
        assert_eq!(config.logout.inactivity_timeout().as_secs(), 30 * 60);
        assert_eq!(config.logout.warning_time().as_secs(), 5 * 60);
    }

    #[test]
    fn test_route_config_defaults() {
        let config = IdlewatchConfig::default();
        assert_eq!(config.routes.login_route(), "/login");
        assert_eq!(
            config.routes.excluded_prefixes(),
            vec!["/login".to_string(), "/auth".to_string()]
        );
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let toml_str = r#"
[logout]
inactivity_timeout_minutes = 10
warning_time_minutes = 1

[routes]
login_route = "/signin"
excluded_prefixes = ["/signin"]
"#;
        let config: IdlewatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logout.inactivity_timeout_minutes(), 10);
        assert_eq!(config.logout.warning_time_minutes(), 1);
        assert_eq!(config.routes.login_route(), "/signin");
        assert_eq!(config.routes.excluded_prefixes(), vec!["/signin".to_string()]);
    }

    #[test]
    fn test_explicit_zero_preserved() {
        let toml_str = r#"
[logout]
warning_time_minutes = 0
"#;
        let config: IdlewatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.logout.warning_time_minutes(),
            0,
            "explicit zero should be preserved, not overridden to default"
        );
    }

    #[test]
    fn test_resolved_fills_every_field() {
        let mut config = IdlewatchConfig::default();
        config.logout.warning_time_minutes = Some(2);

        let resolved = config.resolved();
        assert_eq!(resolved.logout.inactivity_timeout_minutes, Some(30));
        assert_eq!(resolved.logout.warning_time_minutes, Some(2));
        assert_eq!(resolved.routes.login_route.as_deref(), Some("/login"));

        let toml_str = toml::to_string(&resolved).unwrap();
        assert!(toml_str.contains("session_check_interval_secs = 300"));
    }
}
