//! Configuration validation.

use crate::config::defaults::{
    MAX_EXPIRY_MARGIN_SECS, MAX_INACTIVITY_TIMEOUT_MINUTES, MAX_SESSION_CHECK_INTERVAL_SECS,
};
use crate::config::types::IdlewatchConfig;
use crate::errors::ConfigError;
use crate::navigation::RouteGuard;

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidConfiguration`] describing the first problem found.
pub fn validate_config(config: &IdlewatchConfig) -> Result<(), ConfigError> {
    let logout = &config.logout;

    if logout.inactivity_timeout_minutes() == 0 {
        return Err(invalid("inactivity_timeout_minutes must be greater than 0"));
    }

    if logout.inactivity_timeout_minutes() > MAX_INACTIVITY_TIMEOUT_MINUTES {
        return Err(invalid(&format!(
            "inactivity_timeout_minutes ({}) must be at most {}",
            logout.inactivity_timeout_minutes(),
            MAX_INACTIVITY_TIMEOUT_MINUTES
        )));
    }

    if logout.warning_time_minutes() >= logout.inactivity_timeout_minutes() {
        return Err(invalid(&format!(
            "warning_time_minutes ({}) must be less than inactivity_timeout_minutes ({})",
            logout.warning_time_minutes(),
            logout.inactivity_timeout_minutes()
        )));
    }

    if logout.session_check_interval_secs() == 0 {
        return Err(invalid("session_check_interval_secs must be greater than 0"));
    }

    if logout.session_check_interval_secs() > MAX_SESSION_CHECK_INTERVAL_SECS {
        return Err(invalid(&format!(
            "session_check_interval_secs ({}) must be at most {}",
            logout.session_check_interval_secs(),
            MAX_SESSION_CHECK_INTERVAL_SECS
        )));
    }

    if logout.expiry_margin_secs() > MAX_EXPIRY_MARGIN_SECS {
        return Err(invalid(&format!(
            "expiry_margin_secs ({}) must be at most {}",
            logout.expiry_margin_secs(),
            MAX_EXPIRY_MARGIN_SECS
        )));
    }

    let login_route = config.routes.login_route();
    if !login_route.starts_with('/') {
        return Err(invalid(&format!(
            "login_route '{}' must start with '/'",
            login_route
        )));
    }

    let prefixes = config.routes.excluded_prefixes();
    if let Some(bad) = prefixes.iter().find(|p| !p.starts_with('/')) {
        return Err(invalid(&format!(
            "excluded prefix '{}' must start with '/'",
            bad
        )));
    }

    if !RouteGuard::new(prefixes).is_excluded(login_route) {
        return Err(invalid(&format!(
            "login_route '{}' must be covered by excluded_prefixes",
            login_route
        )));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{LogoutConfig, RouteConfig};

    fn with_logout(logout: LogoutConfig) -> IdlewatchConfig {
        IdlewatchConfig {
            logout,
            ..Default::default()
        }
    }

    fn with_routes(routes: RouteConfig) -> IdlewatchConfig {
        IdlewatchConfig {
            routes,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&IdlewatchConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_inactivity_rejected() {
        let config = with_logout(LogoutConfig {
            inactivity_timeout_minutes: Some(0),
            warning_time_minutes: Some(0),
            ..Default::default()
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_warning_must_be_shorter_than_inactivity() {
        let config = with_logout(LogoutConfig {
            inactivity_timeout_minutes: Some(5),
            warning_time_minutes: Some(6),
            ..Default::default()
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("warning_time_minutes (6)"));
    }

    #[test]
    fn test_zero_warning_allowed() {
        let config = with_logout(LogoutConfig {
            warning_time_minutes: Some(0),
            ..Default::default()
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_check_interval_rejected() {
        let config = with_logout(LogoutConfig {
            session_check_interval_secs: Some(0),
            ..Default::default()
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_oversized_inactivity_rejected() {
        let config = with_logout(LogoutConfig {
            inactivity_timeout_minutes: Some(1_000_000_000_000_000),
            ..Default::default()
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("must be at most 10080"));
        // The accessor saturates instead of overflowing
        assert_eq!(config.logout.inactivity_timeout().as_secs(), u64::MAX);
    }

    #[test]
    fn test_week_long_inactivity_allowed() {
        let config = with_logout(LogoutConfig {
            inactivity_timeout_minutes: Some(MAX_INACTIVITY_TIMEOUT_MINUTES),
            ..Default::default()
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_oversized_check_interval_rejected() {
        let config = with_logout(LogoutConfig {
            session_check_interval_secs: Some(u64::MAX),
            ..Default::default()
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("session_check_interval_secs"));
    }

    #[test]
    fn test_relative_prefix_rejected() {
        let config = with_routes(RouteConfig {
            excluded_prefixes: Some(vec!["/login".to_string(), "auth".to_string()]),
            ..Default::default()
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("'auth'"));
    }

    #[test]
    fn test_login_route_must_be_excluded() {
        let config = with_routes(RouteConfig {
            login_route: Some("/signin".to_string()),
            ..Default::default()
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("covered by excluded_prefixes"));
    }
}
