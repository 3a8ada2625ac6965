use std::error::Error;

/// Base trait for all idlewatch errors
pub trait IdlewatchError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the library
pub type IdlewatchResult<T> = Result<T, Box<dyn IdlewatchError>>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found at '{path}'")]
    ConfigNotFound { path: String },

    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Could not determine home directory")]
    HomeDirectoryNotFound,

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl IdlewatchError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ConfigError::HomeDirectoryNotFound => "HOME_DIRECTORY_NOT_FOUND",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::ConfigParseError { .. } | ConfigError::InvalidConfiguration { .. }
        )
    }
}

/// Errors raised by the lifecycle handle when talking to a mounted shell.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Lifecycle shell is no longer running")]
    ShellStopped,

    #[error("Lifecycle shell task failed: {message}")]
    TaskFailed { message: String },
}

impl IdlewatchError for LifecycleError {
    fn error_code(&self) -> &'static str {
        match self {
            LifecycleError::ShellStopped => "LIFECYCLE_SHELL_STOPPED",
            LifecycleError::TaskFailed { .. } => "LIFECYCLE_TASK_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_user_error() {
        let mut config = crate::config::IdlewatchConfig::default();
        config.logout.warning_time_minutes = Some(45);

        let error = config.validate().unwrap_err();
        assert_eq!(error.error_code(), "INVALID_CONFIGURATION");
        assert!(error.is_user_error());
        assert!(
            error
                .to_string()
                .starts_with("Invalid configuration: warning_time_minutes (45)")
        );
    }

    #[test]
    fn test_config_parse_error() {
        let error = ConfigError::ConfigParseError {
            path: "/tmp/config.toml".to_string(),
            message: "invalid TOML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse config file '/tmp/config.toml': invalid TOML syntax"
        );
        assert_eq!(error.error_code(), "CONFIG_PARSE_ERROR");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_io_error_is_not_user_error() {
        let error = ConfigError::from(std::io::Error::other("disk gone"));
        assert_eq!(error.error_code(), "CONFIG_IO_ERROR");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_lifecycle_error_codes() {
        assert_eq!(
            LifecycleError::ShellStopped.error_code(),
            "LIFECYCLE_SHELL_STOPPED"
        );
        assert!(!LifecycleError::ShellStopped.is_user_error());
    }
}
