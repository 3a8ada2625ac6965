//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.idlewatch/config.toml` (global user preferences)
//! 3. **Project config** - `./.idlewatch/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority, applied by the caller)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::types::{IdlewatchConfig, LogoutConfig, RouteConfig};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

/// Directory name holding idlewatch config, both under `$HOME` and the project root.
pub const CONFIG_DIR_NAME: &str = ".idlewatch";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed, or if the
/// merged configuration fails validation. Missing config files are not errors.
pub fn load_hierarchy() -> Result<IdlewatchConfig, ConfigError> {
    let user_dir = dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME));
    let project_dir = std::env::current_dir()?.join(CONFIG_DIR_NAME);
    load_hierarchy_from(user_dir.as_deref(), &project_dir)
}

/// Load configuration from explicit user and project config directories.
pub fn load_hierarchy_from(
    user_dir: Option<&Path>,
    project_dir: &Path,
) -> Result<IdlewatchConfig, ConfigError> {
    let mut config = IdlewatchConfig::default();

    if let Some(user_dir) = user_dir
        && let Some(user_config) = load_optional_config(&user_dir.join(CONFIG_FILE_NAME))?
    {
        config = merge_configs(config, user_config);
    }

    if let Some(project_config) = load_optional_config(&project_dir.join(CONFIG_FILE_NAME))? {
        config = merge_configs(config, project_config);
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a config file, treating a missing file as `None`.
fn load_optional_config(path: &Path) -> Result<Option<IdlewatchConfig>, ConfigError> {
    match load_config_file(path) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::ConfigNotFound { .. }) => {
            debug!(
                event = "core.config.file_not_found",
                path = %path.display()
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<IdlewatchConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(ConfigError::IoError { source: e }),
    };

    let config: IdlewatchConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    debug!(event = "core.config.file_loaded", path = %path.display());
    Ok(config)
}

/// Path of the user-level config file, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Merge two configurations, with override_config taking precedence.
///
/// Optional fields in the override replace base values only if present.
/// The excluded prefix list is replaced as a whole, not concatenated.
pub fn merge_configs(base: IdlewatchConfig, override_config: IdlewatchConfig) -> IdlewatchConfig {
    IdlewatchConfig {
        logout: LogoutConfig {
            inactivity_timeout_minutes: override_config
                .logout
                .inactivity_timeout_minutes
                .or(base.logout.inactivity_timeout_minutes),
            warning_time_minutes: override_config
                .logout
                .warning_time_minutes
                .or(base.logout.warning_time_minutes),
            session_check_interval_secs: override_config
                .logout
                .session_check_interval_secs
                .or(base.logout.session_check_interval_secs),
            expiry_margin_secs: override_config
                .logout
                .expiry_margin_secs
                .or(base.logout.expiry_margin_secs),
        },
        routes: RouteConfig {
            login_route: override_config.routes.login_route.or(base.routes.login_route),
            excluded_prefixes: override_config
                .routes
                .excluded_prefixes
                .or(base.routes.excluded_prefixes),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_hierarchy_from(
            Some(&temp.path().join("user")),
            &temp.path().join("project"),
        )
        .unwrap();
        assert_eq!(config, IdlewatchConfig::default());
    }

    #[test]
    fn test_project_overrides_user() {
        let temp = TempDir::new().unwrap();
        let user_dir = temp.path().join("user");
        let project_dir = temp.path().join("project");

        write_config(
            &user_dir,
            r#"
[logout]
inactivity_timeout_minutes = 60
warning_time_minutes = 10

[routes]
login_route = "/signin"
excluded_prefixes = ["/signin", "/auth"]
"#,
        );
        write_config(
            &project_dir,
            r#"
[logout]
warning_time_minutes = 2
"#,
        );

        let config = load_hierarchy_from(Some(&user_dir), &project_dir).unwrap();
        assert_eq!(config.logout.inactivity_timeout_minutes(), 60);
        assert_eq!(config.logout.warning_time_minutes(), 2);
        assert_eq!(config.routes.login_route(), "/signin");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("project");
        write_config(&project_dir, "[logout\ninactivity_timeout_minutes = ");

        let result = load_hierarchy_from(None, &project_dir);
        assert!(matches!(
            result,
            Err(ConfigError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_invalid_merged_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("project");
        write_config(
            &project_dir,
            r#"
[logout]
inactivity_timeout_minutes = 5
warning_time_minutes = 5
"#,
        );

        let result = load_hierarchy_from(None, &project_dir);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_config_file(&temp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_merge_configs_keeps_base_when_override_empty() {
        let base = IdlewatchConfig {
            logout: LogoutConfig {
                expiry_margin_secs: Some(120),
                ..Default::default()
            },
            routes: RouteConfig {
                excluded_prefixes: Some(vec!["/login".to_string()]),
                ..Default::default()
            },
        };
        let merged = merge_configs(base.clone(), IdlewatchConfig::default());
        assert_eq!(merged, base);
    }

    #[test]
    fn test_merge_replaces_prefix_list() {
        let base = IdlewatchConfig {
            routes: RouteConfig {
                excluded_prefixes: Some(vec!["/login".to_string(), "/auth".to_string()]),
                ..Default::default()
            },
            ..Default::default()
        };
        let override_config = IdlewatchConfig {
            routes: RouteConfig {
                excluded_prefixes: Some(vec!["/login".to_string()]),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge_configs(base, override_config);
        assert_eq!(
            merged.routes.excluded_prefixes,
            Some(vec!["/login".to_string()])
        );
    }
}
