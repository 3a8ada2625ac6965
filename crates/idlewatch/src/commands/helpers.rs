use tracing::warn;

use idlewatch_core::config::IdlewatchConfig;

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
pub fn load_config_with_warning() -> IdlewatchConfig {
    match IdlewatchConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.idlewatch/config.toml and ./.idlewatch/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            IdlewatchConfig::default()
        }
    }
}

/// Whole minutes to a `Duration`, saturating instead of overflowing.
pub fn minutes(value: u64) -> std::time::Duration {
    std::time::Duration::from_secs(value.saturating_mul(60))
}
