//! # Configuration System
//!
//! Hierarchical TOML configuration for idlewatch.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.idlewatch/config.toml` (global user preferences)
//! 3. **Project config** - `./.idlewatch/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use idlewatch_core::config::IdlewatchConfig;
//!
//! fn example() -> Result<(), idlewatch_core::errors::ConfigError> {
//!     let config = IdlewatchConfig::load_hierarchy()?;
//!     let timeout = config.logout.inactivity_timeout();
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{IdlewatchConfig, LogoutConfig, RouteConfig};
pub use validation::validate_config;

impl IdlewatchConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
