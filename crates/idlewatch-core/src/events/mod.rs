//! Application-level log events shared by the CLI and embedding applications.

use tracing::{error, info, warn};

use crate::errors::IdlewatchError;

pub fn log_app_startup(component: &str) {
    info!(
        event = "core.app.startup_completed",
        component = component,
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_shutdown(component: &str) {
    info!(event = "core.app.shutdown_started", component = component);
}

/// Log an error, downgrading user errors (bad config, bad input) to warnings.
pub fn log_app_error(error: &dyn IdlewatchError) {
    if error.is_user_error() {
        warn!(
            event = "core.app.user_error",
            error = %error,
            error_code = error.error_code()
        );
    } else {
        error!(
            event = "core.app.error_occurred",
            error = %error,
            error_code = error.error_code()
        );
    }
}
