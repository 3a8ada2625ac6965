//! Route exclusion and navigation.

use tracing::info;

/// Receives navigation requests from the lifecycle shell.
///
/// Navigation is fire-and-forget: implementations must not block and have
/// no way to report failure back to the shell.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// Navigator that only records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate_to(&self, path: &str) {
        info!(event = "core.navigation.requested", path = path);
    }
}

/// Decides which routes disable inactivity tracking.
///
/// A path is excluded when it equals a prefix or continues it with a new
/// segment (`/login/callback`), query (`/login?next=/`) or fragment.
/// `/loginx` is not excluded by `/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    excluded_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new(excluded_prefixes: Vec<String>) -> Self {
        Self { excluded_prefixes }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            if prefix.is_empty() {
                // "/" excludes everything
                return true;
            }
            match path.strip_prefix(prefix) {
                Some(rest) => {
                    rest.is_empty()
                        || rest.starts_with('/')
                        || rest.starts_with('?')
                        || rest.starts_with('#')
                }
                None => false,
            }
        })
    }

    pub fn excluded_prefixes(&self) -> &[String] {
        &self.excluded_prefixes
    }
}
