use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::refresh::HIDDEN_REFRESH_THRESHOLD;
use crate::session::{SessionError, SessionHealth, SessionStore};
use crate::timer::millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    LongAbsence,
    SessionMissing,
    SessionExpiring,
    SessionCheckFailed,
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefreshReason::LongAbsence => "long_absence",
            RefreshReason::SessionMissing => "session_missing",
            RefreshReason::SessionExpiring => "session_expiring",
            RefreshReason::SessionCheckFailed => "session_check_failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    NotNeeded,
    Refreshed(RefreshReason),
    Failed {
        reason: RefreshReason,
        error: SessionError,
    },
}

/// Decides whether the session must be refreshed when the view returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRefreshPolicy {
    hidden_threshold: Duration,
    expiry_margin: Duration,
}

impl SessionRefreshPolicy {
    pub fn new(expiry_margin: Duration) -> Self {
        Self {
            hidden_threshold: HIDDEN_REFRESH_THRESHOLD,
            expiry_margin,
        }
    }

    pub fn expiry_margin(&self) -> Duration {
        self.expiry_margin
    }

    /// A long absence forces a refresh without asking the store first.
    pub fn on_return(&self, hidden_for: Duration) -> Option<RefreshReason> {
        (hidden_for >= self.hidden_threshold).then_some(RefreshReason::LongAbsence)
    }

    /// Classify the result of a session query.
    pub fn after_check(
        &self,
        checked: &Result<Option<SessionHealth>, SessionError>,
    ) -> Option<RefreshReason> {
        match checked {
            Err(_) => Some(RefreshReason::SessionCheckFailed),
            Ok(None) => Some(RefreshReason::SessionMissing),
            Ok(Some(SessionHealth::Valid)) => None,
            Ok(Some(SessionHealth::ExpiringSoon | SessionHealth::Expired)) => {
                Some(RefreshReason::SessionExpiring)
            }
        }
    }

    /// Run the full return-from-hidden policy against a store.
    ///
    /// Errors never escape: a failed query or refresh is reported through
    /// the outcome.
    pub async fn evaluate(&self, store: &dyn SessionStore, hidden_for: Duration) -> RefreshOutcome {
        let reason = match self.on_return(hidden_for) {
            Some(reason) => reason,
            None => {
                let margin = self.expiry_margin;
                let checked = store
                    .get_session()
                    .await
                    .map(|session| session.map(|s| s.health(Utc::now(), margin)));
                if let Err(e) = &checked {
                    warn!(event = "core.refresh.session_check_failed", error = %e);
                }
                match self.after_check(&checked) {
                    Some(reason) => reason,
                    None => {
                        debug!(
                            event = "core.refresh.session_refresh_skipped",
                            hidden_ms = millis(hidden_for)
                        );
                        return RefreshOutcome::NotNeeded;
                    }
                }
            }
        };

        match store.refresh_session().await {
            Ok(()) => {
                info!(event = "core.refresh.session_refreshed", reason = %reason);
                RefreshOutcome::Refreshed(reason)
            }
            Err(error) => {
                warn!(
                    event = "core.refresh.session_refresh_failed",
                    reason = %reason,
                    error = %error
                );
                RefreshOutcome::Failed { reason, error }
            }
        }
    }
}

impl Default for SessionRefreshPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }
}
