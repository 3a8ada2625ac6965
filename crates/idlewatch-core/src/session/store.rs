use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::session::errors::SessionError;
use crate::session::types::Session;

/// Holder of the authentication token.
///
/// The lifecycle shell treats the store as a shared external resource: it
/// never caches the session and issues every call through this trait.
///
/// # Semantics
///
/// - `get_session` errors are treated by callers as "no session".
/// - `refresh_session` succeeds when `Ok(())` is returned.
/// - `sign_out` is best effort; callers log and ignore failures.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>, SessionError>;

    async fn refresh_session(&self) -> Result<(), SessionError>;

    async fn sign_out(&self) -> Result<(), SessionError>;
}

/// In-process session store.
///
/// Refreshing a present, unexpired session extends it by `refresh_ttl`
/// from the current time.
#[derive(Debug)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
    refresh_ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(session: Option<Session>, refresh_ttl: Duration) -> Self {
        Self {
            session: Mutex::new(session),
            refresh_ttl,
        }
    }

    /// Store holding a fresh session valid for `ttl`, refreshable by the same amount.
    pub fn with_token(token: impl Into<String>, ttl: Duration) -> Self {
        Self::new(Some(Session::with_ttl(token, Utc::now(), ttl)), ttl)
    }

    pub fn replace(&self, session: Option<Session>) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        *guard = session;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Session>>, SessionError> {
        self.session.lock().map_err(|_| SessionError::Unavailable {
            message: "session lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.lock()?.clone())
    }

    async fn refresh_session(&self) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        let now = Utc::now();

        let current = guard.as_ref().ok_or(SessionError::NoSession)?;
        if !current.is_valid(now) {
            return Err(SessionError::Expired {
                expires_at: current.expires_at,
            });
        }

        let refreshed = Session::with_ttl(current.token.clone(), now, self.refresh_ttl);
        debug!(
            event = "core.session.memory_refreshed",
            expires_at = refreshed.expires_at
        );
        *guard = Some(refreshed);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::with_token("tok", Duration::from_secs(3600));
        let session = store.get_session().await.unwrap().unwrap();
        assert_eq!(session.token, "tok");
        assert!(session.is_valid(Utc::now()));
    }

    #[tokio::test]
    async fn test_refresh_extends_expiry() {
        let soon = Session::with_ttl("tok", Utc::now(), Duration::from_secs(10));
        let store = MemorySessionStore::new(Some(soon.clone()), Duration::from_secs(3600));

        store.refresh_session().await.unwrap();

        let refreshed = store.get_session().await.unwrap().unwrap();
        assert_eq!(refreshed.token, "tok");
        assert!(refreshed.expires_at > soon.expires_at);
    }

    #[tokio::test]
    async fn test_refresh_without_session_fails() {
        let store = MemorySessionStore::new(None, Duration::from_secs(60));
        let result = store.refresh_session().await;
        assert!(matches!(result, Err(SessionError::NoSession)));
    }

    #[tokio::test]
    async fn test_refresh_of_expired_session_fails() {
        let expired = Session::new("tok", DateTime::from_timestamp(1_000, 0).unwrap());
        let store = MemorySessionStore::new(Some(expired), Duration::from_secs(60));
        let result = store.refresh_session().await;
        assert!(matches!(result, Err(SessionError::Expired { .. })));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let store = MemorySessionStore::with_token("tok", Duration::from_secs(3600));
        store.sign_out().await.unwrap();
        assert!(store.get_session().await.unwrap().is_none());
        // Second sign-out is harmless
        store.sign_out().await.unwrap();
    }
}
