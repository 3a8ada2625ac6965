use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An authentication token with its expiry.
///
/// `expires_at` is stored as Unix epoch seconds, matching what hosted auth
/// providers hand out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expires_at: i64,
}

/// Validity classification of a session at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionHealth {
    Valid,
    /// Still usable, but expires within the configured margin.
    ExpiringSoon,
    Expired,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: expires_at.timestamp(),
        }
    }

    /// Session valid for `ttl` from `now`.
    pub fn with_ttl(token: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self::new(token, now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Seconds until expiry; negative once expired.
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at.saturating_sub(now.timestamp())
    }

    pub fn health(&self, now: DateTime<Utc>, margin: Duration) -> SessionHealth {
        if self.token.is_empty() {
            return SessionHealth::Expired;
        }

        let remaining = self.seconds_until_expiry(now);
        let margin = i64::try_from(margin.as_secs()).unwrap_or(i64::MAX);

        if remaining <= 0 {
            SessionHealth::Expired
        } else if remaining < margin {
            SessionHealth::ExpiringSoon
        } else {
            SessionHealth::Valid
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.health(now, Duration::ZERO) != SessionHealth::Expired
    }
}

impl std::fmt::Display for SessionHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionHealth::Valid => write!(f, "valid"),
            SessionHealth::ExpiringSoon => write!(f, "expiring_soon"),
            SessionHealth::Expired => write!(f, "expired"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGIN: Duration = Duration::from_secs(300);

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_health_valid() {
        let session = Session::new("tok", at(10_000));
        assert_eq!(session.health(at(1_000), MARGIN), SessionHealth::Valid);
    }

    #[test]
    fn test_health_expiring_soon_inside_margin() {
        let session = Session::new("tok", at(10_000));
        // 299 seconds left
        assert_eq!(
            session.health(at(9_701), MARGIN),
            SessionHealth::ExpiringSoon
        );
        // exactly 300 seconds left is still valid
        assert_eq!(session.health(at(9_700), MARGIN), SessionHealth::Valid);
    }

    #[test]
    fn test_health_expired() {
        let session = Session::new("tok", at(10_000));
        assert_eq!(session.health(at(10_000), MARGIN), SessionHealth::Expired);
        assert_eq!(session.health(at(20_000), MARGIN), SessionHealth::Expired);
        assert!(!session.is_valid(at(10_001)));
    }

    #[test]
    fn test_empty_token_is_expired() {
        let session = Session::new("", at(10_000));
        assert_eq!(session.health(at(0), MARGIN), SessionHealth::Expired);
    }

    #[test]
    fn test_with_ttl() {
        let now = at(1_000);
        let session = Session::with_ttl("tok", now, Duration::from_secs(3600));
        assert_eq!(session.expires_at, 4_600);
        assert_eq!(session.seconds_until_expiry(now), 3_600);
        assert_eq!(session.expires_at(), Some(at(4_600)));
    }

    #[test]
    fn test_session_json_format() {
        let session = Session::new("abc", at(1_700_000_000));
        let json = serde_json::to_string(&session).unwrap();
        assert_eq!(json, r#"{"token":"abc","expires_at":1700000000}"#);
    }

    #[test]
    fn test_health_display() {
        assert_eq!(SessionHealth::ExpiringSoon.to_string(), "expiring_soon");
    }
}
