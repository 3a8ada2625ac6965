use crate::errors::IdlewatchError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No session available")]
    NoSession,

    #[error("Session expired at {expires_at}")]
    Expired { expires_at: i64 },

    #[error("Session refresh rejected: {message}")]
    RefreshRejected { message: String },

    #[error("Session store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Invalid session file '{path}': {message}")]
    InvalidSessionFile { path: String, message: String },

    #[error("IO operation failed: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl IdlewatchError for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NoSession => "SESSION_MISSING",
            SessionError::Expired { .. } => "SESSION_EXPIRED",
            SessionError::RefreshRejected { .. } => "SESSION_REFRESH_REJECTED",
            SessionError::Unavailable { .. } => "SESSION_STORE_UNAVAILABLE",
            SessionError::InvalidSessionFile { .. } => "INVALID_SESSION_FILE",
            SessionError::IoError { .. } => "SESSION_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            SessionError::NoSession
                | SessionError::Expired { .. }
                | SessionError::InvalidSessionFile { .. }
        )
    }
}
