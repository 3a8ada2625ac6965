//! JSON file-backed session store.
//!
//! The session file holds `{"token": "...", "expires_at": <epoch seconds>}`
//! and is written atomically (temp file + rename). An external login process
//! owns the file: refreshing re-reads it and succeeds only when it now holds
//! an unexpired session, and signing out removes it.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::session::errors::SessionError;
use crate::session::store::SessionStore;
use crate::session::types::Session;

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get_session(&self) -> Result<Option<Session>, SessionError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => parse_session(&self.path, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::IoError { source: e }),
        }
    }

    async fn refresh_session(&self) -> Result<(), SessionError> {
        let session = self.get_session().await?.ok_or(SessionError::NoSession)?;

        if !session.is_valid(Utc::now()) {
            return Err(SessionError::RefreshRejected {
                message: format!(
                    "session file '{}' holds a token that expired at {}",
                    self.path.display(),
                    session.expires_at
                ),
            });
        }

        debug!(
            event = "core.session.file_refreshed",
            path = %self.path.display(),
            expires_at = session.expires_at
        );
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(event = "core.session.file_removed", path = %self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::IoError { source: e }),
        }
    }
}

fn parse_session(path: &Path, content: &str) -> Result<Session, SessionError> {
    serde_json::from_str(content).map_err(|e| SessionError::InvalidSessionFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Read a session file. A missing file yields `Ok(None)`.
pub fn load_session_file(path: &Path) -> Result<Option<Session>, SessionError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_session(path, &content).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SessionError::IoError { source: e }),
    }
}

/// Remove a session file. Returns false when there was nothing to remove.
pub fn remove_session_file(path: &Path) -> Result<bool, SessionError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(event = "core.session.file_removed", path = %path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SessionError::IoError { source: e }),
    }
}

fn cleanup_temp_file(temp_file: &Path, original_error: &std::io::Error) {
    if let Err(cleanup_err) = fs::remove_file(temp_file) {
        warn!(
            event = "core.session.temp_file_cleanup_failed",
            temp_file = %temp_file.display(),
            original_error = %original_error,
            cleanup_error = %cleanup_err,
        );
    }
}

/// Write a session file atomically, creating parent directories as needed.
pub fn save_session_file(path: &Path, session: &Session) -> Result<(), SessionError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(session).map_err(|e| SessionError::IoError {
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    let temp_file = path.with_extension("json.tmp");

    if let Err(e) = fs::write(&temp_file, &json) {
        cleanup_temp_file(&temp_file, &e);
        return Err(SessionError::IoError { source: e });
    }

    if let Err(e) = fs::rename(&temp_file, path) {
        cleanup_temp_file(&temp_file, &e);
        return Err(SessionError::IoError { source: e });
    }

    info!(
        event = "core.session.file_written",
        path = %path.display(),
        expires_at = session.expires_at
    );
    Ok(())
}
