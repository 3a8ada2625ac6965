use crate::errors::IdlewatchError;

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Data source '{name}' failed: {message}")]
    SourceFailed { name: String, message: String },

    #[error("Data source '{name}' could not be started: {message}")]
    SourceUnavailable { name: String, message: String },

    #[error("IO operation failed: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl IdlewatchError for RefreshError {
    fn error_code(&self) -> &'static str {
        match self {
            RefreshError::SourceFailed { .. } => "DATA_SOURCE_FAILED",
            RefreshError::SourceUnavailable { .. } => "DATA_SOURCE_UNAVAILABLE",
            RefreshError::IoError { .. } => "REFRESH_IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_failed_display() {
        let error = RefreshError::SourceFailed {
            name: "stats".to_string(),
            message: "exit status 1".to_string(),
        };
        assert_eq!(error.to_string(), "Data source 'stats' failed: exit status 1");
        assert_eq!(error.error_code(), "DATA_SOURCE_FAILED");
        assert!(!error.is_user_error());
    }
}
