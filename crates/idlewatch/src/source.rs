//! Data sources backed by shell commands.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use idlewatch_core::refresh::{DataSource, RefreshError};

/// A dashboard data source whose refetch runs `sh -c COMMAND`.
///
/// Exit status zero counts as a successful refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSource {
    name: String,
    command: String,
}

impl CommandSource {
    /// Parse a `NAME=COMMAND` argument.
    pub fn parse(arg: &str) -> Result<Self, String> {
        let (name, command) = arg
            .split_once('=')
            .ok_or_else(|| format!("source '{}' must look like NAME=COMMAND", arg))?;
        let name = name.trim();
        let command = command.trim();

        if name.is_empty() {
            return Err(format!("source '{}' has an empty name", arg));
        }
        if command.is_empty() {
            return Err(format!("source '{}' has an empty command", name));
        }

        Ok(Self {
            name: name.to_string(),
            command: command.to_string(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl DataSource for CommandSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn refetch(&self) -> Result<(), RefreshError> {
        debug!(event = "cli.source.refetch_started", source = %self.name);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RefreshError::SourceUnavailable {
                name: self.name.clone(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            debug!(event = "cli.source.refetch_completed", source = %self.name);
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("command exited with {}", output.status),
            detail => format!("command exited with {}: {}", output.status, detail),
        };
        Err(RefreshError::SourceFailed {
            name: self.name.clone(),
            message,
        })
    }
}
