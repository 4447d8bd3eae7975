use std::path::PathBuf;
use thiserror::Error;

use crate::infrastructure::filesystem::config_store::ConfigStoreError;
use crate::infrastructure::process::CommandExecutorError;
use crate::infrastructure::remote::RemoteError;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Revision resolution failed: {message}")]
    Resolution {
        message: String,
        host: Option<String>,
        command: Option<String>,
    },

    #[error("Fatal prompt from svn on {host}: {message}")]
    ProtocolFatal {
        host: String,
        entry: String,
        message: String,
    },

    #[error("Unsupported operation '{operation}': {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    #[error("Relay transfer to {host} failed during {step}: {message}")]
    Transfer {
        host: String,
        step: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Command execution failed: {command}")]
    CommandError {
        command: String,
        host: Option<String>,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Remote execution failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl DeployError {
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
            host: None,
            command: None,
        }
    }

    pub fn resolution_on_host(
        message: impl Into<String>,
        host: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            message: message.into(),
            host: Some(host.into()),
            command: Some(command.into()),
        }
    }

    pub fn protocol_fatal(host: impl Into<String>, entry: impl Into<String>) -> Self {
        let entry = entry.into();
        Self::ProtocolFatal {
            host: host.into(),
            message: format!(
                "subversion can't update because directory '{}' was replaced. Please add it to svn:ignore.",
                entry
            ),
            entry,
        }
    }

    pub fn unsupported_operation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn transfer_with_source(
        host: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transfer {
            host: host.into(),
            step: step.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn command_error(
        command: impl Into<String>,
        host: Option<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandError {
            command: command.into(),
            host,
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for DeployError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<CommandExecutorError> for DeployError {
    fn from(error: CommandExecutorError) -> Self {
        match error {
            CommandExecutorError::CommandFailed {
                command,
                exit_code,
                stderr,
            } => Self::command_error(command, None, Some(exit_code), stderr),
            other => Self::command_error(other.to_string(), None, None, String::new()),
        }
    }
}

impl From<ConfigStoreError> for DeployError {
    fn from(error: ConfigStoreError) -> Self {
        Self::config_error_with_source("Failed to load deployment configuration", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_fatal_names_entry() {
        let error = DeployError::protocol_fatal("web1", "uploads");
        assert!(matches!(error, DeployError::ProtocolFatal { .. }));
        assert!(error.to_string().contains("'uploads'"));
        assert!(error.to_string().contains("web1"));
    }

    #[test]
    fn test_unsupported_operation_display() {
        let error = DeployError::unsupported_operation("update", "relay mode");
        assert_eq!(
            error.to_string(),
            "Unsupported operation 'update': relay mode"
        );
    }

    #[test]
    fn test_transfer_error_names_step() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "tar exited with 2");
        let error = DeployError::transfer_with_source("web1", "unpack", "tar exited with 2", source);
        assert!(std::error::Error::source(&error).is_some());
        assert_eq!(
            error.to_string(),
            "Relay transfer to web1 failed during unpack: tar exited with 2"
        );
    }

    #[test]
    fn test_error_conversion_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: DeployError = io_error.into();
        assert!(matches!(error, DeployError::FileSystemError { .. }));
    }

    #[test]
    fn test_command_failure_keeps_exit_code() {
        let error: DeployError = CommandExecutorError::CommandFailed {
            command: "svn log".to_string(),
            exit_code: 1,
            stderr: "E170013".to_string(),
        }
        .into();
        match error {
            DeployError::CommandError { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "E170013");
            }
            other => panic!("Expected CommandError, got {other:?}"),
        }
    }
}
