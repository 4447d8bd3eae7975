use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command as TokioCommand};
use tracing::debug;

/// Command executor errors
#[derive(Debug, Error)]
pub enum CommandExecutorError {
    #[error("Command '{command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Process spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process termination failed: {0}")]
    TerminationFailed(String),
}

/// Configuration for command execution
///
/// Commands always run through `sh -c`, so quoting and redirects in the
/// rendered command line behave as they would remotely.
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    /// Environment variables to set for the process
    pub environment_variables: HashMap<String, String>,
}

impl ExecutionConfig {
    /// Create a new execution config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add environment variable
    pub fn with_environment_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }
}

/// Result of command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code of the process
    pub exit_code: i32,

    /// Standard output
    pub stdout: String,

    /// Standard error output
    pub stderr: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,

    /// Whether the command was successful (exit code 0)
    pub success: bool,
}

impl ExecutionResult {
    /// Create a new execution result
    pub fn new(exit_code: i32, stdout: String, stderr: String, execution_time_ms: u64) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            execution_time_ms,
            success: exit_code == 0,
        }
    }

    /// Convert a non-zero exit into an error
    pub fn into_checked(self, command: &str) -> Result<Self, CommandExecutorError> {
        if self.success {
            Ok(self)
        } else {
            Err(CommandExecutorError::CommandFailed {
                command: command.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs commands on the workstation
///
/// Every call either returns the captured output of a successful command or
/// an error; a non-zero exit is an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalCommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<ExecutionResult, CommandExecutorError>;
}

/// Command executor for running external processes
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute a single command
    pub async fn execute(
        command: &str,
        config: &ExecutionConfig,
    ) -> Result<ExecutionResult, CommandExecutorError> {
        let start_time = Instant::now();

        let (program, args) = Self::parse_command(command)?;

        let mut cmd = TokioCommand::new(program);
        cmd.args(&args);

        for (key, value) in &config.environment_variables {
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            CommandExecutorError::SpawnFailed(format!("Failed to spawn '{}': {}", command, e))
        })?;

        let mut result = Self::wait_for_completion(child).await?;
        result.execution_time_ms = start_time.elapsed().as_millis() as u64;

        debug!(
            command,
            exit_code = result.exit_code,
            elapsed_ms = result.execution_time_ms,
            "local command finished"
        );

        Ok(result)
    }

    /// Parse command into program and arguments
    fn parse_command(command: &str) -> Result<(&'static str, [&str; 2]), CommandExecutorError> {
        if command.trim().is_empty() {
            return Err(CommandExecutorError::InvalidCommand(
                "Command is empty".to_string(),
            ));
        }
        Ok(("sh", ["-c", command]))
    }

    /// Wait for child process to complete and capture output
    async fn wait_for_completion(
        mut child: Child,
    ) -> Result<ExecutionResult, CommandExecutorError> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain both pipes together; either can fill up first
        let (stdout_data, stderr_data) = tokio::try_join!(read_all(stdout), read_all(stderr))?;

        let exit_status = child.wait().await.map_err(|e| {
            CommandExecutorError::TerminationFailed(format!("Failed to wait for process: {}", e))
        })?;

        let exit_code = exit_status.code().unwrap_or(-1);

        Ok(ExecutionResult {
            exit_code,
            stdout: stdout_data,
            stderr: stderr_data,
            execution_time_ms: 0,
            success: exit_status.success(),
        })
    }

    /// Check if a command exists in PATH
    pub async fn command_exists(command: &str) -> bool {
        TokioCommand::new(command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<String> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buffer).await?;
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// [`LocalCommandRunner`] backed by `sh -c`
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    config: ExecutionConfig,
}

impl ShellRunner {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LocalCommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<ExecutionResult, CommandExecutorError> {
        CommandExecutor::execute(command, &self.config)
            .await?
            .into_checked(command)
    }
}
