//! Remote collaborators: per-host command execution with a line callback,
//! byte transfer, and the channel a callback answers prompts through.

pub mod line_buffer;
pub mod ssh;

use async_trait::async_trait;
use thiserror::Error;

use crate::common::result::DeployResult;
use crate::domain::value_objects::StreamKind;
use crate::infrastructure::process::{quote, ShellCommand};

pub use line_buffer::LineBuffer;
pub use ssh::SshHost;

/// Remote execution errors
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Command on {host} exited with {}: {command}", describe_exit(.exit_code))]
    CommandFailed {
        host: String,
        command: String,
        exit_code: Option<i32>,
    },

    #[error("Failed to start ssh for {host}: {source}")]
    Spawn {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel to {0} is closed")]
    ChannelClosed(String),

    #[error("Upload of {path} to {host} failed: {message}")]
    TransferFailed {
        host: String,
        path: String,
        message: String,
    },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl RemoteError {
    /// Exit code of a failed remote command, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RemoteError::CommandFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

/// The write side of one running remote command
pub trait Channel: Send {
    fn host(&self) -> &str;

    /// Queue bytes for the command's standard input
    fn send_data(&mut self, data: &str) -> Result<(), RemoteError>;
}

/// Receives every output line of a remote command, in arrival order
pub trait LineHandler: Send {
    fn on_line(
        &mut self,
        channel: &mut dyn Channel,
        stream: StreamKind,
        line: &str,
    ) -> DeployResult<()>;
}

/// Options for one remote command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Allocate a pseudo terminal so svn can prompt
    pub request_pty: bool,
}

impl RunOptions {
    pub fn interactive() -> Self {
        Self { request_pty: true }
    }
}

/// Runs commands on one host
///
/// `run` feeds each output line to `handler` before reading the next one and
/// fails with [`RemoteError::CommandFailed`] on a non-zero exit.
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    fn host(&self) -> &str;

    async fn run(
        &self,
        command: &str,
        options: &RunOptions,
        handler: &mut dyn LineHandler,
    ) -> DeployResult<()>;
}

/// Copies bytes to a path on one host
#[async_trait]
pub trait Transfer: Send + Sync {
    async fn put(&self, data: &[u8], remote_path: &str) -> Result<(), RemoteError>;
}

/// A host that can both execute and receive files
pub trait RemoteHost: ExecutionContext + Transfer {}

impl<T: ExecutionContext + Transfer + ?Sized> RemoteHost for T {}

/// Collects output lines per stream without answering anything
#[derive(Debug, Default, Clone)]
pub struct OutputCollector {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineHandler for OutputCollector {
    fn on_line(
        &mut self,
        _channel: &mut dyn Channel,
        stream: StreamKind,
        line: &str,
    ) -> DeployResult<()> {
        match stream {
            StreamKind::Out => self.stdout.push(line.to_string()),
            StreamKind::Err => self.stderr.push(line.to_string()),
        }
        Ok(())
    }
}

/// Release identifiers under `releases_dir` on `host`, oldest first
pub async fn list_releases(
    host: &dyn ExecutionContext,
    releases_dir: &str,
) -> DeployResult<Vec<String>> {
    let command = ShellCommand::new("ls").arg("-1").arg(releases_dir).render();
    let mut collector = OutputCollector::new();
    host.run(&command, &RunOptions::default(), &mut collector)
        .await?;

    let mut releases: Vec<String> = collector
        .stdout
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    releases.sort();
    tracing::debug!(host = host.host(), count = releases.len(), "listed releases");
    Ok(releases)
}

/// `cat > path` for streaming an upload through a remote shell
pub(crate) fn upload_command(remote_path: &str) -> String {
    format!("cat > {}", quote(remote_path))
}
