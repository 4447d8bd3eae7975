//! Mock collaborators for testing
//!
//! Hosts that record what they were asked to do, a local runner that replays
//! canned svn output, and a logger that keeps every narrated line.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use svndeploy::common::result::DeployResult;
use svndeploy::domain::value_objects::StreamKind;
use svndeploy::infrastructure::logging::PrefixLogger;
use svndeploy::infrastructure::process::{
    CommandExecutor, CommandExecutorError, ExecutionConfig, ExecutionResult, LocalCommandRunner,
};
use svndeploy::infrastructure::remote::{
    Channel, ExecutionContext, LineHandler, RemoteError, RunOptions, Transfer,
};

/// Logger that keeps `(message, prefix)` pairs
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|(message, _)| message).collect()
    }
}

impl PrefixLogger for RecordingLogger {
    fn log(&self, message: &str, prefix: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((message.to_string(), prefix.to_string()));
    }
}

/// Channel that records what a handler sent
pub struct MockChannel {
    host: String,
    pub sent_data: Vec<String>,
}

impl MockChannel {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            sent_data: Vec::new(),
        }
    }
}

impl Channel for MockChannel {
    fn host(&self) -> &str {
        &self.host
    }

    fn send_data(&mut self, data: &str) -> Result<(), RemoteError> {
        self.sent_data.push(data.to_string());
        Ok(())
    }
}

/// Host that replays a fixed output story for every command
pub struct MockHost {
    name: String,
    story: Vec<(StreamKind, String)>,
    fail_put: bool,
    commands: Mutex<Vec<String>>,
    options: Mutex<Vec<RunOptions>>,
    channels: Mutex<Vec<Vec<String>>>,
    puts: Mutex<Vec<(Vec<u8>, String)>>,
}

impl MockHost {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            story: Vec::new(),
            fail_put: false,
            commands: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_story(mut self, story: &[(StreamKind, &str)]) -> Self {
        self.story = story
            .iter()
            .map(|(stream, line)| (*stream, line.to_string()))
            .collect();
        self
    }

    pub fn with_failing_put(mut self) -> Self {
        self.fail_put = true;
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn last_command(&self) -> Option<String> {
        self.commands().last().cloned()
    }

    pub fn options(&self) -> Vec<RunOptions> {
        self.options.lock().unwrap().clone()
    }

    /// What was sent back on the most recent run
    pub fn last_sent_data(&self) -> Vec<String> {
        self.channels
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn puts(&self) -> Vec<(Vec<u8>, String)> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionContext for MockHost {
    fn host(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        command: &str,
        options: &RunOptions,
        handler: &mut dyn LineHandler,
    ) -> DeployResult<()> {
        self.commands.lock().unwrap().push(command.to_string());
        self.options.lock().unwrap().push(*options);

        let mut channel = MockChannel::new(&self.name);
        let mut outcome = Ok(());
        for (stream, line) in &self.story {
            if let Err(error) = handler.on_line(&mut channel, *stream, line) {
                outcome = Err(error);
                break;
            }
        }
        self.channels.lock().unwrap().push(channel.sent_data);
        outcome
    }
}

#[async_trait]
impl Transfer for MockHost {
    async fn put(&self, data: &[u8], remote_path: &str) -> Result<(), RemoteError> {
        if self.fail_put {
            return Err(RemoteError::TransferFailed {
                host: self.name.clone(),
                path: remote_path.to_string(),
                message: "No space left on device".to_string(),
            });
        }
        self.puts
            .lock()
            .unwrap()
            .push((data.to_vec(), remote_path.to_string()));
        Ok(())
    }
}

/// Host whose "remote" side is this machine: commands run under `sh -c`
/// and uploads are plain file writes
pub struct LoopbackHost {
    name: String,
    commands: Mutex<Vec<String>>,
    uploads: Mutex<Vec<String>>,
}

impl LoopbackHost {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commands: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionContext for LoopbackHost {
    fn host(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        command: &str,
        _options: &RunOptions,
        handler: &mut dyn LineHandler,
    ) -> DeployResult<()> {
        self.commands.lock().unwrap().push(command.to_string());

        let result = CommandExecutor::execute(command, &ExecutionConfig::new()).await?;
        let mut channel = MockChannel::new(&self.name);
        for line in result.stdout.lines() {
            handler.on_line(&mut channel, StreamKind::Out, line)?;
        }
        for line in result.stderr.lines() {
            handler.on_line(&mut channel, StreamKind::Err, line)?;
        }

        if !result.success {
            return Err(RemoteError::CommandFailed {
                host: self.name.clone(),
                command: command.to_string(),
                exit_code: Some(result.exit_code),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Transfer for LoopbackHost {
    async fn put(&self, data: &[u8], remote_path: &str) -> Result<(), RemoteError> {
        tokio::fs::write(Path::new(remote_path), data).await?;
        self.uploads.lock().unwrap().push(remote_path.to_string());
        Ok(())
    }
}

/// Local runner that answers `svn log` with a canned story and records
/// every command it was given
pub struct MockLocalRunner {
    log_output: String,
    commands: Mutex<Vec<String>>,
}

impl MockLocalRunner {
    pub fn new(log_output: &str) -> Self {
        Self {
            log_output: log_output.to_string(),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalCommandRunner for MockLocalRunner {
    async fn run(&self, command: &str) -> Result<ExecutionResult, CommandExecutorError> {
        self.commands.lock().unwrap().push(command.to_string());
        let stdout = if command.contains(" log ") {
            self.log_output.clone()
        } else {
            String::new()
        };
        Ok(ExecutionResult::new(0, stdout, String::new(), 0))
    }
}
