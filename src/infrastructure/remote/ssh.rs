use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command as TokioCommand};
use tracing::{debug, warn};

use super::line_buffer::LineBuffer;
use super::{
    upload_command, Channel, ExecutionContext, LineHandler, RemoteError, RunOptions, Transfer,
};
use crate::common::result::DeployResult;
use crate::domain::value_objects::StreamKind;

const READ_CHUNK: usize = 4096;

const SSH_PROGRAM: &str = "ssh";

/// A deployment host reached through the system `ssh` client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshHost {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// ssh client to run instead of `ssh` from `PATH`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

impl SshHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
            port: None,
            program: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// `user@name`, or just `name`
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.name),
            None => self.name.clone(),
        }
    }

    fn ssh_command(&self, remote_command: &str, request_pty: bool) -> TokioCommand {
        let mut cmd = TokioCommand::new(self.program.as_deref().unwrap_or(SSH_PROGRAM));
        if request_pty {
            cmd.arg("-tt");
        }
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        cmd.arg(self.destination()).arg(remote_command);
        cmd.env("LC_MESSAGES", "C");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn(&self, remote_command: &str, request_pty: bool) -> Result<Child, RemoteError> {
        self.ssh_command(remote_command, request_pty)
            .spawn()
            .map_err(|source| RemoteError::Spawn {
                host: self.name.clone(),
                source,
            })
    }
}

/// Replies queued by a handler, flushed before the next line is read
struct SshChannel<'a> {
    host: &'a str,
    pending: Vec<u8>,
}

impl Channel for SshChannel<'_> {
    fn host(&self) -> &str {
        self.host
    }

    fn send_data(&mut self, data: &str) -> Result<(), RemoteError> {
        self.pending.extend_from_slice(data.as_bytes());
        Ok(())
    }
}

impl SshHost {
    async fn dispatch(
        &self,
        lines: Vec<String>,
        stream: StreamKind,
        handler: &mut dyn LineHandler,
        stdin: &mut Option<ChildStdin>,
    ) -> DeployResult<()> {
        for line in lines {
            let mut channel = SshChannel {
                host: &self.name,
                pending: Vec::new(),
            };
            handler.on_line(&mut channel, stream, &line)?;

            if channel.pending.is_empty() {
                continue;
            }
            let writer = stdin
                .as_mut()
                .ok_or_else(|| RemoteError::ChannelClosed(self.name.clone()))?;
            writer
                .write_all(&channel.pending)
                .await
                .map_err(RemoteError::Io)?;
            writer.flush().await.map_err(RemoteError::Io)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ExecutionContext for SshHost {
    fn host(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        command: &str,
        options: &RunOptions,
        handler: &mut dyn LineHandler,
    ) -> DeployResult<()> {
        debug!(host = %self.name, command, "executing remotely");

        let mut child = self.spawn(command, options.request_pty)?;
        let mut stdin = child.stdin.take();
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RemoteError::ChannelClosed(self.name.clone()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RemoteError::ChannelClosed(self.name.clone()))?;

        let mut out_lines = LineBuffer::new();
        let mut err_lines = LineBuffer::new();
        let mut out_chunk = [0u8; READ_CHUNK];
        let mut err_chunk = [0u8; READ_CHUNK];
        let mut out_open = true;
        let mut err_open = true;

        while out_open || err_open {
            let (stream, read) = tokio::select! {
                read = stdout.read(&mut out_chunk), if out_open => (StreamKind::Out, read),
                read = stderr.read(&mut err_chunk), if err_open => (StreamKind::Err, read),
            };
            let n = read.map_err(RemoteError::Io)?;

            let (buffer, chunk, open) = match stream {
                StreamKind::Out => (&mut out_lines, &out_chunk[..n], &mut out_open),
                StreamKind::Err => (&mut err_lines, &err_chunk[..n], &mut err_open),
            };
            let lines = if n == 0 {
                *open = false;
                buffer.finish().into_iter().collect()
            } else {
                buffer.push(chunk)
            };

            if let Err(error) = self.dispatch(lines, stream, handler, &mut stdin).await {
                // The session cannot recover; stop the remote command
                if let Err(kill_error) = child.kill().await {
                    warn!(host = %self.name, "failed to stop ssh: {}", kill_error);
                }
                return Err(error);
            }
        }

        drop(stdin);
        let status = child.wait().await.map_err(RemoteError::Io)?;
        if !status.success() {
            return Err(RemoteError::CommandFailed {
                host: self.name.clone(),
                command: command.to_string(),
                exit_code: status.code(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Transfer for SshHost {
    async fn put(&self, data: &[u8], remote_path: &str) -> Result<(), RemoteError> {
        debug!(host = %self.name, remote_path, bytes = data.len(), "uploading");

        let mut child = self.spawn(&upload_command(remote_path), false)?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RemoteError::ChannelClosed(self.name.clone()))?;
        stdin.write_all(data).await?;
        stdin.shutdown().await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RemoteError::TransferFailed {
                host: self.name.clone(),
                path: remote_path.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination() {
        assert_eq!(SshHost::new("web1").destination(), "web1");
        assert_eq!(
            SshHost::new("web1").with_user("deploy").destination(),
            "deploy@web1"
        );
    }

    #[test]
    fn test_ssh_arguments() {
        let host = SshHost::new("web1").with_user("deploy").with_port(2222);
        let cmd = host.ssh_command("svn up -q", true);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["-tt", "-p", "2222", "deploy@web1", "svn up -q"]);
    }

    #[test]
    fn test_no_pty_for_plain_commands() {
        let cmd = SshHost::new("web1").ssh_command("ls -1 /srv/app/releases", false);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["web1", "ls -1 /srv/app/releases"]);
    }

    #[test]
    fn test_channel_queues_replies() {
        let mut channel = SshChannel {
            host: "web1",
            pending: Vec::new(),
        };
        channel.send_data("secret\n").unwrap();
        channel.send_data("yes\n").unwrap();
        assert_eq!(channel.host(), "web1");
        assert_eq!(channel.pending, b"secret\nyes\n");
    }

    #[test]
    fn test_host_from_yaml() {
        let host: SshHost = serde_yaml::from_str("name: web1\nuser: deploy\nport: 22\n").unwrap();
        assert_eq!(host, SshHost::new("web1").with_user("deploy").with_port(22));

        let host: SshHost =
            serde_yaml::from_str("name: web1\nprogram: /usr/local/bin/ssh\n").unwrap();
        assert_eq!(host.program.as_deref(), Some("/usr/local/bin/ssh"));
    }

    #[test]
    fn test_program_override() {
        let cmd = SshHost::new("web1").ssh_command("true", false);
        assert_eq!(cmd.as_std().get_program(), "ssh");

        let cmd = SshHost::new("web1")
            .with_program("/opt/bin/ssh")
            .ssh_command("true", false);
        assert_eq!(cmd.as_std().get_program(), "/opt/bin/ssh");
    }

    #[cfg(unix)]
    mod sessions {
        use super::*;
        use crate::application::services::{PromptClassifier, SessionCredentials, SessionHandler};
        use crate::common::error::DeployError;
        use crate::infrastructure::logging::TracingLogger;
        use std::path::Path;
        use std::time::Duration;
        use tempfile::TempDir;

        /// Client that runs the "remote" command with the local shell
        fn local_ssh(dir: &Path) -> String {
            use std::os::unix::fs::PermissionsExt;

            let script = dir.join("ssh");
            std::fs::write(&script, "#!/bin/sh\nfor last; do :; done\nexec sh -c \"$last\"\n")
                .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            script.display().to_string()
        }

        /// Keeps every line in arrival order before handing it on
        struct Transcript<H> {
            inner: H,
            lines: Vec<(StreamKind, String)>,
        }

        impl<H: LineHandler> LineHandler for Transcript<H> {
            fn on_line(
                &mut self,
                channel: &mut dyn Channel,
                stream: StreamKind,
                line: &str,
            ) -> DeployResult<()> {
                self.lines.push((stream, line.to_string()));
                self.inner.on_line(channel, stream, line)
            }
        }

        fn session(logger: &TracingLogger) -> Transcript<SessionHandler<'_>> {
            Transcript {
                inner: SessionHandler::new(
                    PromptClassifier::new().unwrap(),
                    SessionCredentials {
                        password: Some("hunter2"),
                        passphrase: None,
                    },
                    logger,
                ),
                lines: Vec::new(),
            }
        }

        #[tokio::test]
        async fn test_prompt_is_answered_before_command_continues() {
            let bin = TempDir::new().unwrap();
            let host = SshHost::new("web1").with_program(local_ssh(bin.path()));
            let logger = TracingLogger;
            let mut handler = session(&logger);

            host.run(
                r#"printf 'Password: '; read reply; echo "got $reply""#,
                &RunOptions::default(),
                &mut handler,
            )
            .await
            .unwrap();

            assert_eq!(
                handler.lines,
                vec![
                    (StreamKind::Out, "Password: ".to_string()),
                    (StreamKind::Out, "got hunter2".to_string()),
                ]
            );
        }

        #[tokio::test]
        async fn test_fatal_line_stops_remote_command() {
            let bin = TempDir::new().unwrap();
            let host = SshHost::new("web1").with_program(local_ssh(bin.path()));
            let logger = TracingLogger;
            let mut handler = session(&logger);

            let opts = RunOptions::default();
            let run = host.run(
                "echo \"svn: The entry 'public/uploads' is no longer a directory\" >&2; exec sleep 30",
                &opts,
                &mut handler,
            );
            let result = tokio::time::timeout(Duration::from_secs(10), run)
                .await
                .expect("session was not stopped");

            match result {
                Err(DeployError::ProtocolFatal { host, entry, .. }) => {
                    assert_eq!(host, "web1");
                    assert_eq!(entry, "public/uploads");
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_nonzero_exit_is_command_failure() {
            let bin = TempDir::new().unwrap();
            let host = SshHost::new("web1").with_program(local_ssh(bin.path()));
            let logger = TracingLogger;
            let mut handler = session(&logger);

            let result = host
                .run("echo partial; exit 3", &RunOptions::default(), &mut handler)
                .await;

            match result {
                Err(DeployError::Remote(RemoteError::CommandFailed {
                    host, exit_code, ..
                })) => {
                    assert_eq!(host, "web1");
                    assert_eq!(exit_code, Some(3));
                }
                other => panic!("unexpected result: {:?}", other),
            }
            assert_eq!(handler.lines, vec![(StreamKind::Out, "partial".to_string())]);
        }
    }
}
