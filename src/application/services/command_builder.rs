//! Command lines for every svn, tar and shell step of a deployment.
//!
//! Remote checkout and update chains are left open (`... &&`) so whatever the
//! caller appends only runs once svn has succeeded.

use crate::common::error::DeployError;
use crate::common::result::DeployResult;
use crate::domain::entities::{RepositoryConfig, RevisionStamp};
use crate::domain::value_objects::{ClientSide, RevisionSpec};
use crate::infrastructure::process::{CommandChain, ShellCommand};

/// Name of the marker file written into every finished release
pub const REVISION_MARKER: &str = "REVISION";

/// Alias that materializes a release without a working copy
pub const EXPORT_ALIAS: &str = "export";

/// Builds command lines from one [`RepositoryConfig`]
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    config: &'a RepositoryConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a RepositoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a RepositoryConfig {
        self.config
    }

    fn client(&self, side: ClientSide) -> ShellCommand {
        ShellCommand::new(self.config.client_path(side))
    }

    fn revision_flag(revision: &RevisionSpec) -> String {
        format!("-r{}", revision)
    }

    /// `svn log -q --limit 1 <local repository>`
    pub fn log_latest(&self) -> ShellCommand {
        self.client(ClientSide::Local)
            .args(["log", "-q", "--limit", "1"])
            .arg(self.config.local_repository().as_str())
    }

    /// `svn diff <local repository>@<from> <local repository>@<to>`
    pub fn diff(&self, from: &RevisionSpec, to: &RevisionSpec) -> ShellCommand {
        let repository = self.config.local_repository();
        self.client(ClientSide::Local)
            .arg("diff")
            .arg(repository.at_revision(from))
            .arg(repository.at_revision(to))
    }

    /// Remote checkout of `revision` into `release_path`
    pub fn build_checkout(&self, release_path: &str, revision: &RevisionSpec) -> CommandChain {
        let checkout = self
            .client(ClientSide::Remote)
            .arg(self.config.checkout_alias())
            .opt_arg("--username", self.config.svn_username())
            .arg("-q")
            .arg(Self::revision_flag(revision))
            .arg(self.config.repository.as_str())
            .arg(release_path);

        CommandChain::new(checkout).continued()
    }

    /// In-place update of the working copy at `active_path`
    ///
    /// Only a checkout leaves a working copy behind, so relayed and exported
    /// releases cannot be updated.
    pub fn build_update(
        &self,
        active_path: &str,
        revision: &RevisionSpec,
    ) -> DeployResult<CommandChain> {
        self.check_update_supported()?;

        let update = self
            .client(ClientSide::Remote)
            .arg("up")
            .opt_arg("--username", self.config.svn_username())
            .arg("-q")
            .arg(Self::revision_flag(revision));

        Ok(CommandChain::new(ShellCommand::new("cd").arg(active_path))
            .and_then(update)
            .continued())
    }

    /// Fails with `UnsupportedOperation` when releases have no working copy
    pub fn check_update_supported(&self) -> DeployResult<()> {
        if self.config.is_relay_only() {
            return Err(DeployError::unsupported_operation(
                "update",
                "the repository is not reachable from remote hosts, so releases are relayed as exports",
            ));
        }
        if self.config.checkout_alias() == EXPORT_ALIAS {
            return Err(DeployError::unsupported_operation(
                "update",
                "releases are deployed with export and have no working copy",
            ));
        }
        Ok(())
    }

    /// Local export for the relay path; always `export`, whatever the alias
    pub fn build_export(&self, destination: &str, revision: &RevisionSpec) -> ShellCommand {
        self.client(ClientSide::Local)
            .arg(EXPORT_ALIAS)
            .opt_arg("--username", self.config.svn_username())
            .arg("-q")
            .arg(Self::revision_flag(revision))
            .arg(self.config.local_repository().as_str())
            .arg(destination)
    }

    /// Archive the contents of `directory` (not the directory itself)
    pub fn build_archive(&self, directory: &str, archive: &str) -> ShellCommand {
        ShellCommand::new("tar")
            .args(["-C", directory, "-c", "-z", "-f", archive, "."])
    }

    /// Remote unpack of a relayed archive into `release_path`
    pub fn build_unpack(&self, release_path: &str, archive: &str) -> CommandChain {
        CommandChain::new(ShellCommand::new("mkdir").args(["-p", release_path]))
            .and_then(
                ShellCommand::new("tar").args(["-C", release_path, "-x", "-z", "-f", archive]),
            )
            .and_then(ShellCommand::new("rm").args(["-f", archive]))
            .continued()
    }

    /// Removal of an uploaded archive and, once unpacking began, the release
    pub fn build_relay_cleanup(&self, release_path: Option<&str>, archive: &str) -> ShellCommand {
        match release_path {
            Some(release_path) => ShellCommand::new("rm").args(["-rf", release_path, archive]),
            None => ShellCommand::new("rm").args(["-f", archive]),
        }
    }

    /// `echo <revision> > <release>/REVISION`
    pub fn revision_marker(&self, release_path: &str, revision: &RevisionSpec) -> ShellCommand {
        ShellCommand::new("echo")
            .arg(revision.to_string())
            .stdout_to(format!("{}/{}", release_path, REVISION_MARKER))
    }

    /// Links recording a finished deployment in the activity log
    ///
    /// With a known release path the entry is one `echo`. Without one the
    /// release field is the physical path of the working directory, which
    /// after `cd current` is the release `current` points at.
    pub fn revision_log_append(
        &self,
        log_path: &str,
        stamp: &RevisionStamp,
        release_path: Option<&str>,
    ) -> Vec<ShellCommand> {
        match release_path {
            Some(release_path) => vec![ShellCommand::new("echo")
                .arg(stamp.entry(release_path).to_string())
                .append_to(log_path)],
            None => vec![
                ShellCommand::new("printf")
                    .arg("%s ")
                    .arg(stamp.to_string())
                    .append_to(log_path),
                ShellCommand::new("pwd").arg("-P").append_to(log_path),
            ],
        }
    }

    /// Lines of the activity log whose release field ends in `release`,
    /// either as a bare id or as the last component of a release path
    pub fn revision_log_query(&self, log_path: &str, release: &str) -> ShellCommand {
        ShellCommand::new("grep")
            .args(["-E", "-e"])
            .arg(format!("[ /]{}/?$", escape_ere(release)))
            .arg(log_path)
    }
}

fn escape_ere(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.[]()*+?{}|^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
