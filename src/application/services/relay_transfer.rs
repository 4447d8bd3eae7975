//! Delivery for hosts that cannot reach the repository.
//!
//! The release is exported on the workstation, shipped as a tarball and
//! unpacked remotely. [`RelayTransfer::prepare`] builds the tarball once and
//! [`RelayTransfer::ship`] sends it to each host. Temporary files are removed
//! before either returns, whatever the outcome.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::application::services::command_builder::CommandBuilder;
use crate::common::error::DeployError;
use crate::common::result::{DeployResult, ResultExt};
use crate::domain::value_objects::RevisionSpec;
use crate::infrastructure::logging::{LogLines, PrefixLogger};
use crate::infrastructure::process::{LocalCommandRunner, ShellCommand};
use crate::infrastructure::remote::{RemoteHost, RunOptions};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Host label for failures on the workstation side
const LOCAL: &str = "local";

/// Temporary names used by one relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayArtifact {
    name: String,
    local_dir: PathBuf,
    local_archive: PathBuf,
    remote_archive: String,
}

impl RelayArtifact {
    /// Fresh names under the given temp directories
    ///
    /// Time, process id and an in-process counter keep concurrent relays apart.
    pub fn new(tmpdir_local: &Path, tmpdir_remote: &str) -> Self {
        let name = format!(
            "svndeploy_{}_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S%6f"),
            std::process::id(),
            SEQUENCE.fetch_add(1, Ordering::Relaxed)
        );
        let archive_name = format!("{}.tar.gz", name);
        Self {
            local_dir: tmpdir_local.join(&name),
            local_archive: tmpdir_local.join(&archive_name),
            remote_archive: format!("{}/{}", tmpdir_remote.trim_end_matches('/'), archive_name),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn local_archive(&self) -> &Path {
        &self.local_archive
    }

    pub fn remote_archive(&self) -> &str {
        &self.remote_archive
    }
}

/// An exported release archived on the workstation, ready to ship
///
/// One package serves every host of a run; its local files are already gone
/// by the time it exists.
#[derive(Debug, Clone)]
pub struct RelayPackage {
    artifact: RelayArtifact,
    bytes: Vec<u8>,
}

impl RelayPackage {
    pub fn artifact(&self) -> &RelayArtifact {
        &self.artifact
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Runs the export, archive, upload and unpack sequence
pub struct RelayTransfer<'a, R: LocalCommandRunner + ?Sized> {
    builder: CommandBuilder<'a>,
    runner: &'a R,
    logger: &'a dyn PrefixLogger,
}

impl<'a, R: LocalCommandRunner + ?Sized> RelayTransfer<'a, R> {
    pub fn new(builder: CommandBuilder<'a>, runner: &'a R, logger: &'a dyn PrefixLogger) -> Self {
        Self {
            builder,
            runner,
            logger,
        }
    }

    /// Deliver `revision` to `release_path` on `host`
    ///
    /// The `REVISION` marker and then `completion` run last, so a release
    /// without the marker was not delivered completely.
    pub async fn deliver(
        &self,
        host: &dyn RemoteHost,
        release_path: &str,
        revision: &RevisionSpec,
        completion: Vec<ShellCommand>,
    ) -> DeployResult<()> {
        let package = self.prepare(revision).await?;
        self.ship(host, &package, release_path, revision, completion)
            .await
    }

    /// Export and archive `revision` on the workstation
    pub async fn prepare(&self, revision: &RevisionSpec) -> DeployResult<RelayPackage> {
        let config = self.builder.config();
        let artifact = RelayArtifact::new(config.tmpdir_local(), config.tmpdir_remote());

        let result = self.package(&artifact, revision).await;
        self.sweep_local(&artifact).await;
        result.map(|bytes| RelayPackage { artifact, bytes })
    }

    async fn package(
        &self,
        artifact: &RelayArtifact,
        revision: &RevisionSpec,
    ) -> DeployResult<Vec<u8>> {
        let local_dir = artifact.local_dir().display().to_string();
        let local_archive = artifact.local_archive().display().to_string();

        let export = self.builder.build_export(&local_dir, revision).render();
        debug!("local executing: {}", export);
        self.runner
            .run(&export)
            .await
            .with_transfer_step(LOCAL, "export")?;

        debug!("local creating tar file: {}", local_archive);
        let archive = self.builder.build_archive(&local_dir, &local_archive).render();
        self.runner
            .run(&archive)
            .await
            .with_transfer_step(LOCAL, "archive")?;

        tokio::fs::remove_dir_all(artifact.local_dir())
            .await
            .with_transfer_step(LOCAL, "remove export")?;

        let bytes = tokio::fs::read(artifact.local_archive())
            .await
            .with_transfer_step(LOCAL, "read archive")?;

        tokio::fs::remove_file(artifact.local_archive())
            .await
            .with_transfer_step(LOCAL, "remove local archive")?;

        Ok(bytes)
    }

    /// Upload `package` to `host` and unpack it into `release_path`
    pub async fn ship(
        &self,
        host: &dyn RemoteHost,
        package: &RelayPackage,
        release_path: &str,
        revision: &RevisionSpec,
        completion: Vec<ShellCommand>,
    ) -> DeployResult<()> {
        let name = host.host();
        let artifact = package.artifact();

        debug!(
            host = name,
            "sending tar file: {} to remote {}",
            artifact.name(),
            artifact.remote_archive()
        );
        if let Err(error) = host.put(package.bytes(), artifact.remote_archive()).await {
            self.sweep_remote(host, None, artifact).await;
            return Err(DeployError::transfer_with_source(
                name,
                "upload",
                error.to_string(),
                error,
            ));
        }

        let unpack = self
            .builder
            .build_unpack(release_path, artifact.remote_archive())
            .and_then(self.builder.revision_marker(release_path, revision))
            .and_then_all(completion)
            .render();
        let mut narration = LogLines::new(self.logger);
        if let Err(error) = host
            .run(&unpack, &RunOptions::default(), &mut narration)
            .await
        {
            self.sweep_remote(host, Some(release_path), artifact).await;
            return Err(DeployError::transfer_with_source(
                name,
                "unpack",
                error.to_string(),
                error,
            ));
        }

        Ok(())
    }

    /// Remove whatever the relay left on the workstation
    async fn sweep_local(&self, artifact: &RelayArtifact) {
        if artifact.local_dir().exists() {
            if let Err(error) = tokio::fs::remove_dir_all(artifact.local_dir()).await {
                warn!(path = %artifact.local_dir().display(), "could not remove export: {}", error);
            }
        }
        if artifact.local_archive().exists() {
            if let Err(error) = tokio::fs::remove_file(artifact.local_archive()).await {
                warn!(path = %artifact.local_archive().display(), "could not remove archive: {}", error);
            }
        }
    }

    /// Remove the uploaded archive and any partial release
    async fn sweep_remote(
        &self,
        host: &dyn RemoteHost,
        release_path: Option<&str>,
        artifact: &RelayArtifact,
    ) {
        let cleanup = self
            .builder
            .build_relay_cleanup(release_path, artifact.remote_archive())
            .render();
        let mut narration = LogLines::new(self.logger);
        if let Err(error) = host
            .run(&cleanup, &RunOptions::default(), &mut narration)
            .await
        {
            warn!(host = host.host(), "remote cleanup failed: {}", error);
        }
    }
}
