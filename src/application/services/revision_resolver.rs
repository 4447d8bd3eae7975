use regex::Regex;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::application::services::command_builder::CommandBuilder;
use crate::common::error::DeployError;
use crate::common::result::{DeployResult, OptionExt};
use crate::domain::entities::{DeploymentContext, RevisionLogEntry};
use crate::domain::value_objects::{RevisionId, RevisionSpec};
use crate::infrastructure::process::LocalCommandRunner;
use crate::infrastructure::remote::{ExecutionContext, OutputCollector, RemoteError, RunOptions};

/// Extract the first `r<digits>` token from `svn log` output
pub fn parse_latest_revision(log: &str) -> DeployResult<RevisionId> {
    let pattern = Regex::new(r"r(\d+)")
        .map_err(|e| DeployError::internal_error(format!("revision pattern: {}", e)))?;

    pattern
        .captures(log)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
        .map(RevisionId::new)
        .ok_or_resolution("Could not determine latest revision")
}

/// Resolves revision identifiers for one deployment run
///
/// The latest revision is queried at most once per resolver.
pub struct RevisionResolver<'a, R: LocalCommandRunner + ?Sized> {
    builder: CommandBuilder<'a>,
    runner: &'a R,
    latest: OnceCell<RevisionId>,
}

impl<'a, R: LocalCommandRunner + ?Sized> RevisionResolver<'a, R> {
    pub fn new(builder: CommandBuilder<'a>, runner: &'a R) -> Self {
        Self {
            builder,
            runner,
            latest: OnceCell::new(),
        }
    }

    /// Most recent revision of the local repository URL
    pub async fn latest(&self) -> DeployResult<RevisionId> {
        self.latest
            .get_or_try_init(|| async {
                debug!("querying latest revision...");
                let command = self.builder.log_latest().render();
                let output = self.runner.run(&command).await?;
                parse_latest_revision(&output.stdout)
            })
            .await
            .copied()
    }

    /// Revision recorded in the activity log for the host's latest release
    pub async fn resolve_current(
        &self,
        host: &dyn ExecutionContext,
        context: &DeploymentContext,
    ) -> DeployResult<RevisionId> {
        let release = context.latest_release().ok_or_else(|| {
            DeployError::resolution_on_host(
                "no releases found to look up",
                host.host(),
                context.releases_dir(),
            )
        })?;

        let command = self
            .builder
            .revision_log_query(&context.revision_log_path(), release)
            .render();
        let mut collector = OutputCollector::new();

        match host
            .run(&command, &RunOptions::default(), &mut collector)
            .await
        {
            Ok(()) => {}
            // grep exits with 1 when nothing matched
            Err(DeployError::Remote(error @ RemoteError::CommandFailed { .. }))
                if error.exit_code() == Some(1) =>
            {
                return Err(DeployError::resolution_on_host(
                    "current revision not found in revisions.log",
                    host.host(),
                    command,
                ));
            }
            Err(error) => return Err(error),
        }

        if let Some(line) = collector.stderr.first() {
            return Err(DeployError::resolution_on_host(
                format!("could not determine current revision: {}", line),
                host.host(),
                command,
            ));
        }

        collector
            .stdout
            .iter()
            .filter_map(|line| line.parse::<RevisionLogEntry>().ok())
            .filter(|entry| entry.is_for_release(release))
            .last()
            .map(|entry| entry.revision)
            .ok_or_else(|| {
                DeployError::resolution_on_host(
                    "current revision not found in revisions.log",
                    host.host(),
                    command,
                )
            })
    }

    /// Diff between two revisions; `from` defaults to the deployed revision
    /// and `to` to `HEAD`
    pub async fn diff(
        &self,
        host: &dyn ExecutionContext,
        context: &DeploymentContext,
        from: Option<RevisionSpec>,
        to: Option<RevisionSpec>,
    ) -> DeployResult<String> {
        let from = match from {
            Some(from) => from,
            None => RevisionSpec::Number(self.resolve_current(host, context).await?),
        };
        let to = to.unwrap_or(RevisionSpec::Head);

        let command = self.builder.diff(&from, &to).render();
        debug!("local executing: {}", command);
        let output = self.runner.run(&command).await?;
        Ok(output.stdout)
    }
}
