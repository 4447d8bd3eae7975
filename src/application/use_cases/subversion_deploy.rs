use tracing::{debug, info, warn};

use crate::application::services::{
    CommandBuilder, PromptClassifier, RelayPackage, RelayTransfer, RevisionResolver,
    SessionCredentials, SessionHandler,
};
use crate::common::error::DeployError;
use crate::common::result::DeployResult;
use crate::domain::entities::{DeploymentContext, HostTarget, RepositoryConfig, RevisionStamp};
use crate::domain::value_objects::{RevisionId, RevisionSpec};
use crate::infrastructure::logging::PrefixLogger;
use crate::infrastructure::process::{CommandChain, LocalCommandRunner, ShellCommand};

/// Name recorded in the activity log for whoever runs the deployment
fn local_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}
use crate::infrastructure::remote::{ExecutionContext, RemoteHost, RunOptions};

/// Subversionによるデプロイ操作
///
/// 1回の実行につき1インスタンス。最新リビジョンはインスタンス内でキャッシュされる。
pub struct SubversionDeployer<'a, R: LocalCommandRunner + ?Sized, L: PrefixLogger> {
    config: &'a RepositoryConfig,
    runner: &'a R,
    logger: &'a L,
    builder: CommandBuilder<'a>,
    resolver: RevisionResolver<'a, R>,
    classifier: PromptClassifier,
}

impl<'a, R: LocalCommandRunner + ?Sized, L: PrefixLogger> SubversionDeployer<'a, R, L> {
    pub fn new(config: &'a RepositoryConfig, runner: &'a R, logger: &'a L) -> DeployResult<Self> {
        let builder = CommandBuilder::new(config);
        let classifier = PromptClassifier::new()
            .map_err(|e| DeployError::internal_error(format!("prompt patterns: {}", e)))?;

        Ok(Self {
            config,
            runner,
            logger,
            builder,
            resolver: RevisionResolver::new(builder, runner),
            classifier,
        })
    }

    pub fn config(&self) -> &RepositoryConfig {
        self.config
    }

    /// 最新リビジョン（キャッシュ済み）
    pub async fn latest_revision(&self) -> DeployResult<RevisionId> {
        self.resolver.latest().await
    }

    /// ホストに現在デプロイされているリビジョン
    pub async fn current_revision(
        &self,
        host: &dyn ExecutionContext,
        context: &DeploymentContext,
    ) -> DeployResult<RevisionId> {
        self.resolver.resolve_current(host, context).await
    }

    /// 2つのリビジョン間の差分
    pub async fn diff(
        &self,
        host: &dyn ExecutionContext,
        context: &DeploymentContext,
        from: Option<RevisionSpec>,
        to: Option<RevisionSpec>,
    ) -> DeployResult<String> {
        self.resolver.diff(host, context, from, to).await
    }

    /// Revision to deploy: the configured one, with `HEAD` pinned to a number
    pub async fn target_revision(&self) -> DeployResult<RevisionSpec> {
        match &self.config.revision {
            None | Some(RevisionSpec::Head) => {
                Ok(RevisionSpec::Number(self.latest_revision().await?))
            }
            Some(revision) => Ok(revision.clone()),
        }
    }

    /// Fails before any remote work when in-place updates are impossible
    pub fn check_update_supported(&self) -> DeployResult<()> {
        self.builder.check_update_supported()
    }

    fn relay(&self) -> RelayTransfer<'_, R> {
        RelayTransfer::new(self.builder, self.runner, self.logger)
    }

    /// リレー転送用のアーカイブを作成（リレー不要なら `None`）
    ///
    /// 複数ホストへのデプロイでは1回だけ作成して共有する。
    pub async fn prepare_relay(&self, revision: &RevisionSpec) -> DeployResult<Option<RelayPackage>> {
        if !self.config.is_relay_only() {
            return Ok(None);
        }
        self.relay().prepare(revision).await.map(Some)
    }

    /// 新しいリリースをチェックアウト（到達不能ならリレー転送）
    pub async fn checkout(&self, host: &dyn RemoteHost, target: &HostTarget) -> DeployResult<()> {
        let revision = self.target_revision().await?;
        self.checkout_revision(host, target, &revision, None).await
    }

    /// Checkout of an already resolved revision, reusing `package` when the
    /// repository is only reachable through a relay
    pub async fn checkout_revision(
        &self,
        host: &dyn RemoteHost,
        target: &HostTarget,
        revision: &RevisionSpec,
        package: Option<&RelayPackage>,
    ) -> DeployResult<()> {
        let completion = self.log_links(target, revision, Some(&target.release_path));

        if self.config.is_relay_only() {
            info!(
                host = host.host(),
                release = %target.release_path,
                %revision,
                "relaying export"
            );
            let relay = self.relay();
            let prepared;
            let package = match package {
                Some(package) => package,
                None => {
                    prepared = relay.prepare(revision).await?;
                    &prepared
                }
            };
            return relay
                .ship(host, package, &target.release_path, revision, completion)
                .await;
        }

        let chain = self
            .builder
            .build_checkout(&target.release_path, revision)
            .and_then(self.builder.revision_marker(&target.release_path, revision))
            .and_then_all(completion);
        self.run_session(host, chain).await
    }

    /// 現在のリリースをその場で更新
    ///
    /// The working copy is left clean: the update is recorded in the
    /// activity log, not in a marker file inside it.
    pub async fn update(&self, host: &dyn ExecutionContext, target: &HostTarget) -> DeployResult<()> {
        self.check_update_supported()?;
        let revision = self.target_revision().await?;

        let chain = self
            .builder
            .build_update(&target.active_path, &revision)?
            .and_then_all(self.log_links(target, &revision, None));
        self.run_session(host, chain).await
    }

    /// Activity log links for `target`, if it has a log
    ///
    /// `release_path` of `None` records the directory the chain is in.
    fn log_links(
        &self,
        target: &HostTarget,
        revision: &RevisionSpec,
        release_path: Option<&str>,
    ) -> Vec<ShellCommand> {
        let Some(log_path) = target.revision_log.as_deref() else {
            return Vec::new();
        };
        let RevisionSpec::Number(number) = revision else {
            warn!(%revision, "revision is not a number, skipping revisions.log entry");
            return Vec::new();
        };
        let stamp = RevisionStamp::now(&local_user(), *number);
        self.builder.revision_log_append(log_path, &stamp, release_path)
    }

    async fn run_session(&self, host: &dyn ExecutionContext, chain: CommandChain) -> DeployResult<()> {
        let command = chain.render();
        debug!(host = host.host(), "executing: {}", command);

        let mut handler = SessionHandler::new(
            self.classifier.clone(),
            SessionCredentials::from_config(self.config),
            self.logger,
        );
        host.run(&command, &RunOptions::interactive(), &mut handler)
            .await
    }
}
