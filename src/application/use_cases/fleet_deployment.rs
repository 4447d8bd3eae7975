use futures::future::try_join_all;
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::info;

use crate::application::use_cases::subversion_deploy::SubversionDeployer;
use crate::common::error::DeployError;
use crate::common::result::DeployResult;
use crate::domain::entities::DeploymentContext;
use crate::domain::value_objects::RevisionSpec;
use crate::infrastructure::logging::PrefixLogger;
use crate::infrastructure::process::LocalCommandRunner;
use crate::infrastructure::remote::RemoteHost;

/// 複数ホストへのデプロイ結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetReport {
    /// 完了したホスト（入力順）
    pub hosts: Vec<String>,

    /// デプロイしたリビジョン
    pub revision: RevisionSpec,

    /// 実行時間（ミリ秒）
    pub elapsed_ms: u64,
}

/// Runs one operation on every host, at most `max_concurrency` at a time
///
/// The first failure cancels the sessions still running.
pub struct FleetDeployment<'d, 'a, R: LocalCommandRunner + ?Sized, L: PrefixLogger> {
    deployer: &'d SubversionDeployer<'a, R, L>,
    max_concurrency: usize,
}

impl<'d, 'a, R: LocalCommandRunner + ?Sized, L: PrefixLogger> FleetDeployment<'d, 'a, R, L> {
    pub fn new(deployer: &'d SubversionDeployer<'a, R, L>) -> Self {
        Self {
            deployer,
            max_concurrency: num_cpus::get(),
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    fn ensure_distinct<H: RemoteHost>(hosts: &[H]) -> DeployResult<()> {
        let mut seen = HashSet::new();
        for host in hosts {
            if !seen.insert(host.host()) {
                return Err(DeployError::config_error(format!(
                    "host '{}' is listed more than once",
                    host.host()
                )));
            }
        }
        Ok(())
    }

    /// Check out `release` on every host
    ///
    /// When releases are relayed the export is archived once and the same
    /// package is shipped to every host.
    pub async fn checkout_all<H: RemoteHost>(
        &self,
        hosts: &[H],
        context: &DeploymentContext,
        release: &str,
    ) -> DeployResult<FleetReport> {
        Self::ensure_distinct(hosts)?;
        let revision = self.deployer.target_revision().await?;
        let target = context.target_for(release);
        let started = Instant::now();
        let package = self.deployer.prepare_relay(&revision).await?;
        let semaphore = Semaphore::new(self.max_concurrency);

        let sessions = hosts.iter().map(|host| {
            let semaphore = &semaphore;
            let target = &target;
            let revision = &revision;
            let package = package.as_ref();
            async move {
                let _permit = semaphore.acquire().await.map_err(|e| {
                    DeployError::internal_error(format!("Failed to acquire semaphore: {}", e))
                })?;
                self.deployer
                    .checkout_revision(host, target, revision, package)
                    .await?;
                info!(host = host.host(), "checkout finished");
                Ok::<_, DeployError>(host.host().to_string())
            }
        });
        let hosts = try_join_all(sessions).await?;

        Ok(FleetReport {
            hosts,
            revision,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Update the active release on every host
    pub async fn update_all<H: RemoteHost>(
        &self,
        hosts: &[H],
        context: &DeploymentContext,
    ) -> DeployResult<FleetReport> {
        Self::ensure_distinct(hosts)?;
        self.deployer.check_update_supported()?;
        let revision = self.deployer.target_revision().await?;
        let target = context.update_target();
        let started = Instant::now();
        let semaphore = Semaphore::new(self.max_concurrency);

        let sessions = hosts.iter().map(|host| {
            let semaphore = &semaphore;
            let target = &target;
            async move {
                let _permit = semaphore.acquire().await.map_err(|e| {
                    DeployError::internal_error(format!("Failed to acquire semaphore: {}", e))
                })?;
                self.deployer.update(host, target).await?;
                info!(host = host.host(), "update finished");
                Ok::<_, DeployError>(host.host().to_string())
            }
        });
        let hosts = try_join_all(sessions).await?;

        Ok(FleetReport {
            hosts,
            revision,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
