pub mod check;
pub mod deploy;
pub mod revision;

pub use check::*;
pub use deploy::*;
pub use revision::*;

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::application::use_cases::SubversionDeployer;
use crate::domain::entities::{DeploymentConfig, DeploymentContext};
use crate::infrastructure::filesystem::ConfigStore;
use crate::infrastructure::logging::TracingLogger;
use crate::infrastructure::process::{ExecutionConfig, ShellRunner};
use crate::infrastructure::remote::{list_releases, SshHost};

/// Everything a command needs: configuration, local runner and logger
pub struct DeployEnvironment {
    pub config: DeploymentConfig,
    pub runner: ShellRunner,
    pub logger: TracingLogger,
}

impl DeployEnvironment {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = ConfigStore::new()
            .load(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;

        Ok(Self {
            config,
            runner: ShellRunner::new(
                ExecutionConfig::new().with_environment_variable("LC_MESSAGES", "C"),
            ),
            logger: TracingLogger,
        })
    }

    pub fn deployer(&self) -> Result<SubversionDeployer<'_, ShellRunner, TracingLogger>> {
        Ok(SubversionDeployer::new(
            &self.config.scm,
            &self.runner,
            &self.logger,
        )?)
    }

    pub fn host(&self, name: &str) -> Result<&SshHost> {
        self.config
            .host(name)
            .ok_or_else(|| anyhow!("Host '{}' is not configured", name))
    }

    /// The named hosts, or every configured host when none are named
    pub fn select_hosts(&self, names: &[String]) -> Result<Vec<SshHost>> {
        if names.is_empty() {
            return Ok(self.config.hosts.clone());
        }
        names
            .iter()
            .map(|name| self.host(name).cloned())
            .collect()
    }

    /// Deployment layout of `host`, including its releases
    pub async fn context_for(&self, host: &SshHost) -> Result<DeploymentContext> {
        let context = self.config.context();
        let releases = list_releases(host, &context.releases_dir()).await?;
        Ok(context.with_releases(releases))
    }
}
