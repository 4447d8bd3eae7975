use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

use crate::domain::entities::host_target::DeploymentContext;
use crate::domain::entities::repository_config::RepositoryConfig;
use crate::infrastructure::remote::SshHost;

fn default_max_concurrency() -> usize {
    num_cpus::get()
}

fn validate_unique_hosts(hosts: &[SshHost]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for host in hosts {
        if host.name.trim().is_empty() {
            return Err(ValidationError::new("empty_host_name"));
        }
        if !seen.insert(host.name.as_str()) {
            let mut error = ValidationError::new("duplicate_host");
            error.message = Some(format!("host '{}' is listed twice", host.name).into());
            return Err(error);
        }
    }
    Ok(())
}

/// デプロイ設定ファイル（`deploy.yml`）の内容
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// リポジトリ設定
    #[validate(nested)]
    pub scm: RepositoryConfig,

    /// デプロイ先のルートディレクトリ
    #[validate(length(min = 1))]
    pub deploy_to: String,

    /// デプロイ対象ホスト
    #[validate(length(min = 1), custom(function = "validate_unique_hosts"))]
    pub hosts: Vec<SshHost>,

    /// revisions.log のパス（未指定なら `<deploy_to>/revisions.log`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_log: Option<String>,

    /// 同時にデプロイするホスト数の上限
    #[serde(default = "default_max_concurrency")]
    #[validate(range(min = 1))]
    pub max_concurrency: usize,
}

impl DeploymentConfig {
    /// Deployment layout without any known releases
    pub fn context(&self) -> DeploymentContext {
        let context = DeploymentContext::new(&self.deploy_to);
        match &self.revision_log {
            Some(path) => context.with_revision_log(path),
            None => context,
        }
    }

    /// Look up a configured host by name
    pub fn host(&self, name: &str) -> Option<&SshHost> {
        self.hosts.iter().find(|host| host.name == name)
    }
}
