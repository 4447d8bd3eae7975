use serde::{Deserialize, Serialize};

/// Where a deployment lands on one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTarget {
    /// Directory a fresh checkout is written to
    pub release_path: String,
    /// Directory an in-place update is applied to
    pub active_path: String,
    /// Activity log each finished deployment is appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_log: Option<String>,
}

impl HostTarget {
    pub fn new(release_path: impl Into<String>, active_path: impl Into<String>) -> Self {
        Self {
            release_path: release_path.into(),
            active_path: active_path.into(),
            revision_log: None,
        }
    }

    pub fn with_revision_log(mut self, path: impl Into<String>) -> Self {
        self.revision_log = Some(path.into());
        self
    }
}

/// Layout of a deployment root shared by every host
///
/// ```text
/// <deploy_to>/releases/<release>
/// <deploy_to>/current
/// <deploy_to>/revisions.log
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeploymentContext {
    pub deploy_to: String,
    /// Prior release identifiers, oldest first
    pub releases: Vec<String>,
    /// Activity log override
    pub revision_log: Option<String>,
}

impl DeploymentContext {
    pub fn new(deploy_to: impl Into<String>) -> Self {
        Self {
            deploy_to: deploy_to.into().trim_end_matches('/').to_string(),
            releases: Vec::new(),
            revision_log: None,
        }
    }

    pub fn with_releases(mut self, mut releases: Vec<String>) -> Self {
        releases.sort();
        self.releases = releases;
        self
    }

    pub fn with_revision_log(mut self, path: impl Into<String>) -> Self {
        self.revision_log = Some(path.into());
        self
    }

    pub fn releases_dir(&self) -> String {
        format!("{}/releases", self.deploy_to)
    }

    pub fn current_path(&self) -> String {
        format!("{}/current", self.deploy_to)
    }

    pub fn revision_log_path(&self) -> String {
        self.revision_log
            .clone()
            .unwrap_or_else(|| format!("{}/revisions.log", self.deploy_to))
    }

    /// The most recent release identifier, if any
    pub fn latest_release(&self) -> Option<&str> {
        self.releases.last().map(String::as_str)
    }

    /// Target for a new release named `release`
    pub fn target_for(&self, release: &str) -> HostTarget {
        HostTarget::new(
            format!("{}/{}", self.releases_dir(), release),
            self.current_path(),
        )
        .with_revision_log(self.revision_log_path())
    }

    /// Target for an in-place update of `current`
    pub fn update_target(&self) -> HostTarget {
        let current = self.current_path();
        HostTarget::new(current.clone(), current).with_revision_log(self.revision_log_path())
    }
}
