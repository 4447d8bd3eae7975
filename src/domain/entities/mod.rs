pub mod deployment_config;
pub mod host_target;
pub mod repository_config;
pub mod revision_log;

pub use deployment_config::DeploymentConfig;
pub use host_target::{DeploymentContext, HostTarget};
pub use repository_config::RepositoryConfig;
pub use revision_log::{RevisionLogEntry, RevisionLogError, RevisionStamp};
