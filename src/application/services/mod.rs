pub mod command_builder;
pub mod relay_transfer;
pub mod revision_resolver;
pub mod session_handler;

pub use command_builder::CommandBuilder;
pub use relay_transfer::{RelayArtifact, RelayPackage, RelayTransfer};
pub use revision_resolver::{parse_latest_revision, RevisionResolver};
pub use session_handler::{PromptClassifier, Reply, SessionAction, SessionCredentials, SessionHandler};
