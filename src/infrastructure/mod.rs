/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - Process execution on the workstation (svn, tar)
/// - Remote execution and upload over ssh
/// - Configuration files
/// - Session narration
pub mod filesystem;
pub mod logging;
pub mod process;
pub mod remote;

// Re-export commonly used types
pub use filesystem::ConfigStore;
pub use logging::{PrefixLogger, TracingLogger};
pub use process::{CommandExecutor, LocalCommandRunner, ShellRunner};
pub use remote::{ExecutionContext, RemoteHost, SshHost, Transfer};
