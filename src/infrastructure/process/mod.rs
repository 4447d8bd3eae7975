pub mod command_executor;
pub mod shell;

pub use command_executor::{
    CommandExecutor, CommandExecutorError, ExecutionConfig, ExecutionResult, LocalCommandRunner,
    ShellRunner,
};
pub use shell::{quote, CommandChain, ShellCommand};

#[cfg(test)]
pub use command_executor::MockLocalCommandRunner;
