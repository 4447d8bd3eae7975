pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::exit;

use crate::domain::value_objects::RevisionSpec;
use commands::{
    CheckCommand, CheckoutCommand, CurrentRevisionCommand, DeployEnvironment, DiffCommand,
    LatestRevisionCommand, UpdateCommand,
};

/// svndeploy - Deploy subversion releases to remote hosts
#[derive(Parser)]
#[command(name = "svndeploy")]
#[command(about = "Deploy subversion releases to remote hosts")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Deployment configuration file
    #[arg(short, long, global = true, env = "SVNDEPLOY_CONFIG", default_value = "deploy.yml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the latest revision of the repository
    LatestRevision,

    /// Print the revision deployed on a host
    CurrentRevision {
        /// Host to inspect
        #[arg(long)]
        host: String,
    },

    /// Show changes between the deployed revision and another revision
    Diff {
        /// Host whose deployed revision is the default starting point
        #[arg(long)]
        host: String,

        /// Starting revision (defaults to the deployed one)
        #[arg(long)]
        from: Option<RevisionSpec>,

        /// Ending revision (defaults to HEAD)
        #[arg(long)]
        to: Option<RevisionSpec>,
    },

    /// Check out a new release on every host
    Checkout {
        /// Release name (defaults to the current UTC timestamp)
        #[arg(short, long)]
        release: Option<String>,

        /// Restrict to these hosts (repeatable)
        #[arg(long = "host")]
        hosts: Vec<String>,
    },

    /// Update the active release in place
    Update {
        /// Restrict to these hosts (repeatable)
        #[arg(long = "host")]
        hosts: Vec<String>,
    },

    /// Verify that the local tools are installed
    Check,
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn verbose(&self) -> bool {
        self.cli.verbose
    }

    pub async fn run(self) -> Result<()> {
        // Set up colored output
        colored::control::set_override(!self.cli.no_color);

        // Handle the command
        match self.handle_command().await {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    async fn handle_command(&self) -> Result<()> {
        let env = DeployEnvironment::load(&self.cli.config)?;

        match &self.cli.command {
            Commands::LatestRevision => LatestRevisionCommand.execute(&env).await,
            Commands::CurrentRevision { host } => {
                CurrentRevisionCommand::new(host.clone())
                    .execute(&env)
                    .await
            }
            Commands::Diff { host, from, to } => {
                DiffCommand::new(host.clone(), from.clone(), to.clone())
                    .execute(&env)
                    .await
            }
            Commands::Checkout { release, hosts } => {
                CheckoutCommand::new(release.clone(), hosts.clone())
                    .execute(&env)
                    .await
            }
            Commands::Update { hosts } => UpdateCommand::new(hosts.clone()).execute(&env).await,
            Commands::Check => CheckCommand.execute(&env).await,
        }
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}
