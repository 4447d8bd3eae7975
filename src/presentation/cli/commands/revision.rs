use anyhow::Result;
use colored::Colorize;

use super::DeployEnvironment;
use crate::domain::value_objects::RevisionSpec;

/// Handler for the latest-revision command
pub struct LatestRevisionCommand;

impl LatestRevisionCommand {
    pub async fn execute(&self, env: &DeployEnvironment) -> Result<()> {
        let deployer = env.deployer()?;
        let revision = deployer.latest_revision().await?;
        println!("{}", revision);
        Ok(())
    }
}

/// Handler for the current-revision command
pub struct CurrentRevisionCommand {
    pub host: String,
}

impl CurrentRevisionCommand {
    pub fn new(host: String) -> Self {
        Self { host }
    }

    pub async fn execute(&self, env: &DeployEnvironment) -> Result<()> {
        let host = env.host(&self.host)?;
        let context = env.context_for(host).await?;
        let deployer = env.deployer()?;

        let revision = deployer.current_revision(host, &context).await?;
        match context.latest_release() {
            Some(release) => println!("{} ({} on {})", revision, release.cyan(), host.name),
            None => println!("{}", revision),
        }
        Ok(())
    }
}

/// Handler for the diff command
pub struct DiffCommand {
    pub host: String,
    pub from: Option<RevisionSpec>,
    pub to: Option<RevisionSpec>,
}

impl DiffCommand {
    pub fn new(host: String, from: Option<RevisionSpec>, to: Option<RevisionSpec>) -> Self {
        Self { host, from, to }
    }

    pub async fn execute(&self, env: &DeployEnvironment) -> Result<()> {
        let host = env.host(&self.host)?;
        // Only needed when the starting revision has to be looked up
        let context = match self.from {
            Some(_) => env.config.context(),
            None => env.context_for(host).await?,
        };
        let deployer = env.deployer()?;

        let diff = deployer
            .diff(host, &context, self.from.clone(), self.to.clone())
            .await?;
        print!("{}", diff);
        Ok(())
    }
}
