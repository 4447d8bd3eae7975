use anyhow::{bail, Result};
use colored::Colorize;

use super::DeployEnvironment;
use crate::domain::value_objects::ClientSide;
use crate::infrastructure::process::CommandExecutor;

/// Handler for the check command: are the local tools installed?
pub struct CheckCommand;

impl CheckCommand {
    pub async fn execute(&self, env: &DeployEnvironment) -> Result<()> {
        let scm = &env.config.scm;
        let mut tools = vec![scm.client_path(ClientSide::Local).to_string()];
        if scm.is_relay_only() {
            tools.push("tar".to_string());
        }

        let mut missing = Vec::new();
        for tool in &tools {
            if CommandExecutor::command_exists(tool).await {
                println!("{} {}", "✓".green(), tool);
            } else {
                println!("{} {}", "✗".red(), tool);
                missing.push(tool.clone());
            }
        }

        if !missing.is_empty() {
            bail!("Required tools are not available: {}", missing.join(", "));
        }
        println!(
            "{} {} host(s) configured, deploying to {}",
            "✓".green(),
            env.config.hosts.len(),
            env.config.deploy_to
        );
        Ok(())
    }
}
