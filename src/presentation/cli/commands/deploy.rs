use anyhow::Result;
use chrono::Utc;
use colored::Colorize;

use super::DeployEnvironment;
use crate::application::use_cases::{FleetDeployment, FleetReport};

/// Release name used when none is given
pub fn default_release_name() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

fn print_report(action: &str, report: &FleetReport) {
    println!(
        "{} {} revision {} on {} host(s) in {}ms",
        "✓".green(),
        action,
        report.revision,
        report.hosts.len(),
        report.elapsed_ms
    );
    for host in &report.hosts {
        println!("  {}", host);
    }
}

/// Handler for the checkout command
pub struct CheckoutCommand {
    pub release: Option<String>,
    pub hosts: Vec<String>,
}

impl CheckoutCommand {
    pub fn new(release: Option<String>, hosts: Vec<String>) -> Self {
        Self { release, hosts }
    }

    pub async fn execute(&self, env: &DeployEnvironment) -> Result<()> {
        let hosts = env.select_hosts(&self.hosts)?;
        let release = self.release.clone().unwrap_or_else(default_release_name);
        let deployer = env.deployer()?;

        println!("{} {}", "Deploying release".blue(), release.cyan());
        let report = FleetDeployment::new(&deployer)
            .with_max_concurrency(env.config.max_concurrency)
            .checkout_all(&hosts, &env.config.context(), &release)
            .await?;

        print_report("Checked out", &report);
        Ok(())
    }
}

/// Handler for the update command
pub struct UpdateCommand {
    pub hosts: Vec<String>,
}

impl UpdateCommand {
    pub fn new(hosts: Vec<String>) -> Self {
        Self { hosts }
    }

    pub async fn execute(&self, env: &DeployEnvironment) -> Result<()> {
        let hosts = env.select_hosts(&self.hosts)?;
        let deployer = env.deployer()?;

        let report = FleetDeployment::new(&deployer)
            .with_max_concurrency(env.config.max_concurrency)
            .update_all(&hosts, &env.config.context())
            .await?;

        print_report("Updated", &report);
        Ok(())
    }
}
