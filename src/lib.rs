//! # svndeploy - Subversion deployment driver
//!
//! `svndeploy` checks out or updates a Subversion working copy on a set of
//! remote hosts. When the hosts cannot reach the repository, it exports the
//! release locally and relays it to each host as a tarball.
//!
//! ## Features
//!
//! - **Revision lookup**: latest repository revision (queried once per run),
//!   currently deployed revision from `revisions.log`, diffs between them
//! - **Interactive sessions**: svn password, passphrase, host key and
//!   certificate prompts are answered as they appear
//! - **Relay delivery**: export, archive, upload, unpack, with temporary files
//!   removed on both sides
//! - **Fleet operations**: bounded concurrency across hosts, aborting on the
//!   first failure
//!
//! ## Quick Start
//!
//! 1. Describe the deployment (`deploy.yml`):
//!
//! ```yaml
//! scm:
//!   repository: svn+ssh://svn.example.com/srv/repo/app/trunk
//!   username: deploy
//! deploy_to: /srv/app
//! hosts:
//!   - name: app01
//!   - name: app02
//!     user: deploy
//! ```
//!
//! 2. Check out a new release everywhere:
//!
//! ```bash
//! svndeploy checkout --release 20240101120000
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: configuration, revisions, deployment layout
//! - [`application`]: revision resolver, command builder, session handler,
//!   relay transfer, deployment use cases
//! - [`infrastructure`]: local processes, ssh hosts, configuration files, logging
//! - [`presentation`]: CLI interface
//! - [`common`]: shared error handling
//!
//! ## Examples
//!
//! ```rust,no_run
//! use svndeploy::application::use_cases::SubversionDeployer;
//! use svndeploy::domain::entities::{HostTarget, RepositoryConfig};
//! use svndeploy::domain::value_objects::RepositoryUrl;
//! use svndeploy::infrastructure::{ShellRunner, SshHost, TracingLogger};
//!
//! # async fn example() -> svndeploy::Result<()> {
//! let url = RepositoryUrl::new("https://svn.example.com/repo/trunk").expect("valid url");
//! let config = RepositoryConfig::new(url).with_username("deploy");
//! let runner = ShellRunner::default();
//! let logger = TracingLogger;
//!
//! let deployer = SubversionDeployer::new(&config, &runner, &logger)?;
//! let host = SshHost::new("app01");
//! deployer
//!     .checkout(&host, &HostTarget::new("/srv/app/releases/1", "/srv/app/current"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Documentation attributes
#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::DeployError;
pub use crate::common::result::DeployResult as Result;
