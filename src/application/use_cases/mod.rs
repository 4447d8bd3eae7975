pub mod fleet_deployment;
pub mod subversion_deploy;

pub use fleet_deployment::{FleetDeployment, FleetReport};
pub use subversion_deploy::SubversionDeployer;
