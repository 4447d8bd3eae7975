pub mod error;
pub mod fallback;
pub mod result;

pub use error::DeployError;
pub use result::DeployResult;
