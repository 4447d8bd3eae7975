/// Presentation layer: the `svndeploy` command-line interface
pub mod cli;
