use serde::{Deserialize, Serialize};
use std::fmt;

/// Which output stream of a remote command produced a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Out,
    Err,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Out => write!(f, "out"),
            StreamKind::Err => write!(f, "err"),
        }
    }
}

/// Which machine a client executable runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientSide {
    /// The workstation running svndeploy
    Local,
    /// A deployment host
    Remote,
}
