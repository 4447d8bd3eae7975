pub mod repository_url;
pub mod revision;
pub mod stream_kind;

pub use repository_url::{RepositoryUrl, RepositoryUrlError};
pub use revision::{RevisionError, RevisionId, RevisionSpec};
pub use stream_kind::{ClientSide, StreamKind};
