use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("malformed patch stream: {0}")]
    Parse(String),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("patch request is already {0}")]
    AlreadyInState(crate::types::Status),

    #[error("you are not authorized to do that")]
    Unauthorized,

    /// Internal to ingestion; callers skip the patch instead of surfacing this.
    #[error("patch already exists in patchset")]
    PatchExists,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, Error>;
