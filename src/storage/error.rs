//! Storage error taxonomy

use thiserror::Error;

/// Failure of a file operation against the served root
#[derive(Debug, Error)]
pub enum FsError {
    /// Resolved path escapes the root
    #[error("access denied")]
    AccessDenied,
    /// Target does not exist (or is not the expected kind of entry)
    #[error("path not found")]
    NotFound,
    /// Malformed or empty request
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Map an io error, folding `NotFound` into the taxonomy
    pub fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(err)
        }
    }
}
