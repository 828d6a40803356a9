use context_protocol::{ErrorKind, PathRejection};
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Paths carried by these errors are relative to the scan root whenever the
/// failure happened below it; only a missing root reports the path it was given.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Symbolic link cycle: {path} points back to {ancestor}")]
    SymlinkLoop { path: String, ancestor: String },

    #[error("File is not valid UTF-8 text: {0}")]
    Decode(String),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: PathRejection },

    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl ScanError {
    pub(crate) fn from_io(path: String, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::InvalidData => Self::Decode(path),
            _ => Self::Io { path, source: err },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::NotADirectory(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) | Self::SymlinkLoop { .. } => ErrorKind::PermissionDenied,
            Self::Decode(_) => ErrorKind::Decode,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::Io { .. } | Self::Other(_) => ErrorKind::Internal,
        }
    }
}

/// A failed read inside a batch, naming the path exactly as it was requested.
#[derive(Error, Debug)]
#[error("Could not read file {path}: {source}")]
pub struct ReadFailure {
    pub path: String,
    #[source]
    pub source: ScanError,
}
