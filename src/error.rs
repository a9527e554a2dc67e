//! Error types for the sync engine
//!
//! Local store failures are fatal for the call that hit them and bubble to
//! the caller. Remote failures are absorbed by the engine and only observed.

use thiserror::Error;

/// Failures of the local project store
#[derive(Debug, Error)]
pub enum StorageError {
    /// Store cannot be opened, read or written (disk full, locked, missing)
    #[error("local store unavailable: {0}")]
    Unavailable(String),
    /// A stored document no longer parses as a Project
    #[error("stored project {id} is corrupt: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<anyhow::Error> for StorageError {
    fn from(err: anyhow::Error) -> Self {
        StorageError::Unavailable(format!("{:#}", err))
    }
}

/// Failures of the remote store client
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No identity, or the server rejected it
    #[error("unauthorized")]
    Unauthorized,
    /// Network failure or timeout
    #[error("transport error: {0}")]
    Transport(String),
    /// Server answered with a non-success status
    #[error("server returned status {0}")]
    Status(u16),
    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::Status(status.as_u16())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// Errors surfaced to callers of the sync engine
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    StorageUnavailable(#[from] StorageError),
    /// Backup document is not valid JSON or lacks a `projects` list
    #[error("malformed import: {0}")]
    MalformedImport(String),
    /// Project breaks a document rule (e.g. a negative expense); nothing was written
    #[error("invalid project: {0}")]
    InvalidProject(String),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
