//! Checkpoint error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// No snapshot exists at the given path
    #[error("No checkpoint file exists at {}", .path.display())]
    NotFound { path: PathBuf },

    /// Reading or writing the snapshot file failed
    #[error("Checkpoint I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The recorded current state does not exist in the schema
    #[error("Checkpoint current state '{state}' is not a state of this schema")]
    UnknownState { state: String },
}
