//! Error types for the project crate (thiserror-based).

use cn_common::EditError;
use thiserror::Error;

/// Errors that can occur during project file operations.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// File I/O error (read, write, path resolution).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Project version is newer than this build understands.
    #[error("Unsupported project version: {version}")]
    UnsupportedVersion { version: String },

    /// Project file is missing required fields or has out-of-range values.
    #[error("Invalid project file: {reason}")]
    InvalidProject { reason: String },

    /// A sequence in the file breaks a timeline invariant.
    #[error("Sequence '{sequence}' is inconsistent: {source}")]
    Integrity {
        sequence: String,
        #[source]
        source: EditError,
    },

    /// Migration from an older format failed.
    #[error("Migration failed from version {from} to {to}: {reason}")]
    MigrationFailed {
        from: String,
        to: String,
        reason: String,
    },

    /// The project file path does not exist or is not a file.
    #[error("Project file not found: {path}")]
    NotFound { path: String },
}

/// Convenience Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;
