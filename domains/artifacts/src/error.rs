//! Artifact store errors

use stencil_common::Error;
use thiserror::Error;

/// Errors raised by the artifact store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unsafe basename, bad file signature, unknown bucket, blocked upload.
    /// Raised before any side effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Path escapes the storage root or crosses a symbolic link
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Failed to delete artifact {path}: {source}")]
    DeleteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => Error::Validation(msg),
            StoreError::NotFound(_) => Error::NotFound("Artifact not found".to_string()),
            other => {
                tracing::error!(error = %other, "Artifact store failure");
                Error::internal()
            }
        }
    }
}
