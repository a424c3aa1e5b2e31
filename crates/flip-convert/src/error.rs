//! Error types for intake and the transform stage.
//!
//! Both enums map cleanly into `flip_core::error::AppError`.

use flip_core::error::AppError;
use thiserror::Error;

/// Rejection of a dropped or selected batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// Nothing in the selection carries an accepted suffix.
    #[error("Please select image files ({accepted})")]
    NoMatchingFiles {
        /// Accepted formats, e.g. `"JPG, JPEG, PNG"`.
        accepted: String,
    },
}

/// Errors raised while transforming a request.
#[derive(Debug, Error)]
pub enum TransformError {
    /// An input file could not be read in full.
    #[error("Failed to read {name}: {source}")]
    ReadFailure {
        /// Logical name of the input file.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The zip writer rejected an entry or could not finish.
    #[error("Error creating ZIP file: {0}")]
    ArchiveFailure(#[from] zip::result::ZipError),

    /// An entry name was written twice to the same archive.
    #[error("Archive already contains an entry named '{name}'")]
    DuplicateEntry {
        /// The repeated entry name.
        name: String,
    },

    /// The request itself is malformed.
    #[error("Invalid transform request: {reason}")]
    InvalidRequest {
        /// What is wrong with the request.
        reason: String,
    },

    /// No background execution context could be used.
    #[error("Worker unavailable: {reason}")]
    WorkerUnavailable {
        /// Why the worker could not be used.
        reason: String,
    },
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<TransformError> for AppError {
    fn from(err: TransformError) -> Self {
        match &err {
            TransformError::ReadFailure { .. } => AppError::storage(err.to_string()),
            TransformError::ArchiveFailure(_) | TransformError::DuplicateEntry { .. } => {
                AppError::archive(err.to_string())
            }
            TransformError::InvalidRequest { .. } => AppError::validation(err.to_string()),
            TransformError::WorkerUnavailable { .. } => {
                AppError::service_unavailable(err.to_string())
            }
        }
    }
}
