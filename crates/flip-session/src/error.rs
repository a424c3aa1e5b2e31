//! Session errors.

use std::path::PathBuf;

use flip_convert::IntakeError;
use flip_core::error::AppError;
use thiserror::Error;

use crate::state::SessionStatus;

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The selection had no acceptable files.
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// `start` was called with nothing selected.
    #[error("No files selected")]
    NoBatch,

    /// The operation is not valid in the current status.
    #[error("Cannot {action} while {status}")]
    InvalidTransition {
        /// What was attempted.
        action: &'static str,
        /// Status at the time.
        status: SessionStatus,
    },

    /// The download sink could not deliver the output.
    #[error("Failed to save {name} to {}: {source}", path.display())]
    Download {
        /// Suggested file name.
        name: String,
        /// Destination the sink tried.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::Intake(e) => e.clone().into(),
            SessionError::NoBatch => AppError::validation(err.to_string()),
            SessionError::InvalidTransition { .. } => AppError::conflict(err.to_string()),
            SessionError::Download { .. } => AppError::storage(err.to_string()),
        }
    }
}
