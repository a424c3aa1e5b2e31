//! Convenience result type alias for flipkit.

use crate::error::AppError;

/// A specialized `Result` type for flipkit operations.
pub type AppResult<T> = Result<T, AppError>;
