//! Convenience result type alias for Docserve.

use crate::error::AppError;

/// A specialized `Result` type for Docserve operations.
pub type AppResult<T> = Result<T, AppError>;
