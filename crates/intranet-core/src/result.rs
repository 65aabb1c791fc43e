//! Convenience result type alias for the intranet crates.

use crate::error::AppError;

/// A specialized `Result` type for intranet operations.
pub type AppResult<T> = Result<T, AppError>;
