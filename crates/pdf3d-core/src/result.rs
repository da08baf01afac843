//! Convenience result type alias for the pipeline.

use crate::error::AppError;

/// A specialized `Result` type for pipeline operations at the application
/// boundary.
pub type AppResult<T> = Result<T, AppError>;
