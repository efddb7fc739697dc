//! Unified Result alias

use crate::utils::AppError;

/// Application-level Result, used by handlers and the booking pipeline
pub type AppResult<T> = Result<T, AppError>;
