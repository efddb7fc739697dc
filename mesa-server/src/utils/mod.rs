//! Utility modules
//!
//! - [`error`] - unified `AppError` / `AppResponse`
//! - [`logger`] - tracing setup
//! - [`result`] - `AppResult` alias
//! - [`time`] - business-timezone conversions
//! - [`validation`] - input validation helpers

pub mod error;
pub mod logger;
pub mod result;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse};
pub use result::AppResult;
