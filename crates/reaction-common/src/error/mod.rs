//! Application-level errors

mod app_error;

pub use app_error::{AppError, AppResult, ErrorResponse, EXIT_ABORTED, EXIT_OK, EXIT_PARTIAL};
