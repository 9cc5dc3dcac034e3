//! Server utilities

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult, ok, ok_with_message};
pub use logger::{init_logger, init_logger_with_file};
