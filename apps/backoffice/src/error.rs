//! # CLI Error Type
//!
//! Every command returns `Result<T, AppError>`. On failure `main` prints the
//! error as JSON on stdout and exits non-zero:
//!
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for product 5f0c…: available 2, requested 3"
//! }
//! ```
//!
//! The five domain codes mirror [`ErrorKind`]; `CONFIG_ERROR` and
//! `INVALID_INPUT` cover failures that happen before the store is touched.

use serde::Serialize;

use grocer_core::{CoreError, ErrorKind, ValidationError};
use grocer_db::DbError;

use crate::config::ConfigError;

/// Error printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailure,
    ReferenceNotFound,
    InsufficientStock,
    AlreadyExists,
    PersistenceFailure,

    /// Config file or environment is unusable
    ConfigError,

    /// Unreadable or malformed input file
    InvalidInput,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::ValidationFailure => ErrorCode::ValidationFailure,
            ErrorKind::ReferenceNotFound => ErrorCode::ReferenceNotFound,
            ErrorKind::InsufficientStock => ErrorCode::InsufficientStock,
            ErrorKind::AlreadyExists => ErrorCode::AlreadyExists,
            ErrorKind::PersistenceFailure => ErrorCode::PersistenceFailure,
        }
    }
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::InvalidInput, message)
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::PersistenceFailure => 3,
            ErrorCode::ConfigError => 4,
            _ => 2,
        }
    }

    /// JSON body; falls back to the bare message if serialization fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let code = ErrorCode::from(err.kind());
        if code == ErrorCode::PersistenceFailure {
            tracing::error!(error = %err, "Store operation failed");
        }
        AppError::new(code, err.to_string())
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        AppError::from(CoreError::from(err))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::from(CoreError::Validation(err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::invalid_input(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
