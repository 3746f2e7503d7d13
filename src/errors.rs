//! Unified error type for `AttendanceBuddy`.
//!
//! Every fallible operation in the crate returns [`Result`]. The web layer turns
//! each variant into an HTTP status plus a user-facing notice, so internal
//! details (SQL text, file system paths) never reach the browser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{entity} '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Invalid credentials!")]
    InvalidCredentials,

    #[error("Invalid allocation selected.")]
    InvalidAllocation,

    #[error("Invalid file type: {file_type}")]
    InvalidFileType { file_type: String },

    #[error("Password hashing error: {message}")]
    PasswordHash { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<lopdf::Error> for Error {
    fn from(value: lopdf::Error) -> Self {
        Self::Export {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// Returns true when the underlying database error is a UNIQUE/PRIMARY KEY violation.
    #[must_use]
    pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
        matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
