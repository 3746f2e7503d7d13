//! Maps [`Error`] onto HTTP responses.
//!
//! User mistakes keep their message; server-side failures are logged in full
//! and replaced by a generic notice.

use super::Notice;
use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

impl Error {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::InvalidAllocation
            | Self::InvalidFileType { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Config { .. }
            | Self::Database(_)
            | Self::PasswordHash { .. }
            | Self::Export { .. }
            | Self::Io(_)
            | Self::Zip(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The notice shown to the user for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Duplicate { .. } => Notice::warning(self.to_string()),
            _ if self.status_code().is_server_error() => Notice::danger(GENERIC_FAILURE),
            _ => Notice::danger(self.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(self.notice())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::NoticeLevel;

    #[test]
    fn test_duplicate_is_conflict_warning() {
        let err = Error::Duplicate {
            entity: "Teacher",
            key: "mrsmith".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let notice = err.notice();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "Teacher 'mrsmith' already exists");
    }

    #[test]
    fn test_database_errors_do_not_leak() {
        let err = Error::Database(sea_orm::DbErr::Custom("no such table: secrets".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.notice().message, GENERIC_FAILURE);
    }

    #[test]
    fn test_client_errors_keep_message() {
        assert_eq!(Error::InvalidCredentials.notice().message, "Invalid credentials!");
        assert_eq!(
            Error::InvalidFileType {
                file_type: "docx".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
