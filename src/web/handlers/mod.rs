//! Request handlers, one module per role plus the public login routes.

pub mod admin;
pub mod auth;
pub mod student;
pub mod teacher;

use crate::errors::{Error, Result};
use crate::export::ExportFile;
use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::Notice;

/// Form payload of every change-password endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordForm {
    pub new_password: String,
}

/// A report together with the notice explaining an empty result.
#[derive(Debug, Serialize)]
pub struct ReportResponse<T: Serialize> {
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Parses an integer id taken from a form field.
pub(crate) fn parse_id(value: &str, field: &'static str) -> Result<i64> {
    let value = crate::core::required(value, field)?;
    value.parse().map_err(|_| Error::InvalidField { field, value })
}

/// Filenames are built from user data; keep the header value printable.
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect()
}

impl IntoResponse for ExportFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", header_safe(&self.filename));
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}
