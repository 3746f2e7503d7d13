//! Core business logic - framework-agnostic attendance, roster and reporting operations.
//!
//! Every function takes a `SeaORM` connection and returns plain data, so the same
//! logic backs the HTTP handlers and the tests.

/// Allocation of teachers to subject/class sections
pub mod allocation;
/// Attendance roster fetch and bulk upsert
pub mod attendance;
/// Password hashing, credential checks and role resolution
pub mod auth;
/// Typed filters for listing endpoints
pub mod filter;
/// Class and student attendance reports
pub mod report;
/// Server-side login sessions
pub mod session;
/// Student management
pub mod student;
/// Subject management
pub mod subject;
/// Teacher management
pub mod teacher;

use crate::errors::{Error, Result};

/// Trims a form value and rejects it when nothing is left.
pub(crate) fn required(value: &str, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Rounds a percentage to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100` rounded to two decimals, or 0 when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}
