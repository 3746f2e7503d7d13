//! Attendance capture - roster fetch and the all-or-nothing bulk upsert.
//!
//! A roster is always resolved through an allocation owned by the requesting
//! teacher; the class and subject come from that allocation, never from the form.

use crate::{
    core::{allocation::{AllocationDetail, allocation_for_teacher}, student::students_in_class},
    entities::{Attendance, AttendanceStatus, Student, attendance},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// Prefix of the per-student form fields, e.g. `status_S1=Present`.
pub const STATUS_FIELD_PREFIX: &str = "status_";

/// One line of the marking sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub student_id: String,
    pub name: String,
    /// Status already on record for the date, `Absent` when nothing was marked
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    pub allocation: AllocationDetail,
    pub date: NaiveDate,
    pub students: Vec<RosterEntry>,
}

/// Parses a `YYYY-MM-DD` form value.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidField {
        field: "date",
        value: value.to_string(),
    })
}

/// Collects the `status_<student id>` fields of a marking form.
///
/// Other fields are ignored. Entries come back sorted by student id.
///
/// # Errors
/// [`Error::InvalidField`] when a status value is neither `Present` nor `Absent`.
pub fn parse_status_fields(form: &HashMap<String, String>) -> Result<Vec<(String, AttendanceStatus)>> {
    let mut entries = Vec::new();
    for (key, value) in form {
        let Some(student_id) = key.strip_prefix(STATUS_FIELD_PREFIX) else {
            continue;
        };
        if student_id.is_empty() {
            continue;
        }
        let status = AttendanceStatus::parse(value).ok_or_else(|| Error::InvalidField {
            field: "status",
            value: value.clone(),
        })?;
        entries.push((student_id.to_string(), status));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Lists the cohort of an allocation with the statuses recorded for `date`.
#[instrument(skip(db))]
pub async fn fetch_roster(
    db: &DatabaseConnection,
    allocation_id: i64,
    username: &str,
    date: NaiveDate,
) -> Result<Roster> {
    let allocation = allocation_for_teacher(db, allocation_id, username).await?;
    let students = students_in_class(db, &allocation.class()).await?;

    let recorded: HashMap<String, AttendanceStatus> = Attendance::find()
        .filter(attendance::Column::SubjectId.eq(allocation.subject_id))
        .filter(attendance::Column::Date.eq(date))
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.student_id, row.status))
        .collect();

    let students = students
        .into_iter()
        .map(|student| RosterEntry {
            status: recorded
                .get(&student.id)
                .copied()
                .unwrap_or(AttendanceStatus::Absent),
            student_id: student.id,
            name: student.name,
        })
        .collect();

    Ok(Roster {
        allocation,
        date,
        students,
    })
}

/// Inserts or overwrites one status per student for (`subject_id`, `date`).
///
/// The whole batch shares one transaction. An unknown student id, or any
/// database failure, rolls every entry back.
#[instrument(skip(db, entries), fields(entries = entries.len()))]
pub async fn save_attendance(
    db: &DatabaseConnection,
    subject_id: i64,
    date: NaiveDate,
    entries: &[(String, AttendanceStatus)],
    marked_by: &str,
) -> Result<usize> {
    let txn = db.begin().await?;

    for (student_id, status) in entries {
        if Student::find_by_id(student_id.clone()).one(&txn).await?.is_none() {
            error!(student_id = %student_id, "Attendance batch rejected");
            return Err(Error::NotFound {
                entity: "Student",
                key: student_id.clone(),
            });
        }

        let row = attendance::ActiveModel {
            student_id: Set(student_id.clone()),
            date: Set(date),
            subject_id: Set(subject_id),
            status: Set(*status),
            marked_by: Set(Some(marked_by.to_string())),
            ..Default::default()
        };
        Attendance::insert(row)
            .on_conflict(
                OnConflict::columns([
                    attendance::Column::StudentId,
                    attendance::Column::Date,
                    attendance::Column::SubjectId,
                ])
                .update_columns([attendance::Column::Status, attendance::Column::MarkedBy])
                .to_owned(),
            )
            .exec(&txn)
            .await?;
        debug!(student_id = %student_id, status = status.as_str(), "Attendance upserted");
    }

    txn.commit().await?;
    info!(subject_id, %date, "Attendance saved");
    Ok(entries.len())
}

/// Teacher entry point: checks ownership of the allocation, then saves the batch.
pub async fn mark_attendance(
    db: &DatabaseConnection,
    allocation_id: i64,
    username: &str,
    date: NaiveDate,
    entries: &[(String, AttendanceStatus)],
) -> Result<usize> {
    let allocation = allocation_for_teacher(db, allocation_id, username).await?;
    save_attendance(db, allocation.subject_id, date, entries, username).await
}
