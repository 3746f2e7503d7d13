//! Report generation business logic.
//!
//! Class reports and student summaries are aggregate queries over the
//! attendance table, run as bound-parameter SQL. The functions return plain
//! data; [`crate::export`] turns the tabular forms into files.

use crate::{
    core::{auth::ADMIN_USERNAME, percentage, student::ClassKey},
    entities::{Allocation, Attendance, AttendanceStatus, Student, Subject, Teacher, attendance, subject, teacher},
    errors::{Error, Result},
    export::Table,
};
use chrono::NaiveDate;
use sea_orm::{
    FromQueryResult, JoinType, PaginatorTrait, QueryOrder, QuerySelect, RelationTrait, Statement,
    prelude::*,
};
use serde::Serialize;
use tracing::{debug, instrument};

/// Column headers of a class report export.
pub const CLASS_REPORT_COLUMNS: [&str; 5] = [
    "MIS Number",
    "Name",
    "Classes Attended",
    "Total Classes",
    "Attendance %",
];

/// Column headers of a student's detailed report export.
pub const STUDENT_REPORT_COLUMNS: [&str; 3] = ["Date", "Subject", "Status"];

const TOTAL_CLASSES_SQL: &str = "SELECT COUNT(DISTINCT date) AS total FROM attendance WHERE subject_id = ?";

const CLASS_ATTENDED_SQL: &str = r"
SELECT s.id AS student_id, s.name AS name,
       COALESCE(SUM(CASE WHEN a.status = 'Present' THEN 1 ELSE 0 END), 0) AS attended
FROM students s
LEFT JOIN attendance a ON s.id = a.student_id AND a.subject_id = ?
WHERE s.year = ? AND s.semester = ? AND s.section = ?
GROUP BY s.id, s.name
ORDER BY s.name";

const STUDENT_SUBJECTS_SQL: &str = r"
SELECT sub.code AS subject_code, sub.name AS subject_name,
       COUNT(DISTINCT a.date) AS total,
       (SELECT COUNT(*) FROM attendance p
         WHERE p.student_id = ? AND p.subject_id = a.subject_id AND p.status = 'Present') AS present
FROM attendance a
JOIN subjects sub ON a.subject_id = sub.id
JOIN students st ON a.student_id = st.id
WHERE st.year = ? AND st.semester = ? AND st.section = ?
GROUP BY a.subject_id, sub.code, sub.name
ORDER BY sub.name";

#[derive(Debug, FromQueryResult)]
struct TotalRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct SubjectTotalsRow {
    subject_code: String,
    subject_name: String,
    present: i64,
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct AttendedRow {
    student_id: String,
    name: String,
    attended: i64,
}

/// One student's line in a class report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReportRow {
    pub student_id: String,
    pub name: String,
    pub attended: i64,
    pub total_classes: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReport {
    pub total_classes: i64,
    pub rows: Vec<ClassReportRow>,
}

impl ClassReport {
    #[must_use]
    pub fn to_table(&self) -> Table {
        Table::new(
            &CLASS_REPORT_COLUMNS,
            self.rows
                .iter()
                .map(|row| {
                    vec![
                        row.student_id.clone(),
                        row.name.clone(),
                        row.attended.to_string(),
                        row.total_classes.to_string(),
                        format!("{:.2}", row.percent),
                    ]
                })
                .collect(),
        )
        .with_numeric(&CLASS_REPORT_COLUMNS[2..])
    }
}

/// Per-subject line of a student summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject_code: String,
    pub subject_name: String,
    pub present: i64,
    pub total: i64,
    pub percent: f64,
}

/// One attendance row as shown to the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub subject_name: String,
    pub status: AttendanceStatus,
}

/// Everything the student dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub name: String,
    pub subjects: Vec<SubjectSummary>,
    pub records: Vec<AttendanceRecord>,
    pub total_present: i64,
    pub total_classes: i64,
    pub overall_percent: f64,
}

/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub teachers: u64,
    pub students: u64,
    pub subjects: u64,
    pub allocations: u64,
}

/// Attendance percentages for every student currently in `class`.
///
/// `total_classes` counts every date with any row for the subject, across all
/// sections. A subject never marked yields no rows at all.
#[instrument(skip(db))]
pub async fn class_report(db: &DatabaseConnection, class: &ClassKey, subject_id: i64) -> Result<ClassReport> {
    let backend = db.get_database_backend();

    let total_classes = TotalRow::find_by_statement(Statement::from_sql_and_values(
        backend,
        TOTAL_CLASSES_SQL,
        [subject_id.into()],
    ))
    .one(db)
    .await?
    .map_or(0, |row| row.total);

    if total_classes == 0 {
        debug!("No attendance recorded for subject");
        return Ok(ClassReport {
            total_classes: 0,
            rows: Vec::new(),
        });
    }

    let rows = AttendedRow::find_by_statement(Statement::from_sql_and_values(
        backend,
        CLASS_ATTENDED_SQL,
        [
            subject_id.into(),
            class.year.as_str().into(),
            class.semester.as_str().into(),
            class.section.as_str().into(),
        ],
    ))
    .all(db)
    .await?
    .into_iter()
    .map(|row| ClassReportRow {
        percent: percentage(row.attended, total_classes),
        student_id: row.student_id,
        name: row.name,
        attended: row.attended,
        total_classes,
    })
    .collect();

    Ok(ClassReport { total_classes, rows })
}

/// Every attendance row of a student, newest first.
pub async fn student_records(db: &DatabaseConnection, student_id: &str) -> Result<Vec<AttendanceRecord>> {
    Attendance::find()
        .select_only()
        .column(attendance::Column::Date)
        .column_as(subject::Column::Name, "subject_name")
        .column(attendance::Column::Status)
        .join(JoinType::InnerJoin, attendance::Relation::Subject.def())
        .filter(attendance::Column::StudentId.eq(student_id))
        .order_by_desc(attendance::Column::Date)
        .order_by_asc(subject::Column::Name)
        .into_model::<AttendanceRecord>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Builds the student dashboard: per-subject percentages plus the raw records.
///
/// Subject totals count dates on which anyone in the student's current cohort
/// was marked. The overall figure is total present over total classes, not an
/// average of the per-subject percentages.
#[instrument(skip(db))]
pub async fn student_summary(db: &DatabaseConnection, student_id: &str) -> Result<StudentSummary> {
    let student = Student::find_by_id(student_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Student",
            key: student_id.to_string(),
        })?;

    let subjects: Vec<SubjectSummary> = SubjectTotalsRow::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        STUDENT_SUBJECTS_SQL,
        [
            student.id.as_str().into(),
            student.year.as_str().into(),
            student.semester.as_str().into(),
            student.section.as_str().into(),
        ],
    ))
    .all(db)
    .await?
    .into_iter()
    .map(|row| SubjectSummary {
        percent: percentage(row.present, row.total),
        subject_code: row.subject_code,
        subject_name: row.subject_name,
        present: row.present,
        total: row.total,
    })
    .collect();

    let total_present = subjects.iter().map(|s| s.present).sum();
    let total_classes = subjects.iter().map(|s| s.total).sum();
    let records = student_records(db, &student.id).await?;

    Ok(StudentSummary {
        student_id: student.id,
        name: student.name,
        subjects,
        records,
        total_present,
        total_classes,
        overall_percent: percentage(total_present, total_classes),
    })
}

/// Tabular form of a student's records for export.
#[must_use]
pub fn records_table(records: &[AttendanceRecord]) -> Table {
    Table::new(
        &STUDENT_REPORT_COLUMNS,
        records
            .iter()
            .map(|r| {
                vec![
                    r.date.format("%Y-%m-%d").to_string(),
                    r.subject_name.clone(),
                    r.status.as_str().to_string(),
                ]
            })
            .collect(),
    )
}

pub async fn overview(db: &DatabaseConnection) -> Result<Overview> {
    Ok(Overview {
        teachers: Teacher::find()
            .filter(teacher::Column::Username.ne(ADMIN_USERNAME))
            .count(db)
            .await?,
        students: Student::find().count(db).await?,
        subjects: Subject::find().count(db).await?,
        allocations: Allocation::find().count(db).await?,
    })
}
