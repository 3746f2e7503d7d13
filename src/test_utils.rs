//! Shared test utilities for `AttendanceBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        allocation::{NewAllocation, allocate_subject},
        attendance::{parse_date, save_attendance},
        student::{ClassKey, NewStudent, add_student},
        subject::add_subject,
        teacher::add_teacher,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

pub use crate::entities::AttendanceStatus;

/// Password used for every fixture account.
pub const TEST_PASSWORD: &str = "secret";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

pub async fn create_test_teacher(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<entities::teacher::Model> {
    add_teacher(db, username, password).await
}

/// Creates a student with [`TEST_PASSWORD`].
///
/// `class` is `(year, semester, section)`.
pub async fn create_test_student(
    db: &DatabaseConnection,
    id: &str,
    name: &str,
    class: (&str, &str, &str),
) -> Result<entities::student::Model> {
    add_student(
        db,
        NewStudent {
            id: id.to_string(),
            name: name.to_string(),
            year: class.0.to_string(),
            semester: class.1.to_string(),
            section: class.2.to_string(),
            password: TEST_PASSWORD.to_string(),
        },
    )
    .await
}

pub async fn create_test_subject(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
) -> Result<entities::subject::Model> {
    add_subject(db, code, name).await
}

pub async fn create_test_allocation(
    db: &DatabaseConnection,
    teacher: &str,
    subject_id: i64,
    class: &ClassKey,
) -> Result<entities::allocation::Model> {
    allocate_subject(
        db,
        NewAllocation {
            teacher_username: teacher.to_string(),
            subject_id,
            year: class.year.clone(),
            semester: class.semester.clone(),
            section: class.section.clone(),
        },
    )
    .await
}

/// A teacher allocated one subject for one populated class.
#[derive(Debug, Clone)]
pub struct ClassFixture {
    pub teacher: String,
    pub subject_id: i64,
    pub allocation_id: i64,
    pub class: ClassKey,
}

/// Builds the standard class used across tests.
///
/// # Defaults
/// * teacher `mrsmith`
/// * subject `CS201` "Data Structures"
/// * class year 2, semester 1, section A
/// * students S1 Asha, S2 Bilal, S3 Chen
pub async fn setup_class_fixture(db: &DatabaseConnection) -> Result<ClassFixture> {
    let teacher = create_test_teacher(db, "mrsmith", TEST_PASSWORD).await?;
    let subject = create_test_subject(db, "CS201", "Data Structures").await?;
    let class = ClassKey::new("2", "1", "A")?;
    for (id, name) in [("S1", "Asha"), ("S2", "Bilal"), ("S3", "Chen")] {
        create_test_student(db, id, name, ("2", "1", "A")).await?;
    }
    let allocation = create_test_allocation(db, &teacher.username, subject.id, &class).await?;

    Ok(ClassFixture {
        teacher: teacher.username,
        subject_id: subject.id,
        allocation_id: allocation.id,
        class,
    })
}

/// Records statuses for `date` as the fixture's teacher.
pub async fn mark_test_attendance(
    db: &DatabaseConnection,
    fixture: &ClassFixture,
    date: &str,
    entries: &[(&str, AttendanceStatus)],
) -> Result<usize> {
    let entries: Vec<(String, AttendanceStatus)> = entries
        .iter()
        .map(|(id, status)| ((*id).to_string(), *status))
        .collect();
    save_attendance(db, fixture.subject_id, parse_date(date)?, &entries, &fixture.teacher).await
}
