//! Database configuration module for `AttendanceBuddy`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Composite uniqueness rules that a single column attribute cannot
//! express are added as explicit unique indexes afterwards.

use crate::core::auth::{ADMIN_USERNAME, hash_password};
use crate::entities::{Allocation, Attendance, Session, Student, Subject, Teacher};
use crate::entities::{allocation, attendance, teacher};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Set,
};
use tracing::{debug, info, instrument};

/// Establishes a connection to the `SQLite` database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables and unique indexes if they do not exist yet.
///
/// Safe to call on every start-up.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = vec![
        schema.create_table_from_entity(Teacher),
        schema.create_table_from_entity(Student),
        schema.create_table_from_entity(Subject),
        schema.create_table_from_entity(Allocation),
        schema.create_table_from_entity(Attendance),
        schema.create_table_from_entity(Session),
    ];
    for table in &mut tables {
        db.execute(builder.build(table.if_not_exists())).await?;
    }

    let allocation_unique = Index::create()
        .name("idx_allocation_unique")
        .table(Allocation)
        .col(allocation::Column::TeacherUsername)
        .col(allocation::Column::SubjectId)
        .col(allocation::Column::Year)
        .col(allocation::Column::Semester)
        .col(allocation::Column::Section)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&allocation_unique)).await?;

    let attendance_unique = Index::create()
        .name("idx_attendance_student_date_subject")
        .table(Attendance)
        .col(attendance::Column::StudentId)
        .col(attendance::Column::Date)
        .col(attendance::Column::SubjectId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&attendance_unique)).await?;

    info!("Database tables ensured.");
    Ok(())
}

/// Inserts the `admin` teacher account when it does not exist.
///
/// Returns `true` if the account was created by this call.
#[instrument(skip(db, default_password))]
pub async fn seed_default_admin(db: &DatabaseConnection, default_password: &str) -> Result<bool> {
    if Teacher::find_by_id(ADMIN_USERNAME.to_string())
        .one(db)
        .await?
        .is_some()
    {
        debug!("Admin account already present, skipping seed.");
        return Ok(false);
    }

    teacher::ActiveModel {
        username: Set(ADMIN_USERNAME.to_string()),
        password_hash: Set(hash_password(default_password)?),
    }
    .insert(db)
    .await?;
    info!("Seeded default admin account.");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::verify_password;
    use crate::entities::{AttendanceModel, SessionModel, StudentModel, SubjectModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<StudentModel> = Student::find().limit(1).all(&db).await?;
        let _: Vec<SubjectModel> = Subject::find().limit(1).all(&db).await?;
        let _: Vec<AttendanceModel> = Attendance::find().limit(1).all(&db).await?;
        let _: Vec<SessionModel> = Session::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_default_admin_once() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        assert!(seed_default_admin(&db, "admin123").await?);
        assert!(!seed_default_admin(&db, "other").await?);

        let admin = Teacher::find_by_id(ADMIN_USERNAME.to_string())
            .one(&db)
            .await?
            .ok_or(crate::errors::Error::MissingField { field: "admin" })?;
        assert!(verify_password("admin123", &admin.password_hash));
        assert!(!verify_password("other", &admin.password_hash));
        Ok(())
    }
}
