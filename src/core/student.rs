//! Student business logic - enrolment, cohort changes, removal and lookups.
//!
//! A student's cohort (`year`, `semester`, `section`) may be edited freely;
//! attendance already recorded stays attached to the student, never to a cohort.

use crate::{
    core::{auth::hash_password, filter::StudentFilter, required, session},
    entities::{Attendance, Role, Student, attendance, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Identifies a class cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassKey {
    pub year: String,
    pub semester: String,
    pub section: String,
}

impl ClassKey {
    pub fn new(year: &str, semester: &str, section: &str) -> Result<Self> {
        Ok(Self {
            year: required(year, "year")?,
            semester: required(semester, "semester")?,
            section: required(section, "section")?,
        })
    }
}

/// Form payload for enrolling a student.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewStudent {
    pub id: String,
    pub name: String,
    pub year: String,
    pub semester: String,
    pub section: String,
    pub password: String,
}

/// Form payload for editing a student. A blank password keeps the old one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudentUpdate {
    pub name: String,
    pub year: String,
    pub semester: String,
    pub section: String,
    pub password: Option<String>,
}

/// Distinct values for the cohort dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassOptions {
    pub years: Vec<String>,
    /// Sections present in the requested year, empty when no year was given
    pub sections: Vec<String>,
}

/// Enrols a student.
///
/// # Errors
/// [`Error::Duplicate`] if the student id is taken; nothing is written in that case.
#[instrument(skip(db, new), fields(student_id = %new.id))]
pub async fn add_student(db: &DatabaseConnection, new: NewStudent) -> Result<student::Model> {
    let id = required(&new.id, "id")?;
    let name = required(&new.name, "name")?;
    let class = ClassKey::new(&new.year, &new.semester, &new.section)?;
    let password = required(&new.password, "password")?;

    if Student::find_by_id(id.clone()).one(db).await?.is_some() {
        return Err(Error::Duplicate {
            entity: "Student",
            key: id,
        });
    }

    let student = student::ActiveModel {
        id: Set(id.clone()),
        name: Set(name),
        password_hash: Set(hash_password(&password)?),
        year: Set(class.year),
        semester: Set(class.semester),
        section: Set(class.section),
    };
    let created = student.insert(db).await.map_err(|e| {
        if Error::is_unique_violation(&e) {
            Error::Duplicate {
                entity: "Student",
                key: id.clone(),
            }
        } else {
            e.into()
        }
    })?;
    info!("Student added");
    Ok(created)
}

pub async fn get_student(db: &DatabaseConnection, student_id: &str) -> Result<Option<student::Model>> {
    Student::find_by_id(student_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists students matching `filter`, ordered by id.
///
/// An empty filter returns no students; the admin has to pick a cohort or search first.
pub async fn list_students(db: &DatabaseConnection, filter: &StudentFilter) -> Result<Vec<student::Model>> {
    if filter.is_empty() {
        return Ok(Vec::new());
    }
    Student::find()
        .filter(filter.to_condition())
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The current members of a cohort, ordered by name.
pub async fn students_in_class(db: &impl ConnectionTrait, class: &ClassKey) -> Result<Vec<student::Model>> {
    Student::find()
        .filter(student::Column::Year.eq(class.year.as_str()))
        .filter(student::Column::Semester.eq(class.semester.as_str()))
        .filter(student::Column::Section.eq(class.section.as_str()))
        .order_by_asc(student::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates name and cohort, and the password when a non-blank one is given.
#[instrument(skip(db, update))]
pub async fn update_student(
    db: &DatabaseConnection,
    student_id: &str,
    update: StudentUpdate,
) -> Result<student::Model> {
    let name = required(&update.name, "name")?;
    let class = ClassKey::new(&update.year, &update.semester, &update.section)?;

    let mut student: student::ActiveModel = get_student(db, student_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Student",
            key: student_id.to_string(),
        })?
        .into();

    student.name = Set(name);
    student.year = Set(class.year);
    student.semester = Set(class.semester);
    student.section = Set(class.section);
    if let Some(password) = update.password.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        student.password_hash = Set(hash_password(password)?);
    }

    let updated = student.update(db).await?;
    info!("Student updated");
    Ok(updated)
}

/// Removes a student and all of their attendance rows in one transaction.
#[instrument(skip(db))]
pub async fn remove_student(db: &DatabaseConnection, student_id: &str) -> Result<()> {
    let txn = db.begin().await?;

    if Student::find_by_id(student_id.to_string()).one(&txn).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Student",
            key: student_id.to_string(),
        });
    }

    let rows = Attendance::delete_many()
        .filter(attendance::Column::StudentId.eq(student_id))
        .exec(&txn)
        .await?;
    session::end_sessions_for(&txn, &[Role::Student], student_id).await?;
    Student::delete_by_id(student_id.to_string()).exec(&txn).await?;

    txn.commit().await?;
    info!(attendance_removed = rows.rows_affected, "Student removed");
    Ok(())
}

pub async fn change_student_password(db: &DatabaseConnection, student_id: &str, new_password: &str) -> Result<()> {
    let new_password = required(new_password, "new_password")?;
    let mut student: student::ActiveModel = get_student(db, student_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Student",
            key: student_id.to_string(),
        })?
        .into();

    student.password_hash = Set(hash_password(&new_password)?);
    student.update(db).await?;
    Ok(())
}

/// Distinct years across all students, plus the sections used in `year`.
pub async fn class_options(db: &DatabaseConnection, year: Option<&str>) -> Result<ClassOptions> {
    let years: Vec<String> = Student::find()
        .select_only()
        .column(student::Column::Year)
        .distinct()
        .order_by_asc(student::Column::Year)
        .into_tuple()
        .all(db)
        .await?;

    let sections: Vec<String> = match year.map(str::trim).filter(|y| !y.is_empty()) {
        Some(year) => {
            Student::find()
                .select_only()
                .column(student::Column::Section)
                .distinct()
                .filter(student::Column::Year.eq(year))
                .order_by_asc(student::Column::Section)
                .into_tuple()
                .all(db)
                .await?
        }
        None => Vec::new(),
    };

    Ok(ClassOptions { years, sections })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::verify_student;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_add_student_rejects_duplicate() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "S1", "Asha", ("2", "1", "A")).await?;

        let result = create_test_student(&db, "S1", "Someone Else", ("3", "2", "B")).await;
        assert!(matches!(result, Err(Error::Duplicate { entity: "Student", .. })));

        let kept = get_student(&db, "S1").await?.ok_or(Error::MissingField { field: "S1" })?;
        assert_eq!(kept.name, "Asha");
        assert_eq!(Student::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_student_requires_cohort() -> Result<()> {
        let db = setup_test_db().await?;
        let result = add_student(
            &db,
            NewStudent {
                id: "S1".to_string(),
                name: "Asha".to_string(),
                year: "2".to_string(),
                semester: String::new(),
                section: "A".to_string(),
                password: TEST_PASSWORD.to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(Error::MissingField { field: "semester" })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_students_filters() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "S1", "Asha", ("2", "1", "A")).await?;
        create_test_student(&db, "S2", "Bilal", ("2", "1", "B")).await?;
        create_test_student(&db, "S3", "Chen", ("3", "1", "A")).await?;

        let unfiltered = list_students(&db, &StudentFilter::default()).await?;
        assert!(unfiltered.is_empty());

        let blank = list_students(
            &db,
            &StudentFilter {
                search: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert!(blank.is_empty());

        let year_two = list_students(
            &db,
            &StudentFilter {
                year: Some("2".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(year_two.len(), 2);

        let search = list_students(
            &db,
            &StudentFilter {
                search: Some("che".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].id, "S3");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_student_changes_cohort_not_history() -> Result<()> {
        let db = setup_test_db().await?;
        let fixture = setup_class_fixture(&db).await?;
        mark_test_attendance(&db, &fixture, "2024-01-10", &[("S1", AttendanceStatus::Present)]).await?;

        let updated = update_student(
            &db,
            "S1",
            StudentUpdate {
                name: "Asha K".to_string(),
                year: "2".to_string(),
                semester: "1".to_string(),
                section: "B".to_string(),
                password: Some("  ".to_string()),
            },
        )
        .await?;
        assert_eq!(updated.section, "B");
        assert!(verify_student(&db, "S1", TEST_PASSWORD).await?);

        let rows = Attendance::find()
            .filter(attendance::Column::StudentId.eq("S1"))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject_id, fixture.subject_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_student_password() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "S1", "Asha", ("2", "1", "A")).await?;
        update_student(
            &db,
            "S1",
            StudentUpdate {
                name: "Asha".to_string(),
                year: "2".to_string(),
                semester: "1".to_string(),
                section: "A".to_string(),
                password: Some("fresh".to_string()),
            },
        )
        .await?;
        assert!(verify_student(&db, "S1", "fresh").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_student_cascades_attendance() -> Result<()> {
        let db = setup_test_db().await?;
        let fixture = setup_class_fixture(&db).await?;
        mark_test_attendance(
            &db,
            &fixture,
            "2024-01-10",
            &[("S1", AttendanceStatus::Present), ("S2", AttendanceStatus::Absent)],
        )
        .await?;

        remove_student(&db, "S1").await?;

        assert!(get_student(&db, "S1").await?.is_none());
        let remaining = Attendance::find().all(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].student_id, "S2");
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_unknown_student() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            remove_student(&db, "nobody").await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_class_options() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "S1", "Asha", ("2", "1", "A")).await?;
        create_test_student(&db, "S2", "Bilal", ("2", "1", "B")).await?;
        create_test_student(&db, "S3", "Chen", ("3", "1", "C")).await?;

        let options = class_options(&db, Some("2")).await?;
        assert_eq!(options.years, vec!["2", "3"]);
        assert_eq!(options.sections, vec!["A", "B"]);

        let no_year = class_options(&db, None).await?;
        assert!(no_year.sections.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_students_in_class_ordered_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "S9", "Zara", ("2", "1", "A")).await?;
        create_test_student(&db, "S1", "Asha", ("2", "1", "A")).await?;
        create_test_student(&db, "S5", "Moe", ("2", "1", "B")).await?;

        let class = ClassKey::new("2", "1", "A")?;
        let roster = students_in_class(&db, &class).await?;
        let names: Vec<_> = roster.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Zara"]);
        Ok(())
    }
}
