//! Teacher business logic - account creation, listing, removal and password changes.

use crate::{
    core::{auth::{ADMIN_USERNAME, hash_password}, filter::TeacherFilter, required, session},
    entities::{Allocation, Role, Teacher, allocation, teacher},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Creates a teacher account.
///
/// # Errors
/// [`Error::Duplicate`] if the username is taken; nothing is written in that case.
#[instrument(skip(db, password))]
pub async fn add_teacher(db: &DatabaseConnection, username: &str, password: &str) -> Result<teacher::Model> {
    let username = required(username, "username")?;
    let password = required(password, "password")?;

    if Teacher::find_by_id(username.clone()).one(db).await?.is_some() {
        return Err(Error::Duplicate {
            entity: "Teacher",
            key: username,
        });
    }

    let teacher = teacher::ActiveModel {
        username: Set(username.clone()),
        password_hash: Set(hash_password(&password)?),
    };
    let created = teacher.insert(db).await.map_err(|e| {
        if Error::is_unique_violation(&e) {
            Error::Duplicate {
                entity: "Teacher",
                key: username.clone(),
            }
        } else {
            e.into()
        }
    })?;
    info!("Teacher added");
    Ok(created)
}

/// Lists teachers (never the admin account) ordered by username.
pub async fn list_teachers(db: &DatabaseConnection, filter: &TeacherFilter) -> Result<Vec<teacher::Model>> {
    Teacher::find()
        .filter(filter.to_condition())
        .order_by_asc(teacher::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes a teacher together with their allocations and sessions, atomically.
///
/// Attendance rows they marked are kept.
#[instrument(skip(db))]
pub async fn remove_teacher(db: &DatabaseConnection, username: &str) -> Result<()> {
    if username == ADMIN_USERNAME {
        return Err(Error::InvalidField {
            field: "username",
            value: username.to_string(),
        });
    }

    let txn = db.begin().await?;

    if Teacher::find_by_id(username.to_string()).one(&txn).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Teacher",
            key: username.to_string(),
        });
    }

    let allocations = Allocation::delete_many()
        .filter(allocation::Column::TeacherUsername.eq(username))
        .exec(&txn)
        .await?;
    session::end_sessions_for(&txn, &[Role::Teacher], username).await?;
    Teacher::delete_by_id(username.to_string()).exec(&txn).await?;

    txn.commit().await?;
    info!(allocations_removed = allocations.rows_affected, "Teacher removed");
    Ok(())
}

/// Replaces a teacher's (or the admin's) password.
pub async fn change_teacher_password(db: &DatabaseConnection, username: &str, new_password: &str) -> Result<()> {
    let new_password = required(new_password, "new_password")?;
    let mut teacher: teacher::ActiveModel = Teacher::find_by_id(username.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Teacher",
            key: username.to_string(),
        })?
        .into();

    teacher.password_hash = Set(hash_password(&new_password)?);
    teacher.update(db).await?;
    info!(username = %username, "Teacher password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::verify_teacher;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_add_teacher_rejects_duplicate() -> Result<()> {
        let db = setup_test_db().await?;
        add_teacher(&db, "mrsmith", "pw1").await?;

        let result = add_teacher(&db, "mrsmith", "pw2").await;
        assert!(matches!(result, Err(Error::Duplicate { entity: "Teacher", .. })));

        // The old password still works.
        assert!(verify_teacher(&db, "mrsmith", "pw1").await?);
        assert!(!verify_teacher(&db, "mrsmith", "pw2").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_teacher_requires_fields() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            add_teacher(&db, "  ", "pw").await,
            Err(Error::MissingField { field: "username" })
        ));
        assert!(matches!(
            add_teacher(&db, "mrsmith", "").await,
            Err(Error::MissingField { field: "password" })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_teachers_hides_admin_and_searches() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_teacher(&db, ADMIN_USERNAME, TEST_PASSWORD).await?;
        create_test_teacher(&db, "mrsmith", TEST_PASSWORD).await?;
        create_test_teacher(&db, "msjones", TEST_PASSWORD).await?;

        let all = list_teachers(&db, &TeacherFilter::default()).await?;
        let names: Vec<_> = all.iter().map(|t| t.username.as_str()).collect();
        assert_eq!(names, vec!["mrsmith", "msjones"]);

        let filtered = list_teachers(
            &db,
            &TeacherFilter {
                search: Some("jon".to_string()),
            },
        )
        .await?;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].username, "msjones");
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_teacher_drops_allocations_keeps_attendance() -> Result<()> {
        let db = setup_test_db().await?;
        let fixture = setup_class_fixture(&db).await?;
        mark_test_attendance(&db, &fixture, "2024-01-10", &[("S1", AttendanceStatus::Present)]).await?;

        remove_teacher(&db, &fixture.teacher).await?;

        assert_eq!(Allocation::find().count(&db).await?, 0);
        assert_eq!(crate::entities::Attendance::find().count(&db).await?, 1);
        assert!(Teacher::find_by_id(fixture.teacher.clone()).one(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_admin_is_refused() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_teacher(&db, ADMIN_USERNAME, TEST_PASSWORD).await?;
        assert!(matches!(
            remove_teacher(&db, ADMIN_USERNAME).await,
            Err(Error::InvalidField { .. })
        ));
        assert!(Teacher::find_by_id(ADMIN_USERNAME.to_string()).one(&db).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_unknown_teacher() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            remove_teacher(&db, "ghost").await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_change_teacher_password() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_teacher(&db, "mrsmith", "old").await?;
        change_teacher_password(&db, "mrsmith", "new").await?;
        assert!(verify_teacher(&db, "mrsmith", "new").await?);
        assert!(!verify_teacher(&db, "mrsmith", "old").await?);
        Ok(())
    }
}
