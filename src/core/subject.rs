//! Subject business logic - the subject catalogue and its cascading removal.

use crate::{
    core::required,
    entities::{Allocation, Attendance, Subject, allocation, attendance, subject},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// What a subject removal took with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubjectRemoval {
    pub allocations_removed: u64,
    pub attendance_removed: u64,
}

/// Adds a subject.
///
/// # Errors
/// [`Error::Duplicate`] if the subject code is already used.
#[instrument(skip(db))]
pub async fn add_subject(db: &DatabaseConnection, code: &str, name: &str) -> Result<subject::Model> {
    let code = required(code, "subject_code")?;
    let name = required(name, "subject_name")?;

    let existing = Subject::find()
        .filter(subject::Column::Code.eq(code.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Duplicate {
            entity: "Subject code",
            key: code,
        });
    }

    let subject = subject::ActiveModel {
        code: Set(code.clone()),
        name: Set(name),
        ..Default::default()
    };
    subject.insert(db).await.map_err(|e| {
        if Error::is_unique_violation(&e) {
            Error::Duplicate {
                entity: "Subject code",
                key: code.clone(),
            }
        } else {
            e.into()
        }
    })
}

/// All subjects, ordered by name.
pub async fn list_subjects(db: &DatabaseConnection) -> Result<Vec<subject::Model>> {
    Subject::find()
        .order_by_asc(subject::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn get_subject(db: &DatabaseConnection, subject_id: i64) -> Result<Option<subject::Model>> {
    Subject::find_by_id(subject_id).one(db).await.map_err(Into::into)
}

/// Removes a subject with all of its allocations and attendance rows.
///
/// Runs in one transaction: either everything goes or nothing does.
#[instrument(skip(db))]
pub async fn remove_subject(db: &DatabaseConnection, subject_id: i64) -> Result<SubjectRemoval> {
    let txn = db.begin().await?;

    if Subject::find_by_id(subject_id).one(&txn).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Subject",
            key: subject_id.to_string(),
        });
    }

    let allocations = Allocation::delete_many()
        .filter(allocation::Column::SubjectId.eq(subject_id))
        .exec(&txn)
        .await?;
    let attendance = Attendance::delete_many()
        .filter(attendance::Column::SubjectId.eq(subject_id))
        .exec(&txn)
        .await?;
    Subject::delete_by_id(subject_id).exec(&txn).await?;

    txn.commit().await?;

    let removal = SubjectRemoval {
        allocations_removed: allocations.rows_affected,
        attendance_removed: attendance.rows_affected,
    };
    info!(?removal, "Subject removed");
    Ok(removal)
}
