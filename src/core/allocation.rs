//! Allocation business logic - which teacher teaches which subject to which class.

use crate::{
    core::{auth::ADMIN_USERNAME, required, student::ClassKey},
    entities::{Allocation, Subject, Teacher, allocation, subject},
    errors::{Error, Result},
};
use sea_orm::{FromQueryResult, JoinType, QueryOrder, QuerySelect, RelationTrait, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Form payload for a new allocation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAllocation {
    pub teacher_username: String,
    pub subject_id: i64,
    pub year: String,
    pub semester: String,
    pub section: String,
}

/// An allocation joined with its subject, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct AllocationDetail {
    pub id: i64,
    pub teacher_username: String,
    pub subject_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub year: String,
    pub semester: String,
    pub section: String,
}

impl AllocationDetail {
    #[must_use]
    pub fn class(&self) -> ClassKey {
        ClassKey {
            year: self.year.clone(),
            semester: self.semester.clone(),
            section: self.section.clone(),
        }
    }
}

fn detail_query() -> Select<Allocation> {
    Allocation::find()
        .select_only()
        .column(allocation::Column::Id)
        .column(allocation::Column::TeacherUsername)
        .column(allocation::Column::SubjectId)
        .column_as(subject::Column::Code, "subject_code")
        .column_as(subject::Column::Name, "subject_name")
        .column(allocation::Column::Year)
        .column(allocation::Column::Semester)
        .column(allocation::Column::Section)
        .join(JoinType::InnerJoin, allocation::Relation::Subject.def())
}

/// Allocates a subject to a teacher for one class section.
///
/// # Errors
/// [`Error::Duplicate`] when the exact (teacher, subject, class) tuple exists;
/// [`Error::NotFound`] for an unknown teacher or subject.
#[instrument(skip(db, new), fields(teacher = %new.teacher_username, subject_id = new.subject_id))]
pub async fn allocate_subject(db: &DatabaseConnection, new: NewAllocation) -> Result<allocation::Model> {
    let teacher_username = required(&new.teacher_username, "teacher_username")?;
    let class = ClassKey::new(&new.year, &new.semester, &new.section)?;

    if teacher_username == ADMIN_USERNAME
        || Teacher::find_by_id(teacher_username.clone()).one(db).await?.is_none()
    {
        return Err(Error::NotFound {
            entity: "Teacher",
            key: teacher_username,
        });
    }
    if Subject::find_by_id(new.subject_id).one(db).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Subject",
            key: new.subject_id.to_string(),
        });
    }

    let duplicate_key = format!(
        "{teacher_username}/{}/{}/{}/{}",
        new.subject_id, class.year, class.semester, class.section
    );
    let existing = Allocation::find()
        .filter(allocation::Column::TeacherUsername.eq(teacher_username.as_str()))
        .filter(allocation::Column::SubjectId.eq(new.subject_id))
        .filter(allocation::Column::Year.eq(class.year.as_str()))
        .filter(allocation::Column::Semester.eq(class.semester.as_str()))
        .filter(allocation::Column::Section.eq(class.section.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        warn!("Duplicate allocation rejected");
        return Err(Error::Duplicate {
            entity: "Allocation",
            key: duplicate_key,
        });
    }

    let allocation = allocation::ActiveModel {
        teacher_username: Set(teacher_username),
        subject_id: Set(new.subject_id),
        year: Set(class.year),
        semester: Set(class.semester),
        section: Set(class.section),
        ..Default::default()
    };
    let created = allocation.insert(db).await.map_err(|e| {
        if Error::is_unique_violation(&e) {
            Error::Duplicate {
                entity: "Allocation",
                key: duplicate_key.clone(),
            }
        } else {
            e.into()
        }
    })?;
    info!(allocation_id = created.id, "Subject allocated");
    Ok(created)
}

/// Every allocation, ordered by teacher, class and subject name.
pub async fn list_allocations(db: &DatabaseConnection) -> Result<Vec<AllocationDetail>> {
    detail_query()
        .order_by_asc(allocation::Column::TeacherUsername)
        .order_by_asc(allocation::Column::Year)
        .order_by_asc(allocation::Column::Semester)
        .order_by_asc(allocation::Column::Section)
        .order_by_asc(subject::Column::Name)
        .into_model::<AllocationDetail>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// A teacher's own allocations, ordered by class and subject name.
pub async fn allocations_for_teacher(db: &DatabaseConnection, username: &str) -> Result<Vec<AllocationDetail>> {
    detail_query()
        .filter(allocation::Column::TeacherUsername.eq(username))
        .order_by_asc(allocation::Column::Year)
        .order_by_asc(allocation::Column::Semester)
        .order_by_asc(allocation::Column::Section)
        .order_by_asc(subject::Column::Name)
        .into_model::<AllocationDetail>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up an allocation only if it belongs to `username`.
///
/// # Errors
/// [`Error::InvalidAllocation`] when the id is unknown or owned by someone else.
pub async fn allocation_for_teacher(
    db: &DatabaseConnection,
    allocation_id: i64,
    username: &str,
) -> Result<AllocationDetail> {
    detail_query()
        .filter(allocation::Column::Id.eq(allocation_id))
        .filter(allocation::Column::TeacherUsername.eq(username))
        .into_model::<AllocationDetail>()
        .one(db)
        .await?
        .ok_or(Error::InvalidAllocation)
}

#[instrument(skip(db))]
pub async fn remove_allocation(db: &DatabaseConnection, allocation_id: i64) -> Result<()> {
    let result = Allocation::delete_by_id(allocation_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Allocation",
            key: allocation_id.to_string(),
        });
    }
    info!("Allocation removed");
    Ok(())
}
