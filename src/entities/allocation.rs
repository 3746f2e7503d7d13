//! Allocation entity - Assigns one teacher to one subject for one class section.
//!
//! The (`teacher_username`, `subject_id`, `year`, `semester`, `section`) tuple is
//! unique; the index is created alongside the table in `config::database`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allocation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teacher_allocations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Username of the allocated teacher
    pub teacher_username: String,
    /// Subject being taught
    pub subject_id: i64,
    pub year: String,
    pub semester: String,
    pub section: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherUsername",
        to = "super::teacher::Column::Username"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
