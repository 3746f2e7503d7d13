//! Student entity - A learner enrolled in exactly one class cohort.
//!
//! The cohort is the (`year`, `semester`, `section`) triple. It can change over
//! time; attendance rows are never rewritten when it does.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Institution-issued student number, also the login name
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name, used for ordering rosters and reports
    pub name: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Academic year (e.g. "2")
    pub year: String,
    /// Semester within the year (e.g. "1")
    pub semester: String,
    /// Section letter or code (e.g. "A")
    pub section: String,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many attendance rows
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
