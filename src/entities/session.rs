//! Session entity - Server-side login sessions keyed by a random cookie token.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which dashboard a session is allowed into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "student")]
    Student,
}

impl Role {
    /// Parses the login form's `user_type` field.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Random UUID sent back as the `session` cookie
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub role: Role,
    /// Teacher username or student id
    pub identity: String,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

/// Sessions reference their owner by role-dependent identity, so no foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
