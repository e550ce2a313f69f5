//! User entity - Designers and administrators of the dashboard.
//!
//! Role is fixed when the account is created. Only the `active` flag changes
//! afterwards, and only through an administrator.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// The two account roles. They carry disjoint capability sets and are not ordered.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Role {
    /// Administrator (`ADM`)
    #[sea_orm(string_value = "ADM")]
    #[serde(rename = "ADM")]
    Admin,
    /// Designer (`DESIGNER`)
    #[sea_orm(string_value = "DESIGNER")]
    #[serde(rename = "DESIGNER")]
    Designer,
}

impl Role {
    /// Wire/storage label of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADM",
            Self::Designer => "DESIGNER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, copied into demands and feedback at creation time
    pub name: String,
    /// Account role
    pub role: Role,
    /// Inactive users cannot act and are hidden from pickers
    pub active: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many demands
    #[sea_orm(has_many = "super::demand::Entity")]
    Demands,
    /// One user has many work sessions
    #[sea_orm(has_many = "super::work_session::Entity")]
    WorkSessions,
}

impl Related<super::demand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Demands.def()
    }
}

impl Related<super::work_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
