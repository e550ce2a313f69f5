//! Feedback entity - An administrator's review note for a designer.
//!
//! The only mutation after creation is the one-way `viewed` transition; once
//! `viewed_at` is stamped it is never rewritten.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Feedback database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    /// Unique identifier for the feedback
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Designer the feedback is addressed to
    pub designer_id: i64,
    /// Designer name at creation time
    pub designer_name: String,
    /// Author name at creation time
    pub admin_name: String,
    /// Review text
    pub comment: String,
    /// When the feedback was written
    pub created_at: DateTimeUtc,
    /// Whether the designer has opened it
    pub viewed: bool,
    /// When the designer first opened it
    pub viewed_at: Option<DateTimeUtc>,
}

/// Defines relationships between Feedback and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each feedback is addressed to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DesignerId",
        to = "super::user::Column::Id"
    )]
    Designer,
    /// One feedback has many attached images
    #[sea_orm(has_many = "super::feedback_image::Entity")]
    Images,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Designer.def()
    }
}

impl Related<super::feedback_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
