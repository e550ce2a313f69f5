//! Lesson entity - Ordered training videos shown to designers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lesson database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    /// Unique identifier for the lesson
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Lesson title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Where the video is hosted
    pub video_url: String,
    /// Position in the lesson list
    pub order_index: i32,
    /// When the lesson was published
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Lesson and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One lesson has many per-designer progress rows
    #[sea_orm(has_many = "super::lesson_progress::Entity")]
    Progress,
}

impl Related<super::lesson_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
