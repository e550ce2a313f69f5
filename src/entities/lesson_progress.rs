//! Lesson progress entity - Per-designer viewed state of a lesson.
//!
//! At most one row exists per (lesson, designer), enforced by the unique index
//! created in [`crate::config::database::create_tables`]. Rows are created on
//! first view, so a missing row means "not viewed".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lesson_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub lesson_id: i64,
    pub designer_id: i64,
    pub viewed: bool,
    pub viewed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id"
    )]
    Lesson,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DesignerId",
        to = "super::user::Column::Id"
    )]
    Designer,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Designer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
