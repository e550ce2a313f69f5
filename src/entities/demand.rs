//! Demand entity - A designer's logged unit of completed work.
//!
//! `total_points` and `total_quantity` are derived from the demand's items when
//! the demand is created and are never accepted from the caller.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Demand database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "demands")]
pub struct Model {
    /// Unique identifier for the demand
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Designer who submitted the demand
    pub user_id: i64,
    /// Designer name at submission time
    pub user_name: String,
    /// Art count: sum of item quantities, variation items excluded
    pub total_quantity: i64,
    /// Sum of item points
    pub total_points: i64,
    /// When the demand was submitted
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between Demand and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each demand belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One demand has many items
    #[sea_orm(has_many = "super::demand_item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::demand_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
