//! Demand item entity - One catalog line within a demand.
//!
//! `art_type_label`, `points_per_unit` and `variation_points` are snapshots taken
//! when the demand was created. `art_type_id` is not a foreign key: catalog
//! entries may be removed while their demand items remain.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Demand item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "demand_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Demand this item belongs to
    pub demand_id: i64,
    /// Catalog id at creation time
    pub art_type_id: i64,
    /// Catalog label at creation time
    pub art_type_label: String,
    /// Catalog points per unit at creation time
    pub points_per_unit: i64,
    /// Number of units delivered
    pub quantity: i64,
    /// Number of extra format variations, if any
    pub variation_quantity: Option<i64>,
    /// Global variation point value at creation time, if variations were logged
    pub variation_points: Option<i64>,
    /// `points_per_unit * quantity + variation_quantity * variation_points`
    pub total_points: i64,
}

/// Defines relationships between DemandItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one demand
    #[sea_orm(
        belongs_to = "super::demand::Entity",
        from = "Column::DemandId",
        to = "super::demand::Column::Id"
    )]
    Demand,
}

impl Related<super::demand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Demand.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
