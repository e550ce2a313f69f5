//! Art type entity - The catalog of billable design work.
//!
//! `display_order` is a dense ranking used for sorting only; it has no effect
//! on point calculations. Demand items copy the label and point value, so
//! editing or deleting a catalog entry never rewrites history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Art type database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "art_types")]
pub struct Model {
    /// Unique identifier for the art type
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable label (e.g., "Carrossel", "Banner Site")
    pub label: String,
    /// Points awarded per unit
    pub points: i64,
    /// Position in the catalog, `0..n-1`
    pub display_order: i32,
}

/// Art types are referenced by snapshot only, so there are no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
