//! System settings entity - The singleton configuration record.
//!
//! There is exactly one logical row (`id = 1`). `version` increases by one on
//! every update so callers can detect stale reads.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the singleton row
pub const SETTINGS_ID: i32 = 1;

/// System settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    /// Always [`SETTINGS_ID`]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// Title shown in the header and on the login page
    pub brand_title: Option<String>,
    /// Logo as URL or base64 payload
    #[sea_orm(column_type = "Text", nullable)]
    pub logo_url: Option<String>,
    /// Subtitle shown on the login page
    pub login_subtitle: Option<String>,
    /// Global point value of one format variation
    pub variation_points: Option<i64>,
    /// Incremented on every update, 0 before the first one
    pub version: i64,
    /// When the settings were last modified
    pub updated_at: DateTimeUtc,
}

/// `SystemSettings` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
