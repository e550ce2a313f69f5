//! Shared test utilities for `pointboard`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        art_type::{self, ArtTypeUpsert},
        demand::DemandItemInput,
        user,
    },
    entities::{self, Role},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an active designer account.
pub async fn create_test_designer(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    user::create_user(db, name.to_string(), Role::Designer).await
}

/// Creates an active administrator account.
pub async fn create_test_admin(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    user::create_user(db, name.to_string(), Role::Admin).await
}

/// Appends an art type to the catalog.
pub async fn create_test_art_type(
    db: &DatabaseConnection,
    label: &str,
    points: i64,
) -> Result<entities::art_type::Model> {
    art_type::upsert_art_type(
        db,
        ArtTypeUpsert {
            id: None,
            label: label.to_string(),
            points,
        },
    )
    .await
}

/// A demand line without variations.
#[must_use]
pub const fn item(art_type_id: i64, quantity: i64) -> DemandItemInput {
    DemandItemInput {
        art_type_id,
        quantity,
        variation_quantity: None,
    }
}

/// Sets up a database with one administrator and one designer.
/// Returns (db, admin, designer).
pub async fn setup_with_team() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::user::Model,
)> {
    let db = setup_test_db().await?;
    let admin = create_test_admin(&db, "Administrador").await?;
    let designer = create_test_designer(&db, "Davi").await?;
    Ok((db, admin, designer))
}
