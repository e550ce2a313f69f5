//! Database configuration module for `pointboard`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the database schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    ArtType, Demand, DemandItem, Feedback, FeedbackImage, Lesson, LessonProgress, SystemSettings,
    User, WorkSession, lesson_progress,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use std::env::VarError;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/pointboard.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file when it is unset.
///
/// # Errors
/// Returns `Error::EnvVar` if the variable is set but not valid Unicode.
pub fn get_database_url() -> Result<String> {
    database_url_from(std::env::var("DATABASE_URL"))
}

fn database_url_from(value: std::result::Result<String, VarError>) -> Result<String> {
    match value {
        Ok(url) => Ok(url),
        Err(VarError::NotPresent) => Ok(DEFAULT_DATABASE_URL.to_string()),
        Err(e) => Err(e.into()),
    }
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url()?;
    tracing::debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Tables are created parents first so that foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, User).await?;
    create_table(db, ArtType).await?;
    create_table(db, Demand).await?;
    create_table(db, DemandItem).await?;
    create_table(db, WorkSession).await?;
    create_table(db, Feedback).await?;
    create_table(db, FeedbackImage).await?;
    create_table(db, Lesson).await?;
    create_table(db, LessonProgress).await?;
    create_table(db, SystemSettings).await?;

    // One progress row per (lesson, designer)
    let builder = db.get_database_backend();
    let index = Index::create()
        .name("idx_lesson_progress_lesson_designer")
        .table(LessonProgress)
        .col(lesson_progress::Column::LessonId)
        .col(lesson_progress::Column::DesignerId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&index)).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}
