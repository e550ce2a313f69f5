//! Lesson business logic - Training content and per-designer progress.

use crate::{
    core::user,
    entities::{Lesson, LessonProgress, lesson, lesson_progress},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use std::collections::HashMap;

/// Input for creating (`id: None`) or updating a lesson.
#[derive(Debug, Clone, Default)]
pub struct LessonUpsert {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    /// Position in the list; new lessons go last and updates keep their place when None
    pub order_index: Option<i32>,
}

/// A lesson as seen by one designer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonWithProgress {
    pub lesson: lesson::Model,
    pub viewed: bool,
    pub viewed_at: Option<DateTime<Utc>>,
}

/// Lists all lessons in display order.
pub async fn list_lessons(db: &DatabaseConnection) -> Result<Vec<lesson::Model>> {
    Lesson::find()
        .order_by_asc(lesson::Column::OrderIndex)
        .order_by_asc(lesson::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates or updates a lesson.
///
/// # Errors
/// * `Error::Validation` for a blank title or video URL, or a negative position
/// * `Error::NotFound` when updating an id that does not exist
pub async fn upsert_lesson(db: &DatabaseConnection, input: LessonUpsert) -> Result<lesson::Model> {
    if input.title.trim().is_empty() {
        return Err(Error::validation("Lesson title cannot be empty"));
    }
    if input.video_url.trim().is_empty() {
        return Err(Error::validation("Lesson video URL cannot be empty"));
    }
    if input.order_index.is_some_and(|i| i < 0) {
        return Err(Error::validation("Lesson position must be non-negative"));
    }

    let description = input
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let saved = match input.id {
        Some(id) => {
            let mut active_model: lesson::ActiveModel = Lesson::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| Error::not_found("Lesson", id))?
                .into();
            active_model.title = Set(input.title.trim().to_string());
            active_model.description = Set(description);
            active_model.video_url = Set(input.video_url.trim().to_string());
            if let Some(order_index) = input.order_index {
                active_model.order_index = Set(order_index);
            }
            active_model.update(db).await?
        }
        None => {
            let order_index = match input.order_index {
                Some(order_index) => order_index,
                None => Lesson::find().count(db).await?.try_into()?,
            };
            lesson::ActiveModel {
                title: Set(input.title.trim().to_string()),
                description: Set(description),
                video_url: Set(input.video_url.trim().to_string()),
                order_index: Set(order_index),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    tracing::info!(lesson_id = saved.id, "Saved lesson {}", saved.title);
    Ok(saved)
}

/// Deletes a lesson together with every designer's progress on it.
///
/// # Errors
/// Returns `Error::NotFound` if the lesson does not exist.
pub async fn delete_lesson(db: &DatabaseConnection, lesson_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Lesson::find_by_id(lesson_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Lesson", lesson_id))?;

    LessonProgress::delete_many()
        .filter(lesson_progress::Column::LessonId.eq(lesson_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;

    txn.commit().await?;
    tracing::info!(lesson_id, "Deleted lesson");
    Ok(())
}

/// Lists lessons in display order with the designer's viewed state.
pub async fn list_lessons_with_progress(
    db: &DatabaseConnection,
    designer_id: i64,
) -> Result<Vec<LessonWithProgress>> {
    let progress: HashMap<i64, lesson_progress::Model> = LessonProgress::find()
        .filter(lesson_progress::Column::DesignerId.eq(designer_id))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.lesson_id, p))
        .collect();

    Ok(list_lessons(db)
        .await?
        .into_iter()
        .map(|lesson| {
            let state = progress.get(&lesson.id);
            LessonWithProgress {
                viewed: state.is_some_and(|p| p.viewed),
                viewed_at: state.and_then(|p| p.viewed_at),
                lesson,
            }
        })
        .collect())
}

async fn find_progress<C>(
    db: &C,
    designer_id: i64,
    lesson_id: i64,
) -> Result<Option<lesson_progress::Model>>
where
    C: ConnectionTrait,
{
    LessonProgress::find()
        .filter(lesson_progress::Column::LessonId.eq(lesson_id))
        .filter(lesson_progress::Column::DesignerId.eq(designer_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Marks a lesson as viewed by a designer, creating the progress row on first view.
///
/// Repeated views return the stored progress with its original `viewed_at`.
/// The lookup and the write share one transaction, and the schema keeps a
/// single progress row per (lesson, designer).
///
/// # Errors
/// Returns `Error::NotFound` if the lesson or the designer does not exist.
pub async fn mark_lesson_viewed(
    db: &DatabaseConnection,
    designer_id: i64,
    lesson_id: i64,
) -> Result<lesson_progress::Model> {
    let txn = db.begin().await?;

    Lesson::find_by_id(lesson_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Lesson", lesson_id))?;
    user::require_user(&txn, designer_id).await?;

    let progress = match find_progress(&txn, designer_id, lesson_id).await? {
        Some(progress) if progress.viewed => {
            tracing::debug!(lesson_id, designer_id, "Lesson already viewed");
            return Ok(progress);
        }
        Some(progress) => {
            LessonProgress::update_many()
                .col_expr(lesson_progress::Column::Viewed, Expr::value(true))
                .col_expr(
                    lesson_progress::Column::ViewedAt,
                    Expr::value(Some(Utc::now())),
                )
                .filter(lesson_progress::Column::Id.eq(progress.id))
                .filter(lesson_progress::Column::Viewed.eq(false))
                .exec(&txn)
                .await?;
            LessonProgress::find_by_id(progress.id)
                .one(&txn)
                .await?
                .ok_or_else(|| Error::not_found("LessonProgress", progress.id))?
        }
        None => {
            lesson_progress::ActiveModel {
                lesson_id: Set(lesson_id),
                designer_id: Set(designer_id),
                viewed: Set(true),
                viewed_at: Set(Some(Utc::now())),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;
    tracing::info!(lesson_id, designer_id, "Lesson viewed");
    Ok(progress)
}

/// Marks a progress row as viewed by its id, on behalf of its designer.
///
/// # Errors
/// * `Error::NotFound` if the progress row does not exist
/// * `Error::Unauthorized` if it belongs to another designer
pub async fn mark_progress_viewed(
    db: &DatabaseConnection,
    designer_id: i64,
    progress_id: i64,
) -> Result<lesson_progress::Model> {
    let progress = LessonProgress::find_by_id(progress_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("LessonProgress", progress_id))?;
    if progress.designer_id != designer_id {
        tracing::warn!(progress_id, designer_id, "Refused to update another designer's progress");
        return Err(Error::unauthorized(format!(
            "Lesson progress {progress_id} belongs to another designer"
        )));
    }
    mark_lesson_viewed(db, designer_id, progress.lesson_id).await
}
