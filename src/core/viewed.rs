//! Single entry point for the one-way viewed transition shared by feedback and
//! lesson progress.

use crate::{
    core::{feedback, lesson},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// What a designer is marking as viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewTarget {
    /// A feedback, by feedback id
    Feedback(i64),
    /// A lesson, by lesson id (progress is created on first view)
    Lesson(i64),
    /// An existing lesson progress row, by its id
    LessonProgress(i64),
}

/// Viewed state after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewedState {
    pub target: ViewTarget,
    /// When the target was first viewed; never changes afterwards
    pub viewed_at: Option<DateTime<Utc>>,
}

/// Marks `target` as viewed on behalf of `designer_id`.
///
/// Idempotent: a second call reports the original `viewed_at`.
///
/// # Errors
/// * `Error::NotFound` if the target does not exist
/// * `Error::Unauthorized` if it belongs to another designer
pub async fn mark_viewed(
    db: &DatabaseConnection,
    designer_id: i64,
    target: ViewTarget,
) -> Result<ViewedState> {
    let viewed_at = match target {
        ViewTarget::Feedback(id) => {
            feedback::mark_feedback_viewed(db, designer_id, id)
                .await?
                .viewed_at
        }
        ViewTarget::Lesson(id) => {
            lesson::mark_lesson_viewed(db, designer_id, id)
                .await?
                .viewed_at
        }
        ViewTarget::LessonProgress(id) => {
            lesson::mark_progress_viewed(db, designer_id, id)
                .await?
                .viewed_at
        }
    };
    Ok(ViewedState { target, viewed_at })
}
