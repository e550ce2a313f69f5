//! Feedback business logic - Review notes from administrators to designers.
//!
//! Feedback and its images are written together in one transaction. After that
//! the only change a feedback ever sees is the one-way viewed transition, which
//! is applied with a conditional update so `viewed_at` is stamped exactly once.

use crate::{
    core::user,
    entities::{Feedback, FeedbackImage, Role, feedback, feedback_image},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;

/// A feedback with its images in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRecord {
    pub feedback: feedback::Model,
    pub images: Vec<String>,
}

impl FeedbackRecord {
    fn from_parts(feedback: feedback::Model, mut images: Vec<feedback_image::Model>) -> Self {
        images.sort_by_key(|i| (i.position, i.id));
        Self {
            feedback,
            images: images.into_iter().map(|i| i.data).collect(),
        }
    }
}

/// Creates a feedback from `admin_id` to `designer_id`.
///
/// # Errors
/// * `Error::Validation` if there is neither comment nor image, an image is
///   blank, or the recipient is not a designer
/// * `Error::NotFound` if either user does not exist
pub async fn create_feedback(
    db: &DatabaseConnection,
    admin_id: i64,
    designer_id: i64,
    comment: String,
    images: Vec<String>,
) -> Result<FeedbackRecord> {
    if comment.trim().is_empty() && images.is_empty() {
        return Err(Error::validation(
            "Feedback needs a comment or at least one image",
        ));
    }
    if images.iter().any(|i| i.trim().is_empty()) {
        return Err(Error::validation("Feedback images cannot be empty"));
    }

    let txn = db.begin().await?;

    let admin = user::require_user(&txn, admin_id).await?;
    let designer = user::require_user(&txn, designer_id).await?;
    if designer.role != Role::Designer {
        return Err(Error::validation(format!(
            "Feedback can only be addressed to a designer, user {designer_id} is {}",
            designer.role
        )));
    }

    let created = feedback::ActiveModel {
        designer_id: Set(designer.id),
        designer_name: Set(designer.name),
        admin_name: Set(admin.name),
        comment: Set(comment.trim().to_string()),
        created_at: Set(Utc::now()),
        viewed: Set(false),
        viewed_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut stored_images = Vec::with_capacity(images.len());
    for (position, data) in images.into_iter().enumerate() {
        let image = feedback_image::ActiveModel {
            feedback_id: Set(created.id),
            position: Set(position.try_into()?),
            data: Set(data),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        stored_images.push(image);
    }

    txn.commit().await?;

    tracing::info!(
        feedback_id = created.id,
        designer_id,
        images = stored_images.len(),
        "Created feedback"
    );
    Ok(FeedbackRecord::from_parts(created, stored_images))
}

/// Lists feedback for one designer (or everyone), newest first.
pub async fn list_feedback(
    db: &DatabaseConnection,
    designer_id: Option<i64>,
) -> Result<Vec<FeedbackRecord>> {
    let mut query = Feedback::find();
    if let Some(designer_id) = designer_id {
        query = query.filter(feedback::Column::DesignerId.eq(designer_id));
    }

    let mut records: Vec<FeedbackRecord> = query
        .find_with_related(FeedbackImage)
        .all(db)
        .await?
        .into_iter()
        .map(|(feedback, images)| FeedbackRecord::from_parts(feedback, images))
        .collect();
    records.sort_by(|a, b| {
        b.feedback
            .created_at
            .cmp(&a.feedback.created_at)
            .then(b.feedback.id.cmp(&a.feedback.id))
    });
    Ok(records)
}

/// Counts the feedback a designer has not opened yet.
pub async fn count_unviewed(db: &DatabaseConnection, designer_id: i64) -> Result<u64> {
    Feedback::find()
        .filter(feedback::Column::DesignerId.eq(designer_id))
        .filter(feedback::Column::Viewed.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Marks a feedback as viewed by its designer.
///
/// Viewing an already viewed feedback is a no-op that returns the stored record
/// with its original `viewed_at`.
///
/// # Errors
/// * `Error::NotFound` if the feedback does not exist
/// * `Error::Unauthorized` if the feedback belongs to another designer
pub async fn mark_feedback_viewed(
    db: &DatabaseConnection,
    designer_id: i64,
    feedback_id: i64,
) -> Result<feedback::Model> {
    let existing = Feedback::find_by_id(feedback_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Feedback", feedback_id))?;

    if existing.designer_id != designer_id {
        tracing::warn!(
            feedback_id,
            designer_id,
            owner = existing.designer_id,
            "Refused to mark another designer's feedback as viewed"
        );
        return Err(Error::unauthorized(format!(
            "Feedback {feedback_id} belongs to another designer"
        )));
    }

    if existing.viewed {
        tracing::debug!(feedback_id, "Feedback already viewed");
        return Ok(existing);
    }

    // The `viewed = false` guard keeps a concurrent first view from being overwritten.
    Feedback::update_many()
        .col_expr(feedback::Column::Viewed, Expr::value(true))
        .col_expr(feedback::Column::ViewedAt, Expr::value(Some(Utc::now())))
        .filter(feedback::Column::Id.eq(feedback_id))
        .filter(feedback::Column::Viewed.eq(false))
        .exec(db)
        .await?;

    let updated = Feedback::find_by_id(feedback_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Feedback", feedback_id))?;
    tracing::info!(feedback_id, designer_id, "Feedback viewed");
    Ok(updated)
}
