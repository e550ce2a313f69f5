//! Work session business logic - Designers clocking in.

use crate::{
    core::{
        report::{DesignerFilter, TimeWindow},
        user,
    },
    entities::{WorkSession, work_session},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};

/// Filter for [`list_sessions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionQuery {
    pub designer: DesignerFilter,
    pub window: Option<TimeWindow>,
}

/// Records that `user_id` started working now.
///
/// # Errors
/// Returns `Error::NotFound` if the user does not exist.
pub async fn start_session(db: &DatabaseConnection, user_id: i64) -> Result<work_session::Model> {
    start_session_at(db, user_id, Utc::now()).await
}

/// Records a session start at an explicit time.
pub async fn start_session_at(
    db: &DatabaseConnection,
    user_id: i64,
    timestamp: DateTime<Utc>,
) -> Result<work_session::Model> {
    user::require_user(db, user_id).await?;

    let session = work_session::ActiveModel {
        user_id: Set(user_id),
        timestamp: Set(timestamp),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(session_id = session.id, user_id, "Started work session");
    Ok(session)
}

/// Lists sessions matching `query`, newest first.
pub async fn list_sessions(
    db: &DatabaseConnection,
    query: &SessionQuery,
) -> Result<Vec<work_session::Model>> {
    let mut condition = Condition::all();
    if let DesignerFilter::Only(user_id) = query.designer {
        condition = condition.add(work_session::Column::UserId.eq(user_id));
    }
    if let Some(window) = query.window {
        condition = condition
            .add(work_session::Column::Timestamp.gte(window.start))
            .add(work_session::Column::Timestamp.lt(window.end));
    }

    WorkSession::find()
        .filter(condition)
        .order_by_desc(work_session::Column::Timestamp)
        .order_by_desc(work_session::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_start_session_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;

        let result = start_session(&db, 12).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { entity: "User", .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() -> Result<()> {
        let db = setup_test_db().await?;
        let davi = create_test_designer(&db, "Davi").await?;
        let paulo = create_test_designer(&db, "Paulo").await?;

        let day = |d| Utc.with_ymd_and_hms(2024, 6, d, 8, 30, 0).unwrap();
        start_session_at(&db, davi.id, day(13)).await?;
        start_session_at(&db, davi.id, day(14)).await?;
        start_session_at(&db, paulo.id, day(14)).await?;
        let now = start_session(&db, davi.id).await?;

        let all = list_sessions(&db, &SessionQuery::default()).await?;
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, now.id);

        let davi_window = list_sessions(
            &db,
            &SessionQuery {
                designer: DesignerFilter::Only(davi.id),
                window: Some(TimeWindow {
                    start: day(13),
                    end: day(14),
                }),
            },
        )
        .await?;
        assert_eq!(davi_window.len(), 1);
        assert_eq!(davi_window[0].timestamp, day(13));

        Ok(())
    }
}
