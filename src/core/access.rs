//! Authorization gate and role capability handles.
//!
//! Every action starts by resolving the acting user here. The gate checks that
//! the account exists and is active and hands back a handle for exactly one
//! role: [`AdminActions`] or [`DesignerActions`]. The two handles expose
//! disjoint operation sets, so holding a designer handle is proof that admin
//! operations are unreachable, and vice versa.

use crate::{
    core::{
        art_type::{self, ArtTypeUpsert},
        demand::{self, DemandItemInput, DemandQuery, DemandRecord},
        feedback::{self, FeedbackRecord},
        lesson::{self, LessonUpsert, LessonWithProgress},
        report::{self, DailyRow, DesignerFilter, Rollup, TimeFilter, TimeWindow},
        session::{self, SessionQuery},
        settings::{self, SettingsUpdate},
        user,
        viewed::{self, ViewTarget, ViewedState},
    },
    entities::{
        Role, art_type as art_type_entity, lesson as lesson_entity, system_settings,
        user as user_entity, work_session,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, TimeZone};
use sea_orm::DatabaseConnection;

/// The capabilities of an authenticated, active user.
pub enum Capabilities<'a> {
    Admin(AdminActions<'a>),
    Designer(DesignerActions<'a>),
}

impl Capabilities<'_> {
    /// The acting user.
    #[must_use]
    pub const fn user(&self) -> &user_entity::Model {
        match self {
            Self::Admin(admin) => &admin.admin,
            Self::Designer(designer) => &designer.designer,
        }
    }
}

/// Resolves `user_id` into the capability handle of its role.
///
/// # Errors
/// * `Error::NotFound` if the user does not exist
/// * `Error::Unauthorized` if the account is inactive
pub async fn authorize(db: &DatabaseConnection, user_id: i64) -> Result<Capabilities<'_>> {
    let acting = user::require_user(db, user_id).await?;
    if !acting.active {
        tracing::warn!(user_id, "Refused action by inactive user");
        return Err(Error::unauthorized(format!("User {user_id} is inactive")));
    }

    Ok(match acting.role {
        Role::Admin => Capabilities::Admin(AdminActions { db, admin: acting }),
        Role::Designer => Capabilities::Designer(DesignerActions {
            db,
            designer: acting,
        }),
    })
}

fn role_mismatch(user: &user_entity::Model, required: Role) -> Error {
    tracing::warn!(
        user_id = user.id,
        role = %user.role,
        required = %required,
        "Refused action for role"
    );
    Error::unauthorized(format!(
        "User {} has role {}, {} required",
        user.id, user.role, required
    ))
}

/// Resolves `user_id` and requires the administrator role.
pub async fn as_admin(db: &DatabaseConnection, user_id: i64) -> Result<AdminActions<'_>> {
    match authorize(db, user_id).await? {
        Capabilities::Admin(admin) => Ok(admin),
        Capabilities::Designer(designer) => Err(role_mismatch(&designer.designer, Role::Admin)),
    }
}

/// Resolves `user_id` and requires the designer role.
pub async fn as_designer(db: &DatabaseConnection, user_id: i64) -> Result<DesignerActions<'_>> {
    match authorize(db, user_id).await? {
        Capabilities::Designer(designer) => Ok(designer),
        Capabilities::Admin(admin) => Err(role_mismatch(&admin.admin, Role::Designer)),
    }
}

/// Operations available to a designer, always scoped to their own records.
pub struct DesignerActions<'a> {
    db: &'a DatabaseConnection,
    designer: user_entity::Model,
}

impl DesignerActions<'_> {
    #[must_use]
    pub const fn user(&self) -> &user_entity::Model {
        &self.designer
    }

    /// The catalog to pick items from, in display order.
    pub async fn art_types(&self) -> Result<Vec<art_type_entity::Model>> {
        art_type::list_art_types(self.db).await
    }

    pub async fn submit_demand(&self, items: Vec<DemandItemInput>) -> Result<DemandRecord> {
        demand::create_demand(self.db, self.designer.id, items).await
    }

    pub async fn start_session(&self) -> Result<work_session::Model> {
        session::start_session(self.db, self.designer.id).await
    }

    pub async fn my_demands(&self, window: Option<TimeWindow>) -> Result<Vec<DemandRecord>> {
        demand::list_demands(
            self.db,
            &DemandQuery {
                designer: DesignerFilter::Only(self.designer.id),
                window,
            },
        )
        .await
    }

    pub async fn my_sessions(
        &self,
        window: Option<TimeWindow>,
    ) -> Result<Vec<work_session::Model>> {
        session::list_sessions(
            self.db,
            &SessionQuery {
                designer: DesignerFilter::Only(self.designer.id),
                window,
            },
        )
        .await
    }

    /// The designer's own dashboard numbers for a period.
    pub async fn my_rollup<Tz: TimeZone>(
        &self,
        filter: &TimeFilter,
        now: &DateTime<Tz>,
    ) -> Result<Rollup> {
        report::generate_report(self.db, filter, DesignerFilter::Only(self.designer.id), now).await
    }

    pub async fn my_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        feedback::list_feedback(self.db, Some(self.designer.id)).await
    }

    pub async fn unviewed_feedback_count(&self) -> Result<u64> {
        feedback::count_unviewed(self.db, self.designer.id).await
    }

    pub async fn lessons(&self) -> Result<Vec<LessonWithProgress>> {
        lesson::list_lessons_with_progress(self.db, self.designer.id).await
    }

    /// Marks one of the designer's own feedback entries or lessons as viewed.
    pub async fn mark_viewed(&self, target: ViewTarget) -> Result<ViewedState> {
        viewed::mark_viewed(self.db, self.designer.id, target).await
    }
}

/// Operations available to an administrator.
pub struct AdminActions<'a> {
    db: &'a DatabaseConnection,
    admin: user_entity::Model,
}

impl AdminActions<'_> {
    #[must_use]
    pub const fn user(&self) -> &user_entity::Model {
        &self.admin
    }

    pub async fn designers(&self, include_inactive: bool) -> Result<Vec<user_entity::Model>> {
        user::list_designers(self.db, include_inactive).await
    }

    pub async fn register_designer(&self, name: String) -> Result<user_entity::Model> {
        user::create_user(self.db, name, Role::Designer).await
    }

    pub async fn set_designer_active(
        &self,
        designer_id: i64,
        active: bool,
    ) -> Result<user_entity::Model> {
        user::set_designer_active(self.db, designer_id, active).await
    }

    pub async fn list_demands(&self, query: &DemandQuery) -> Result<Vec<DemandRecord>> {
        demand::list_demands(self.db, query).await
    }

    pub async fn list_sessions(&self, query: &SessionQuery) -> Result<Vec<work_session::Model>> {
        session::list_sessions(self.db, query).await
    }

    /// Per-designer rollup for the admin dashboard.
    pub async fn report<Tz: TimeZone>(
        &self,
        filter: &TimeFilter,
        designer: DesignerFilter,
        now: &DateTime<Tz>,
    ) -> Result<Rollup> {
        report::generate_report(self.db, filter, designer, now).await
    }

    /// Day-by-day history table for the admin history view.
    pub async fn history<Tz: TimeZone>(
        &self,
        filter: &TimeFilter,
        designer: DesignerFilter,
        now: &DateTime<Tz>,
    ) -> Result<Vec<DailyRow>> {
        let window = report::resolve_window(filter, now)?;
        let demands: Vec<_> = demand::list_demands(
            self.db,
            &DemandQuery {
                designer,
                window: Some(window),
            },
        )
        .await?
        .into_iter()
        .map(|record| record.demand)
        .collect();
        let sessions = session::list_sessions(
            self.db,
            &SessionQuery {
                designer,
                window: Some(window),
            },
        )
        .await?;
        let mut rows = report::daily_rows(&demands, &sessions, filter, designer, now)?;

        let unnamed: Vec<i64> = rows
            .iter()
            .filter(|row| row.designer_name.is_none())
            .map(|row| row.designer_id)
            .collect();
        if !unnamed.is_empty() {
            let names = user::designer_names(self.db, unnamed).await?;
            for row in rows.iter_mut().filter(|row| row.designer_name.is_none()) {
                row.designer_name = names.get(&row.designer_id).cloned();
            }
        }

        Ok(rows)
    }

    pub async fn create_feedback(
        &self,
        designer_id: i64,
        comment: String,
        images: Vec<String>,
    ) -> Result<FeedbackRecord> {
        feedback::create_feedback(self.db, self.admin.id, designer_id, comment, images).await
    }

    pub async fn feedback(&self, designer_id: Option<i64>) -> Result<Vec<FeedbackRecord>> {
        feedback::list_feedback(self.db, designer_id).await
    }

    pub async fn upsert_art_type(&self, input: ArtTypeUpsert) -> Result<art_type_entity::Model> {
        art_type::upsert_art_type(self.db, input).await
    }

    pub async fn delete_art_type(&self, art_type_id: i64) -> Result<()> {
        art_type::delete_art_type(self.db, art_type_id).await
    }

    pub async fn reorder_art_types(
        &self,
        ordered_ids: &[i64],
    ) -> Result<Vec<art_type_entity::Model>> {
        art_type::reorder_art_types(self.db, ordered_ids).await
    }

    pub async fn upsert_lesson(&self, input: LessonUpsert) -> Result<lesson_entity::Model> {
        lesson::upsert_lesson(self.db, input).await
    }

    pub async fn delete_lesson(&self, lesson_id: i64) -> Result<()> {
        lesson::delete_lesson(self.db, lesson_id).await
    }

    pub async fn settings(&self) -> Result<system_settings::Model> {
        settings::get_settings(self.db).await
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<system_settings::Model> {
        settings::update_settings(self.db, update).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_authorize_dispatches_on_role() -> Result<()> {
        let (db, admin, designer) = setup_with_team().await?;

        assert!(matches!(
            authorize(&db, admin.id).await?,
            Capabilities::Admin(_)
        ));
        let caps = authorize(&db, designer.id).await?;
        assert!(matches!(caps, Capabilities::Designer(_)));
        assert_eq!(caps.user().id, designer.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_role_mismatch_is_unauthorized() -> Result<()> {
        let (db, admin, designer) = setup_with_team().await?;

        assert!(matches!(
            as_admin(&db, designer.id).await.err().unwrap(),
            Error::Unauthorized { .. }
        ));
        assert!(matches!(
            as_designer(&db, admin.id).await.err().unwrap(),
            Error::Unauthorized { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_users() -> Result<()> {
        let (db, admin, designer) = setup_with_team().await?;

        assert!(matches!(
            authorize(&db, 404).await.err().unwrap(),
            Error::NotFound { .. }
        ));

        as_admin(&db, admin.id)
            .await?
            .set_designer_active(designer.id, false)
            .await?;
        assert!(matches!(
            as_designer(&db, designer.id).await.err().unwrap(),
            Error::Unauthorized { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_history_names_session_only_days() -> Result<()> {
        let (db, admin, designer) = setup_with_team().await?;
        as_designer(&db, designer.id).await?.start_session().await?;

        let history = as_admin(&db, admin.id)
            .await?
            .history(&TimeFilter::Weekly, DesignerFilter::All, &Utc::now())
            .await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].demand_count, 0);
        assert_eq!(
            history[0].designer_name.as_deref(),
            Some(designer.name.as_str())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_designer_and_admin_flow() -> Result<()> {
        let (db, admin, designer) = setup_with_team().await?;
        let single = create_test_art_type(&db, "Arte Única", 10).await?;
        let variation = create_test_art_type(&db, "Variação de Formato", 5).await?;

        let me = as_designer(&db, designer.id).await?;
        me.start_session().await?;
        let record = me
            .submit_demand(vec![item(single.id, 1), item(variation.id, 2)])
            .await?;
        assert_eq!(record.demand.total_points, 20);
        assert_eq!(record.demand.total_quantity, 1);
        assert_eq!(me.my_demands(None).await?.len(), 1);
        assert_eq!(me.my_sessions(None).await?.len(), 1);

        let boss = as_admin(&db, admin.id).await?;
        let now = Utc::now();
        let rollup = boss
            .report(&TimeFilter::Today, DesignerFilter::All, &now)
            .await?;
        assert_eq!(rollup.totals.total_points, 20);
        assert_eq!(rollup.totals.total_arts, 1);

        let history = boss
            .history(&TimeFilter::Today, DesignerFilter::Only(designer.id), &now)
            .await?;
        assert_eq!(history.len(), 1);
        assert!(history[0].first_clock_in.is_some());
        assert_eq!(
            history[0].designer_name.as_deref(),
            Some(designer.name.as_str())
        );

        let note = boss
            .create_feedback(designer.id, "Ótimo trabalho".to_string(), vec![])
            .await?;
        assert_eq!(me.unviewed_feedback_count().await?, 1);
        let state = me
            .mark_viewed(ViewTarget::Feedback(note.feedback.id))
            .await?;
        assert!(state.viewed_at.is_some());
        assert_eq!(me.unviewed_feedback_count().await?, 0);

        let mine = me.my_rollup(&TimeFilter::Weekly, &now).await?;
        assert_eq!(mine.rows.len(), 1);
        assert_eq!(mine.rows[0].total_points, 20);

        Ok(())
    }
}
