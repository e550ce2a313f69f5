//! User business logic - Account creation, lookup and the active flag.
//!
//! Roles are assigned at creation and never change. Deactivation is an
//! administrator capability, enforced by the caller going through
//! [`crate::core::access`].

use crate::{
    config::seed::UserSeed,
    entities::{Role, User, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// Creates a new active account with the given role.
///
/// # Errors
/// Returns `Error::Validation` if the name is blank.
pub async fn create_user(db: &DatabaseConnection, name: String, role: Role) -> Result<user::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("User name cannot be empty"));
    }

    let user = user::ActiveModel {
        name: Set(name.trim().to_string()),
        role: Set(role),
        active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user.insert(db).await?;
    tracing::info!(user_id = result.id, role = %role, "Created user {}", result.name);
    Ok(result)
}

/// Finds a user by id, returning None if it does not exist.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by id, failing with `Error::NotFound` if it does not exist.
pub async fn require_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))
}

/// Maps the given user ids to their current names. Unknown ids are skipped.
pub async fn designer_names(
    db: &DatabaseConnection,
    user_ids: Vec<i64>,
) -> Result<HashMap<i64, String>> {
    Ok(User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect())
}

/// Lists designers ordered by name; inactive ones only when asked for.
pub async fn list_designers(
    db: &DatabaseConnection,
    include_inactive: bool,
) -> Result<Vec<user::Model>> {
    let mut query = User::find().filter(user::Column::Role.eq(Role::Designer));
    if !include_inactive {
        query = query.filter(user::Column::Active.eq(true));
    }
    query
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns true if no account exists yet.
pub async fn is_empty(db: &DatabaseConnection) -> Result<bool> {
    Ok(User::find().count(db).await? == 0)
}

/// Activates or deactivates a designer account.
///
/// # Errors
/// * `Error::NotFound` if the user does not exist
/// * `Error::Validation` if the target is not a designer
pub async fn set_designer_active(
    db: &DatabaseConnection,
    designer_id: i64,
    active: bool,
) -> Result<user::Model> {
    let designer = require_user(db, designer_id).await?;
    if designer.role != Role::Designer {
        return Err(Error::validation(format!(
            "User {designer_id} is not a designer"
        )));
    }
    if designer.active == active {
        return Ok(designer);
    }

    let mut active_model: user::ActiveModel = designer.into();
    active_model.active = Set(active);
    let updated = active_model.update(db).await?;
    tracing::info!(user_id = designer_id, active, "Changed designer active flag");
    Ok(updated)
}

/// Seeds the initial accounts from configuration if there are none yet.
///
/// Returns the number of accounts inserted.
pub async fn seed_users(db: &DatabaseConnection, seeds: &[UserSeed]) -> Result<usize> {
    if !is_empty(db).await? {
        return Ok(0);
    }
    for seed in seeds {
        create_user(db, seed.name.clone(), seed.role).await?;
    }
    Ok(seeds.len())
}
