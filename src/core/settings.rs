//! System settings business logic.
//!
//! Settings live in a single versioned row. Reads before the first update
//! return defaults at version 0; every update bumps the version by one.

use crate::{
    config::seed::SettingsSeed,
    entities::{SystemSettings, system_settings, system_settings::SETTINGS_ID},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};

/// Partial update of the settings record. `None` leaves a field untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub brand_title: Option<Option<String>>,
    pub logo_url: Option<Option<String>>,
    pub login_subtitle: Option<Option<String>>,
    pub variation_points: Option<Option<i64>>,
}

impl From<SettingsSeed> for SettingsUpdate {
    fn from(seed: SettingsSeed) -> Self {
        Self {
            brand_title: Some(seed.brand_title),
            logo_url: Some(seed.logo_url),
            login_subtitle: Some(seed.login_subtitle),
            variation_points: Some(seed.variation_points),
        }
    }
}

fn default_settings() -> system_settings::Model {
    system_settings::Model {
        id: SETTINGS_ID,
        brand_title: None,
        logo_url: None,
        login_subtitle: None,
        variation_points: None,
        version: 0,
        updated_at: chrono::DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// Reads the current settings, or the defaults if they were never written.
pub async fn get_settings<C>(db: &C) -> Result<system_settings::Model>
where
    C: ConnectionTrait,
{
    Ok(SystemSettings::find_by_id(SETTINGS_ID)
        .one(db)
        .await?
        .unwrap_or_else(default_settings))
}

/// Applies a partial update and increments the version.
///
/// # Errors
/// Returns `Error::Validation` for a negative variation point value.
pub async fn update_settings(
    db: &DatabaseConnection,
    update: SettingsUpdate,
) -> Result<system_settings::Model> {
    if let Some(Some(points)) = update.variation_points {
        if points < 0 {
            return Err(Error::validation(format!(
                "Variation points must be non-negative, got {points}"
            )));
        }
    }

    let txn = db.begin().await?;

    let existing = SystemSettings::find_by_id(SETTINGS_ID).one(&txn).await?;
    let is_new = existing.is_none();
    let current = existing.unwrap_or_else(default_settings);

    let active_model = system_settings::ActiveModel {
        id: Set(SETTINGS_ID),
        brand_title: Set(update.brand_title.unwrap_or(current.brand_title)),
        logo_url: Set(update.logo_url.unwrap_or(current.logo_url)),
        login_subtitle: Set(update.login_subtitle.unwrap_or(current.login_subtitle)),
        variation_points: Set(update.variation_points.unwrap_or(current.variation_points)),
        version: Set(current.version + 1),
        updated_at: Set(Utc::now()),
    };

    let saved = if is_new {
        active_model.insert(&txn).await?
    } else {
        active_model.update(&txn).await?
    };

    txn.commit().await?;
    tracing::info!(version = saved.version, "Updated system settings");
    Ok(saved)
}

/// Writes the configured initial settings if the settings were never written.
///
/// Returns true if the seed was applied.
pub async fn seed_settings(db: &DatabaseConnection, seed: Option<SettingsSeed>) -> Result<bool> {
    let Some(seed) = seed else {
        return Ok(false);
    };
    if get_settings(db).await?.version > 0 {
        return Ok(false);
    }
    update_settings(db, seed.into()).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_get_settings_defaults() -> Result<()> {
        let db = setup_test_db().await?;

        let settings = get_settings(&db).await?;
        assert_eq!(settings.version, 0);
        assert!(settings.variation_points.is_none());
        assert!(settings.brand_title.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_settings_versions_and_merges() -> Result<()> {
        let db = setup_test_db().await?;

        let first = update_settings(
            &db,
            SettingsUpdate {
                brand_title: Some(Some("Studio".to_string())),
                variation_points: Some(Some(5)),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(first.version, 1);
        assert_eq!(first.variation_points, Some(5));

        let second = update_settings(
            &db,
            SettingsUpdate {
                login_subtitle: Some(Some("Bem-vindo".to_string())),
                brand_title: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(second.version, 2);
        assert_eq!(second.variation_points, Some(5));
        assert_eq!(second.login_subtitle.as_deref(), Some("Bem-vindo"));
        assert!(second.brand_title.is_none());

        let reread = get_settings(&db).await?;
        assert_eq!(reread.version, 2);
        assert_eq!(reread.login_subtitle, second.login_subtitle);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_settings_applies_once() -> Result<()> {
        let db = setup_test_db().await?;
        let seed = SettingsSeed {
            brand_title: Some("Studio".to_string()),
            variation_points: Some(5),
            ..Default::default()
        };

        assert!(!seed_settings(&db, None).await?);
        assert!(seed_settings(&db, Some(seed.clone())).await?);
        assert!(!seed_settings(&db, Some(seed)).await?);

        let settings = get_settings(&db).await?;
        assert_eq!(settings.version, 1);
        assert_eq!(settings.variation_points, Some(5));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_settings_rejects_negative_variation_points() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = update_settings(
            &db,
            SettingsUpdate {
                variation_points: Some(Some(-3)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }
}
