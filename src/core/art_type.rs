//! Art type business logic - The catalog of billable work and its ordering.
//!
//! The catalog keeps `display_order` dense (`0..n-1`): new entries are appended,
//! deletions close the gap, and [`reorder_art_types`] rewrites the ranking from a
//! full id list. Ordering never affects point calculations.

use crate::{
    config::seed::ArtTypeSeed,
    entities::{ArtType, art_type},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;

/// Catalog id reserved for the format-variation art type.
pub const VARIATION_ART_TYPE_ID: i64 = 7;

/// Lower-case label fragment that also marks an art type as a variation.
pub const VARIATION_LABEL_MARKER: &str = "variação";

/// Returns true if an item of this art type is a format variation, which earns
/// points but does not count as an art.
///
/// The label fallback is a substring heuristic: renaming a catalog entry can
/// silently add or remove it from the art count.
#[must_use]
pub fn is_variation(art_type_id: i64, label: &str) -> bool {
    art_type_id == VARIATION_ART_TYPE_ID || label.to_lowercase().contains(VARIATION_LABEL_MARKER)
}

/// Input for creating (`id: None`) or updating an art type.
#[derive(Debug, Clone)]
pub struct ArtTypeUpsert {
    /// Existing id to update, or None to append a new entry
    pub id: Option<i64>,
    /// Catalog label
    pub label: String,
    /// Points per unit
    pub points: i64,
}

/// Retrieves the whole catalog in display order.
pub async fn list_art_types<C>(db: &C) -> Result<Vec<art_type::Model>>
where
    C: ConnectionTrait,
{
    ArtType::find()
        .order_by_asc(art_type::Column::DisplayOrder)
        .order_by_asc(art_type::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an art type by id, returning None if it does not exist.
pub async fn get_art_type_by_id<C>(db: &C, art_type_id: i64) -> Result<Option<art_type::Model>>
where
    C: ConnectionTrait,
{
    ArtType::find_by_id(art_type_id)
        .one(db)
        .await
        .map_err(Into::into)
}

fn validate_art_type(label: &str, points: i64) -> Result<()> {
    if label.trim().is_empty() {
        return Err(Error::validation("Art type label cannot be empty"));
    }
    if points < 0 {
        return Err(Error::validation(format!(
            "Art type points must be non-negative, got {points}"
        )));
    }
    Ok(())
}

/// Creates a new art type at the end of the catalog, or updates the label and
/// points of an existing one. Existing demands keep their snapshots.
///
/// # Errors
/// * `Error::Validation` for a blank label or negative points
/// * `Error::NotFound` when updating an id that does not exist
pub async fn upsert_art_type(
    db: &DatabaseConnection,
    input: ArtTypeUpsert,
) -> Result<art_type::Model> {
    validate_art_type(&input.label, input.points)?;
    let label = input.label.trim().to_string();

    let result = match input.id {
        Some(id) => {
            let mut active_model: art_type::ActiveModel = get_art_type_by_id(db, id)
                .await?
                .ok_or_else(|| Error::not_found("ArtType", id))?
                .into();
            active_model.label = Set(label);
            active_model.points = Set(input.points);
            active_model.update(db).await?
        }
        None => {
            let next_order: i32 = ArtType::find().count(db).await?.try_into()?;
            art_type::ActiveModel {
                label: Set(label),
                points: Set(input.points),
                display_order: Set(next_order),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    tracing::info!(
        art_type_id = result.id,
        points = result.points,
        "Saved art type {}",
        result.label
    );
    Ok(result)
}

/// Removes an art type from the catalog and closes the gap in the ranking.
///
/// # Errors
/// Returns `Error::NotFound` if the art type does not exist.
pub async fn delete_art_type(db: &DatabaseConnection, art_type_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = get_art_type_by_id(&txn, art_type_id)
        .await?
        .ok_or_else(|| Error::not_found("ArtType", art_type_id))?;
    existing.delete(&txn).await?;

    let remaining = list_art_types(&txn).await?;
    write_order(&txn, remaining).await?;

    txn.commit().await?;
    tracing::info!(art_type_id, "Deleted art type");
    Ok(())
}

/// Rewrites the catalog ranking so that `ordered_ids[i]` gets position `i`.
///
/// # Errors
/// Returns `Error::Validation` unless `ordered_ids` names every art type exactly once.
pub async fn reorder_art_types(
    db: &DatabaseConnection,
    ordered_ids: &[i64],
) -> Result<Vec<art_type::Model>> {
    let txn = db.begin().await?;

    let current = list_art_types(&txn).await?;
    let known: HashSet<i64> = current.iter().map(|a| a.id).collect();
    let requested: HashSet<i64> = ordered_ids.iter().copied().collect();
    if requested.len() != ordered_ids.len() || requested != known {
        return Err(Error::validation(
            "Reorder must list every art type exactly once",
        ));
    }

    let mut by_id: std::collections::HashMap<i64, art_type::Model> =
        current.into_iter().map(|a| (a.id, a)).collect();
    let reordered: Vec<art_type::Model> = ordered_ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .collect();
    let saved = write_order(&txn, reordered).await?;

    txn.commit().await?;
    Ok(saved)
}

async fn write_order<C>(db: &C, ordered: Vec<art_type::Model>) -> Result<Vec<art_type::Model>>
where
    C: ConnectionTrait,
{
    let mut saved = Vec::with_capacity(ordered.len());
    for (position, art) in ordered.into_iter().enumerate() {
        let position: i32 = position.try_into()?;
        if art.display_order == position {
            saved.push(art);
            continue;
        }
        let mut active_model: art_type::ActiveModel = art.into();
        active_model.display_order = Set(position);
        saved.push(active_model.update(db).await?);
    }
    Ok(saved)
}

/// Seeds the catalog from configuration if it is still empty.
///
/// Returns the number of art types inserted.
pub async fn seed_art_types(db: &DatabaseConnection, seeds: &[ArtTypeSeed]) -> Result<usize> {
    if ArtType::find().count(db).await? > 0 {
        return Ok(0);
    }
    for seed in seeds {
        upsert_art_type(
            db,
            ArtTypeUpsert {
                id: None,
                label: seed.label.clone(),
                points: seed.points,
            },
        )
        .await?;
    }
    Ok(seeds.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_is_variation_by_reserved_id() {
        assert!(is_variation(VARIATION_ART_TYPE_ID, "Anything"));
        assert!(!is_variation(1, "Arte Única"));
    }

    #[test]
    fn test_is_variation_by_label_case_insensitive() {
        assert!(is_variation(42, "Variação de Formato"));
        assert!(is_variation(42, "NOVA VARIAÇÃO"));
        assert!(!is_variation(42, "Variacao sem acento"));
    }

    #[tokio::test]
    async fn test_upsert_art_type_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = upsert_art_type(
            &db,
            ArtTypeUpsert {
                id: None,
                label: " ".to_string(),
                points: 10,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = upsert_art_type(
            &db,
            ArtTypeUpsert {
                id: None,
                label: "Carrossel".to_string(),
                points: -1,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_appends_and_updates() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_test_art_type(&db, "Arte Única", 10).await?;
        let second = create_test_art_type(&db, "Carrossel", 40).await?;
        assert_eq!(first.display_order, 0);
        assert_eq!(second.display_order, 1);

        let updated = upsert_art_type(
            &db,
            ArtTypeUpsert {
                id: Some(second.id),
                label: "Carrossel 5 telas".to_string(),
                points: 45,
            },
        )
        .await?;
        assert_eq!(updated.id, second.id);
        assert_eq!(updated.points, 45);
        assert_eq!(updated.display_order, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_unknown_id_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = upsert_art_type(
            &db,
            ArtTypeUpsert {
                id: Some(99),
                label: "Ghost".to_string(),
                points: 1,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_closes_order_gap() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_art_type(&db, "A", 1).await?;
        let b = create_test_art_type(&db, "B", 2).await?;
        let c = create_test_art_type(&db, "C", 3).await?;

        delete_art_type(&db, b.id).await?;

        let catalog = list_art_types(&db).await?;
        assert_eq!(catalog.len(), 2);
        assert_eq!((catalog[0].id, catalog[0].display_order), (a.id, 0));
        assert_eq!((catalog[1].id, catalog[1].display_order), (c.id, 1));

        let result = delete_art_type(&db, b.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_art_types() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_art_type(&db, "A", 1).await?;
        let b = create_test_art_type(&db, "B", 2).await?;
        let c = create_test_art_type(&db, "C", 3).await?;

        reorder_art_types(&db, &[c.id, a.id, b.id]).await?;

        let labels: Vec<String> = list_art_types(&db)
            .await?
            .into_iter()
            .map(|a| a.label)
            .collect();
        assert_eq!(labels, vec!["C", "A", "B"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_rejects_partial_list() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_art_type(&db, "A", 1).await?;
        let b = create_test_art_type(&db, "B", 2).await?;

        let result = reorder_art_types(&db, &[b.id]).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = reorder_art_types(&db, &[a.id, a.id]).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let catalog = list_art_types(&db).await?;
        assert_eq!(catalog[0].id, a.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_art_types_only_when_empty() -> Result<()> {
        let db = setup_test_db().await?;
        let seeds = vec![
            ArtTypeSeed {
                label: "Arte Única".to_string(),
                points: 10,
            },
            ArtTypeSeed {
                label: "Feed + Storys".to_string(),
                points: 25,
            },
        ];

        assert_eq!(seed_art_types(&db, &seeds).await?, 2);
        assert_eq!(seed_art_types(&db, &seeds).await?, 0);
        assert_eq!(list_art_types(&db).await?.len(), 2);

        Ok(())
    }
}
