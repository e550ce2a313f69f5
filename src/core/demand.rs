//! Demand business logic - Pricing, totals and persistence of logged work.
//!
//! Every item snapshots its art type's label and point value at submission time,
//! and all totals are recomputed here from those snapshots. A demand and its
//! items are written in one database transaction, so a demand is never stored
//! without items or with totals that disagree with them.

use crate::{
    core::{
        art_type::is_variation,
        report::{DesignerFilter, TimeWindow},
        settings, user,
    },
    entities::{ArtType, Demand, DemandItem, art_type, demand, demand_item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One requested line of a new demand. Totals are always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandItemInput {
    /// Catalog entry being delivered
    pub art_type_id: i64,
    /// Units delivered
    pub quantity: i64,
    /// Extra format variations of this item, if any
    #[serde(default)]
    pub variation_quantity: Option<i64>,
}

/// A demand item with its snapshot fields and computed total, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub art_type_id: i64,
    pub art_type_label: String,
    pub points_per_unit: i64,
    pub quantity: i64,
    pub variation_quantity: Option<i64>,
    pub variation_points: Option<i64>,
    pub total_points: i64,
}

impl PricedItem {
    /// Prices `quantity` units of `art`, plus `variation_quantity` variations at
    /// `variation_points` each.
    ///
    /// # Errors
    /// Returns `Error::Validation` for negative values, variations without a
    /// configured point value, or arithmetic overflow.
    pub fn price(
        art: &art_type::Model,
        quantity: i64,
        variation_quantity: Option<i64>,
        variation_points: Option<i64>,
    ) -> Result<Self> {
        if quantity < 0 {
            return Err(Error::validation(format!(
                "Quantity must be non-negative, got {quantity}"
            )));
        }
        if art.points < 0 {
            return Err(Error::validation(format!(
                "Points per unit must be non-negative, got {}",
                art.points
            )));
        }

        let base = art
            .points
            .checked_mul(quantity)
            .ok_or_else(|| Error::validation("Item points overflow"))?;

        let (variation_quantity, variation_points, variation_total) = match variation_quantity {
            None | Some(0) => (variation_quantity, None, 0),
            Some(count) if count < 0 => {
                return Err(Error::validation(format!(
                    "Variation quantity must be non-negative, got {count}"
                )));
            }
            Some(count) => {
                let points = variation_points.ok_or_else(|| {
                    Error::validation("Variation point value is not configured")
                })?;
                if points < 0 {
                    return Err(Error::validation(format!(
                        "Variation points must be non-negative, got {points}"
                    )));
                }
                let total = points
                    .checked_mul(count)
                    .ok_or_else(|| Error::validation("Variation points overflow"))?;
                (Some(count), Some(points), total)
            }
        };

        let total_points = base
            .checked_add(variation_total)
            .ok_or_else(|| Error::validation("Item points overflow"))?;

        Ok(Self {
            art_type_id: art.id,
            art_type_label: art.label.clone(),
            points_per_unit: art.points,
            quantity,
            variation_quantity,
            variation_points,
            total_points,
        })
    }

    /// Whether this item is a format variation (excluded from the art count).
    #[must_use]
    pub fn is_variation(&self) -> bool {
        is_variation(self.art_type_id, &self.art_type_label)
    }
}

impl From<&demand_item::Model> for PricedItem {
    fn from(item: &demand_item::Model) -> Self {
        Self {
            art_type_id: item.art_type_id,
            art_type_label: item.art_type_label.clone(),
            points_per_unit: item.points_per_unit,
            quantity: item.quantity,
            variation_quantity: item.variation_quantity,
            variation_points: item.variation_points,
            total_points: item.total_points,
        }
    }
}

/// Totals of a demand derived from its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemandTotals {
    /// Sum of item points
    pub total_points: i64,
    /// Sum of item quantities, variation items excluded
    pub total_quantity: i64,
}

/// Sums points over all items and quantities over non-variation items.
///
/// # Errors
/// Returns `Error::Validation` on arithmetic overflow.
pub fn compute_totals(items: &[PricedItem]) -> Result<DemandTotals> {
    items.iter().try_fold(DemandTotals::default(), |acc, item| {
        let total_points = acc
            .total_points
            .checked_add(item.total_points)
            .ok_or_else(|| Error::validation("Demand points overflow"))?;
        let total_quantity = if item.is_variation() {
            acc.total_quantity
        } else {
            acc.total_quantity
                .checked_add(item.quantity)
                .ok_or_else(|| Error::validation("Demand quantity overflow"))?
        };
        Ok(DemandTotals {
            total_points,
            total_quantity,
        })
    })
}

/// A demand together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemandRecord {
    pub demand: demand::Model,
    pub items: Vec<demand_item::Model>,
}

/// Filter for [`list_demands`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemandQuery {
    pub designer: DesignerFilter,
    /// Only demands with `window.start <= timestamp < window.end`
    pub window: Option<TimeWindow>,
}

fn validate_inputs(items: &[DemandItemInput]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::validation("Demand must contain at least one item"));
    }
    for item in items {
        if item.quantity < 0 {
            return Err(Error::validation(format!(
                "Quantity must be non-negative, got {}",
                item.quantity
            )));
        }
        if let Some(count) = item.variation_quantity {
            if count < 0 {
                return Err(Error::validation(format!(
                    "Variation quantity must be non-negative, got {count}"
                )));
            }
        }
    }
    Ok(())
}

/// Creates a demand for `user_id` submitted now.
///
/// Each item is priced from the current catalog and the global variation
/// value, and the demand with its items is written in one transaction.
///
/// # Arguments
/// * `db` - Database connection
/// * `user_id` - ID of the submitting designer
/// * `items` - Requested lines; at least one is required
///
/// # Returns
/// The stored demand with its snapshot items and recomputed totals
///
/// # Errors
/// * `Error::Validation` for an empty item list or negative values
/// * `Error::NotFound` for an unknown user or art type
pub async fn create_demand(
    db: &DatabaseConnection,
    user_id: i64,
    items: Vec<DemandItemInput>,
) -> Result<DemandRecord> {
    create_demand_at(db, user_id, items, Utc::now()).await
}

/// Creates a demand with an explicit submission time (imports, backfills).
pub async fn create_demand_at(
    db: &DatabaseConnection,
    user_id: i64,
    items: Vec<DemandItemInput>,
    timestamp: DateTime<Utc>,
) -> Result<DemandRecord> {
    validate_inputs(&items)?;

    let txn = db.begin().await?;

    let owner = user::require_user(&txn, user_id).await?;

    let art_type_ids: Vec<i64> = items.iter().map(|i| i.art_type_id).collect();
    let catalog: HashMap<i64, art_type::Model> = ArtType::find()
        .filter(art_type::Column::Id.is_in(art_type_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let needs_variation_value = items
        .iter()
        .any(|i| i.variation_quantity.is_some_and(|q| q > 0));
    let variation_points = if needs_variation_value {
        settings::get_settings(&txn).await?.variation_points
    } else {
        None
    };

    let priced = items
        .iter()
        .map(|input| {
            let art = catalog
                .get(&input.art_type_id)
                .ok_or_else(|| Error::not_found("ArtType", input.art_type_id))?;
            PricedItem::price(
                art,
                input.quantity,
                input.variation_quantity,
                variation_points,
            )
        })
        .collect::<Result<Vec<_>>>()?;
    let totals = compute_totals(&priced)?;

    let demand = demand::ActiveModel {
        user_id: Set(owner.id),
        user_name: Set(owner.name.clone()),
        total_quantity: Set(totals.total_quantity),
        total_points: Set(totals.total_points),
        timestamp: Set(timestamp),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut stored_items = Vec::with_capacity(priced.len());
    for item in priced {
        let stored = demand_item::ActiveModel {
            demand_id: Set(demand.id),
            art_type_id: Set(item.art_type_id),
            art_type_label: Set(item.art_type_label),
            points_per_unit: Set(item.points_per_unit),
            quantity: Set(item.quantity),
            variation_quantity: Set(item.variation_quantity),
            variation_points: Set(item.variation_points),
            total_points: Set(item.total_points),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        stored_items.push(stored);
    }

    txn.commit().await?;

    tracing::info!(
        demand_id = demand.id,
        user_id,
        total_points = demand.total_points,
        total_quantity = demand.total_quantity,
        "Created demand with {} item(s)",
        stored_items.len()
    );

    Ok(DemandRecord {
        demand,
        items: stored_items,
    })
}

/// Retrieves a demand and its items.
///
/// # Errors
/// Returns `Error::NotFound` if the demand does not exist.
pub async fn get_demand(db: &DatabaseConnection, demand_id: i64) -> Result<DemandRecord> {
    let demand = Demand::find_by_id(demand_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Demand", demand_id))?;
    let items = DemandItem::find()
        .filter(demand_item::Column::DemandId.eq(demand_id))
        .order_by_asc(demand_item::Column::Id)
        .all(db)
        .await?;
    Ok(DemandRecord { demand, items })
}

fn demand_condition(query: &DemandQuery) -> Condition {
    let mut condition = Condition::all();
    if let DesignerFilter::Only(user_id) = query.designer {
        condition = condition.add(demand::Column::UserId.eq(user_id));
    }
    if let Some(window) = query.window {
        condition = condition
            .add(demand::Column::Timestamp.gte(window.start))
            .add(demand::Column::Timestamp.lt(window.end));
    }
    condition
}

/// Lists demands matching `query` with their items, newest first.
pub async fn list_demands(
    db: &DatabaseConnection,
    query: &DemandQuery,
) -> Result<Vec<DemandRecord>> {
    let rows = Demand::find()
        .filter(demand_condition(query))
        .find_with_related(DemandItem)
        .all(db)
        .await?;

    let mut records: Vec<DemandRecord> = rows
        .into_iter()
        .map(|(demand, mut items)| {
            items.sort_by_key(|i| i.id);
            DemandRecord { demand, items }
        })
        .collect();
    records.sort_by(|a, b| {
        b.demand
            .timestamp
            .cmp(&a.demand.timestamp)
            .then(b.demand.id.cmp(&a.demand.id))
    });
    Ok(records)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::art_type::VARIATION_ART_TYPE_ID;
    use crate::core::settings::{SettingsUpdate, update_settings};
    use crate::test_utils::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn art(id: i64, label: &str, points: i64) -> art_type::Model {
        art_type::Model {
            id,
            label: label.to_string(),
            points,
            display_order: 0,
        }
    }

    #[test]
    fn test_price_plain_item() {
        let item = PricedItem::price(&art(3, "Carrossel", 40), 2, None, None).unwrap();
        assert_eq!(item.total_points, 80);
        assert_eq!(item.art_type_label, "Carrossel");
        assert!(item.variation_points.is_none());
    }

    #[test]
    fn test_price_item_with_variations() {
        let item = PricedItem::price(&art(2, "Feed + Storys", 25), 1, Some(3), Some(5)).unwrap();
        assert_eq!(item.total_points, 25 + 15);
        assert_eq!(item.variation_points, Some(5));
    }

    #[test]
    fn test_price_variations_require_configured_value() {
        let result = PricedItem::price(&art(2, "Feed + Storys", 25), 1, Some(2), None);
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Zero variations never need the value
        let item = PricedItem::price(&art(2, "Feed + Storys", 25), 1, Some(0), None).unwrap();
        assert_eq!(item.total_points, 25);
    }

    #[test]
    fn test_price_rejects_negative_and_overflow() {
        assert!(PricedItem::price(&art(1, "A", 10), -1, None, None).is_err());
        assert!(PricedItem::price(&art(1, "A", 10), 1, Some(-1), Some(5)).is_err());
        assert!(PricedItem::price(&art(1, "A", i64::MAX), 2, None, None).is_err());
    }

    #[test]
    fn test_totals_exclude_variation_items_from_quantity() {
        let items = vec![
            PricedItem::price(&art(1, "Arte Única", 10), 1, None, None).unwrap(),
            PricedItem::price(&art(VARIATION_ART_TYPE_ID, "Variação de Formato", 5), 2, None, None)
                .unwrap(),
        ];

        let totals = compute_totals(&items).unwrap();
        assert_eq!(totals.total_points, 20);
        assert_eq!(totals.total_quantity, 1);
    }

    #[test]
    fn test_totals_all_variation_items() {
        let items = vec![
            PricedItem::price(&art(40, "Variação de Formato", 5), 3, None, None).unwrap(),
        ];

        let totals = compute_totals(&items).unwrap();
        assert_eq!(totals.total_points, 15);
        assert_eq!(totals.total_quantity, 0);
    }

    #[tokio::test]
    async fn test_create_demand_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_demand(&db, 1, vec![]).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_demand(
            &db,
            1,
            vec![DemandItemInput {
                art_type_id: 1,
                quantity: -2,
                variation_quantity: None,
            }],
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_demand_snapshots_and_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let designer = create_test_designer(&db, "Davi").await?;
        let single = create_test_art_type(&db, "Arte Única", 10).await?;
        let variation = create_test_art_type(&db, "Variação de Formato", 5).await?;

        let record = create_demand(
            &db,
            designer.id,
            vec![item(single.id, 1), item(variation.id, 2)],
        )
        .await?;

        assert_eq!(record.demand.user_name, "Davi");
        assert_eq!(record.demand.total_points, 20);
        assert_eq!(record.demand.total_quantity, 1);
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[1].art_type_label, "Variação de Formato");
        assert_eq!(record.items[1].total_points, 10);

        let sum: i64 = record.items.iter().map(|i| i.total_points).sum();
        assert_eq!(sum, record.demand.total_points);

        Ok(())
    }

    #[tokio::test]
    async fn test_catalog_edits_do_not_rewrite_history() -> Result<()> {
        let db = setup_test_db().await?;
        let designer = create_test_designer(&db, "Davi").await?;
        let banner = create_test_art_type(&db, "Banner Site", 30).await?;

        let record = create_demand(&db, designer.id, vec![item(banner.id, 1)]).await?;

        crate::core::art_type::upsert_art_type(
            &db,
            crate::core::art_type::ArtTypeUpsert {
                id: Some(banner.id),
                label: "Banner Home".to_string(),
                points: 99,
            },
        )
        .await?;
        crate::core::art_type::delete_art_type(&db, banner.id).await?;

        let reloaded = get_demand(&db, record.demand.id).await?;
        assert_eq!(reloaded.items[0].art_type_label, "Banner Site");
        assert_eq!(reloaded.items[0].points_per_unit, 30);
        assert_eq!(reloaded.demand.total_points, 30);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_demand_uses_configured_variation_points() -> Result<()> {
        let db = setup_test_db().await?;
        let designer = create_test_designer(&db, "Guilherme").await?;
        let feed = create_test_art_type(&db, "Feed + Storys", 25).await?;

        let input = vec![DemandItemInput {
            art_type_id: feed.id,
            quantity: 1,
            variation_quantity: Some(2),
        }];

        let result = create_demand(&db, designer.id, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        update_settings(
            &db,
            SettingsUpdate {
                variation_points: Some(Some(5)),
                ..Default::default()
            },
        )
        .await?;

        let record = create_demand(&db, designer.id, input).await?;
        assert_eq!(record.demand.total_points, 35);
        assert_eq!(record.demand.total_quantity, 1);
        assert_eq!(record.items[0].variation_points, Some(5));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_demand_unknown_art_type_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let designer = create_test_designer(&db, "Paulo").await?;
        let single = create_test_art_type(&db, "Arte Única", 10).await?;

        let result = create_demand(&db, designer.id, vec![item(single.id, 1), item(999, 1)]).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "ArtType",
                ..
            }
        ));

        let all = list_demands(&db, &DemandQuery::default()).await?;
        assert!(all.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_demand_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let single = create_test_art_type(&db, "Arte Única", 10).await?;

        let result = create_demand(&db, 404, vec![item(single.id, 1)]).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { entity: "User", .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_demands_filters_and_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let davi = create_test_designer(&db, "Davi").await?;
        let paulo = create_test_designer(&db, "Paulo").await?;
        let single = create_test_art_type(&db, "Arte Única", 10).await?;

        let june = |day, hour| Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap();
        create_demand_at(&db, davi.id, vec![item(single.id, 1)], june(14, 10)).await?;
        create_demand_at(&db, davi.id, vec![item(single.id, 2)], june(15, 9)).await?;
        create_demand_at(&db, paulo.id, vec![item(single.id, 3)], june(15, 11)).await?;

        let all = list_demands(&db, &DemandQuery::default()).await?;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].demand.timestamp, june(15, 11));
        assert_eq!(all[2].demand.timestamp, june(14, 10));
        assert!(all.iter().all(|r| r.items.len() == 1));

        let davi_only = list_demands(
            &db,
            &DemandQuery {
                designer: DesignerFilter::Only(davi.id),
                window: None,
            },
        )
        .await?;
        assert_eq!(davi_only.len(), 2);

        let june_15 = list_demands(
            &db,
            &DemandQuery {
                designer: DesignerFilter::All,
                window: Some(TimeWindow {
                    start: june(15, 0),
                    end: june(16, 0),
                }),
            },
        )
        .await?;
        assert_eq!(june_15.len(), 2);
        assert!(june_15.iter().all(|r| r.demand.timestamp >= june(15, 0)));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_demand_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_demand(&db, 1).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
