//! Aggregation and reporting engine.
//!
//! Everything in this module except [`generate_report`] is pure: the reporting
//! window is resolved from an injected `now`, whose time zone defines what
//! "today" and "a day" mean, and the rollups are computed from an already
//! fetched snapshot of demands and work sessions.

use crate::{
    core::{demand, session, user},
    entities::{demand as demand_entity, work_session},
    errors::{Error, Result},
};
use chrono::{DateTime, Months, NaiveDate, TimeDelta, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Reporting period selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "lowercase")]
pub enum TimeFilter {
    /// The local calendar day containing `now`
    Today,
    /// The local calendar day before `now`
    Yesterday,
    /// The trailing 7 days ending at `now`
    Weekly,
    /// The trailing calendar month ending at `now`
    Monthly,
    /// The trailing calendar year ending at `now`
    Yearly,
    /// Explicit bounds, used verbatim
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Which designers a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DesignerFilter {
    #[default]
    All,
    Only(i64),
}

impl DesignerFilter {
    /// Returns true if records of `user_id` pass this filter.
    #[must_use]
    pub const fn matches(self, user_id: i64) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => id == user_id,
        }
    }
}

/// Half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[must_use]
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start <= *instant && *instant < self.end
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::validation(format!("Invalid date {date}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| Error::validation(format!("Local midnight of {date} does not exist")))
}

fn day_window<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<TimeWindow> {
    let next = date
        .succ_opt()
        .ok_or_else(|| Error::validation(format!("No day after {date}")))?;
    Ok(TimeWindow {
        start: local_midnight(tz, date)?,
        end: local_midnight(tz, next)?,
    })
}

/// Resolves a filter into a concrete window relative to `now`.
///
/// # Errors
/// Returns `Error::Validation` for a custom range whose start is after its end,
/// or when the window would fall outside the representable date range.
pub fn resolve_window<Tz: TimeZone>(
    filter: &TimeFilter,
    now: &DateTime<Tz>,
) -> Result<TimeWindow> {
    let tz = now.timezone();
    let end = now.with_timezone(&Utc);
    let out_of_range = || Error::validation("Reporting window is out of range");

    match *filter {
        TimeFilter::Today => day_window(&tz, now.date_naive()),
        TimeFilter::Yesterday => {
            let yesterday = now.date_naive().pred_opt().ok_or_else(out_of_range)?;
            day_window(&tz, yesterday)
        }
        TimeFilter::Weekly => Ok(TimeWindow {
            start: end
                .checked_sub_signed(TimeDelta::days(7))
                .ok_or_else(out_of_range)?,
            end,
        }),
        TimeFilter::Monthly => Ok(TimeWindow {
            start: now
                .clone()
                .checked_sub_months(Months::new(1))
                .ok_or_else(out_of_range)?
                .with_timezone(&Utc),
            end,
        }),
        TimeFilter::Yearly => Ok(TimeWindow {
            start: now
                .clone()
                .checked_sub_months(Months::new(12))
                .ok_or_else(out_of_range)?
                .with_timezone(&Utc),
            end,
        }),
        TimeFilter::Custom { start, end } => {
            if start > end {
                return Err(Error::validation(format!(
                    "Custom range starts after it ends ({start} > {end})"
                )));
            }
            Ok(TimeWindow { start, end })
        }
    }
}

/// Earliest session start of one designer on one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FirstClockIn {
    pub date: NaiveDate,
    pub started_at: DateTime<Utc>,
}

/// Per-designer rollup over the reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupRow {
    pub designer_id: i64,
    /// Name snapshot taken from the designer's most recent demand, if any
    pub designer_name: Option<String>,
    /// Art count (variation items excluded)
    pub total_arts: i64,
    pub total_points: i64,
    pub demand_count: usize,
    /// Qualifying demands, newest first
    pub demands: Vec<demand_entity::Model>,
    /// Qualifying sessions, newest first
    pub sessions: Vec<work_session::Model>,
    /// One entry per day with a session, newest day first
    pub first_clock_ins: Vec<FirstClockIn>,
}

impl RollupRow {
    fn empty(designer_id: i64) -> Self {
        Self {
            designer_id,
            designer_name: None,
            total_arts: 0,
            total_points: 0,
            demand_count: 0,
            demands: Vec::new(),
            sessions: Vec::new(),
            first_clock_ins: Vec::new(),
        }
    }
}

/// Totals over every row of a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RollupTotals {
    pub total_arts: i64,
    pub total_points: i64,
    pub demand_count: usize,
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rollup {
    pub window: TimeWindow,
    /// One row per designer, ordered by designer id
    pub rows: Vec<RollupRow>,
    pub totals: RollupTotals,
}

/// One history line: a designer's activity on one local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRow {
    pub designer_id: i64,
    pub designer_name: Option<String>,
    pub date: NaiveDate,
    /// Earliest session start that day, if the designer clocked in
    pub first_clock_in: Option<DateTime<Utc>>,
    pub total_arts: i64,
    pub total_points: i64,
    pub demand_count: usize,
}

fn select_demands<'a>(
    demands: &'a [demand_entity::Model],
    window: &'a TimeWindow,
    designer: DesignerFilter,
) -> impl Iterator<Item = &'a demand_entity::Model> {
    demands
        .iter()
        .filter(move |d| designer.matches(d.user_id) && window.contains(&d.timestamp))
}

fn select_sessions<'a>(
    sessions: &'a [work_session::Model],
    window: &'a TimeWindow,
    designer: DesignerFilter,
) -> impl Iterator<Item = &'a work_session::Model> {
    sessions
        .iter()
        .filter(move |s| designer.matches(s.user_id) && window.contains(&s.timestamp))
}

fn add_total(acc: i64, value: i64, what: &str) -> Result<i64> {
    acc.checked_add(value)
        .ok_or_else(|| Error::validation(format!("Rollup {what} overflow")))
}

/// Rolls demands and sessions up per designer over the resolved window.
///
/// An empty selection yields zero totals. With `DesignerFilter::Only`, the
/// designer always gets a row, even if it is all zeros.
///
/// # Arguments
/// * `demands` - Demand snapshot; records outside the window are ignored
/// * `sessions` - Work session snapshot; records outside the window are ignored
/// * `filter` - Reporting period, resolved against `now`
/// * `designer` - Which designers to include
/// * `now` - Current instant; its time zone defines local days
///
/// # Returns
/// A `Rollup` with one row per designer ordered by id, plus overall totals.
/// Row names come from demand snapshots only.
///
/// # Errors
/// * Window resolution errors from [`resolve_window`]
/// * `Error::Validation` if a points or arts sum overflows
pub fn aggregate<Tz: TimeZone>(
    demands: &[demand_entity::Model],
    sessions: &[work_session::Model],
    filter: &TimeFilter,
    designer: DesignerFilter,
    now: &DateTime<Tz>,
) -> Result<Rollup> {
    let window = resolve_window(filter, now)?;
    let tz = now.timezone();

    let mut rows: BTreeMap<i64, RollupRow> = BTreeMap::new();
    if let DesignerFilter::Only(id) = designer {
        rows.insert(id, RollupRow::empty(id));
    }

    for d in select_demands(demands, &window, designer) {
        let row = rows
            .entry(d.user_id)
            .or_insert_with(|| RollupRow::empty(d.user_id));
        row.total_arts = add_total(row.total_arts, d.total_quantity, "arts")?;
        row.total_points = add_total(row.total_points, d.total_points, "points")?;
        row.demand_count += 1;
        row.demands.push(d.clone());
    }

    let mut clock_ins: BTreeMap<(i64, NaiveDate), DateTime<Utc>> = BTreeMap::new();
    for s in select_sessions(sessions, &window, designer) {
        let row = rows
            .entry(s.user_id)
            .or_insert_with(|| RollupRow::empty(s.user_id));
        row.sessions.push(s.clone());

        let date = s.timestamp.with_timezone(&tz).date_naive();
        clock_ins
            .entry((s.user_id, date))
            .and_modify(|earliest| *earliest = (*earliest).min(s.timestamp))
            .or_insert(s.timestamp);
    }

    for ((user_id, date), started_at) in clock_ins.into_iter().rev() {
        if let Some(row) = rows.get_mut(&user_id) {
            row.first_clock_ins.push(FirstClockIn { date, started_at });
        }
    }

    let mut totals = RollupTotals::default();
    let mut ordered = Vec::with_capacity(rows.len());
    for mut row in rows.into_values() {
        row.demands
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        row.sessions
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        row.designer_name = row.demands.first().map(|d| d.user_name.clone());

        totals.total_arts = add_total(totals.total_arts, row.total_arts, "arts")?;
        totals.total_points = add_total(totals.total_points, row.total_points, "points")?;
        totals.demand_count += row.demand_count;
        ordered.push(row);
    }

    Ok(Rollup {
        window,
        rows: ordered,
        totals,
    })
}

/// Newest day first, then designer id.
type DayKey = (Reverse<NaiveDate>, i64);

fn day_row(days: &mut BTreeMap<DayKey, DailyRow>, user_id: i64, date: NaiveDate) -> &mut DailyRow {
    days.entry((Reverse(date), user_id))
        .or_insert_with(|| DailyRow {
            designer_id: user_id,
            designer_name: None,
            date,
            first_clock_in: None,
            total_arts: 0,
            total_points: 0,
            demand_count: 0,
        })
}

/// Builds the day-by-day history table: one row per designer and local day that
/// has a session or a demand in the window. Newest day first, then designer id.
///
/// # Errors
/// Propagates window resolution errors from [`resolve_window`].
pub fn daily_rows<Tz: TimeZone>(
    demands: &[demand_entity::Model],
    sessions: &[work_session::Model],
    filter: &TimeFilter,
    designer: DesignerFilter,
    now: &DateTime<Tz>,
) -> Result<Vec<DailyRow>> {
    let window = resolve_window(filter, now)?;
    let tz = now.timezone();

    let mut days: BTreeMap<DayKey, DailyRow> = BTreeMap::new();

    for s in select_sessions(sessions, &window, designer) {
        let date = s.timestamp.with_timezone(&tz).date_naive();
        let row = day_row(&mut days, s.user_id, date);
        row.first_clock_in = Some(
            row.first_clock_in
                .map_or(s.timestamp, |earliest| earliest.min(s.timestamp)),
        );
    }

    let mut latest_name: BTreeMap<DayKey, DateTime<Utc>> = BTreeMap::new();
    for d in select_demands(demands, &window, designer) {
        let date = d.timestamp.with_timezone(&tz).date_naive();
        let row = day_row(&mut days, d.user_id, date);
        row.total_arts = add_total(row.total_arts, d.total_quantity, "arts")?;
        row.total_points = add_total(row.total_points, d.total_points, "points")?;
        row.demand_count += 1;

        let key = (Reverse(date), d.user_id);
        if latest_name.get(&key).is_none_or(|seen| d.timestamp >= *seen) {
            latest_name.insert(key, d.timestamp);
            row.designer_name = Some(d.user_name.clone());
        }
    }

    Ok(days.into_values().collect())
}

/// Generates the dashboard rollup for a period from stored records.
///
/// Fetches the demands and sessions of the resolved window, aggregates them,
/// and names rows without a demand snapshot from the designer's account.
///
/// # Arguments
/// * `db` - Database connection
/// * `filter` - Reporting period
/// * `designer` - All designers or a single one
/// * `now` - Current instant; its time zone defines local days
///
/// # Returns
/// A structured `Rollup` ready for display or [`format_rollup_summary`]
pub async fn generate_report<Tz: TimeZone>(
    db: &DatabaseConnection,
    filter: &TimeFilter,
    designer: DesignerFilter,
    now: &DateTime<Tz>,
) -> Result<Rollup> {
    let window = resolve_window(filter, now)?;

    let demands: Vec<demand_entity::Model> = demand::list_demands(
        db,
        &demand::DemandQuery {
            designer,
            window: Some(window),
        },
    )
    .await?
    .into_iter()
    .map(|record| record.demand)
    .collect();

    let sessions = session::list_sessions(
        db,
        &session::SessionQuery {
            designer,
            window: Some(window),
        },
    )
    .await?;

    let mut rollup = aggregate(&demands, &sessions, filter, designer, now)?;

    let unnamed: Vec<i64> = rollup
        .rows
        .iter()
        .filter(|row| row.designer_name.is_none())
        .map(|row| row.designer_id)
        .collect();
    if !unnamed.is_empty() {
        let names = user::designer_names(db, unnamed).await?;
        for row in rollup.rows.iter_mut().filter(|row| row.designer_name.is_none()) {
            row.designer_name = names.get(&row.designer_id).cloned();
        }
    }

    Ok(rollup)
}

/// Formats a rollup into a plain-text summary for logs.
#[must_use]
pub fn format_rollup_summary(rollup: &Rollup) -> String {
    let mut summary = format!(
        "Report {} → {} | {} arts | {} points | {} demands\n",
        rollup.window.start.format("%Y-%m-%d %H:%M"),
        rollup.window.end.format("%Y-%m-%d %H:%M"),
        rollup.totals.total_arts,
        rollup.totals.total_points,
        rollup.totals.demand_count
    );

    for row in &rollup.rows {
        let name = row
            .designer_name
            .clone()
            .unwrap_or_else(|| format!("designer #{}", row.designer_id));
        summary.push_str(&format!(
            "  {name} - {} arts | {} points | {} demands | {} day(s) clocked in\n",
            row.total_arts,
            row.total_points,
            row.demand_count,
            row.first_clock_ins.len()
        ));
    }

    summary
}
