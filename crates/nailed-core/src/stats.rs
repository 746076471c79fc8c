//! # Dashboard Statistics
//!
//! Buckets raw ledger facts into the per-day series shown on the dashboard.
//! nailed-db loads the facts for the window; everything here is pure.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::MovementKind;

/// A single line or adjustment inside the dashboard window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayFact {
    pub date: DateTime<Utc>,
    pub kind: MovementKind,
    pub quantity: i64,
    /// Line amount (price × quantity); zero for adjustments.
    pub amount_cents: i64,
}

/// Totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyStats {
    /// Chart label, `dd/MM`.
    pub label: String,
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub sales_cents: i64,
    pub purchases_cents: i64,
    /// Units received (purchase lines + ENTRY adjustments).
    pub entries: i64,
    /// Units issued (sale lines + EXIT adjustments).
    pub exits: i64,
}

impl DailyStats {
    fn empty(day: NaiveDate) -> Self {
        DailyStats {
            label: day.format("%d/%m").to_string(),
            day,
            sales_cents: 0,
            purchases_cents: 0,
            entries: 0,
            exits: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryStat {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub total_clients: i64,
    pub total_products: i64,
    /// Sale documents inside the window.
    pub total_sales: i64,
    /// Sum of cached stock across products.
    pub current_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub daily: Vec<DailyStats>,
    pub categories: Vec<CategoryStat>,
    pub summary: DashboardSummary,
}

/// First day of a `days`-long window ending on `today` (inclusive).
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today - Duration::days(i64::from(days.max(1)) - 1)
}

/// Builds the oldest-first daily series for the window ending on `today`.
///
/// Facts outside the window are ignored.
///
/// ## Example
/// ```rust
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use nailed_core::ledger::MovementKind;
/// use nailed_core::stats::{daily_series, DayFact};
///
/// let today = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
/// let facts = vec![DayFact {
///     date: Utc.with_ymd_and_hms(2024, 5, 7, 15, 0, 0).unwrap(),
///     kind: MovementKind::Sale,
///     quantity: 3,
///     amount_cents: 1500,
/// }];
/// let series = daily_series(today, 7, &facts);
/// assert_eq!(series.len(), 7);
/// assert_eq!(series[6].label, "07/05");
/// assert_eq!(series[6].sales_cents, 1500);
/// assert_eq!(series[6].exits, 3);
/// ```
pub fn daily_series(today: NaiveDate, days: u32, facts: &[DayFact]) -> Vec<DailyStats> {
    let start = window_start(today, days);
    let mut series: Vec<DailyStats> = start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(DailyStats::empty)
        .collect();

    for fact in facts {
        let day = fact.date.date_naive();
        if day < start || day > today {
            continue;
        }
        let idx = (day - start).num_days() as usize;
        let bucket = &mut series[idx];

        match fact.kind {
            MovementKind::Sale => bucket.sales_cents += fact.amount_cents,
            MovementKind::Purchase => bucket.purchases_cents += fact.amount_cents,
            MovementKind::Adjustment(_) => {}
        }
        if fact.kind.is_entry() {
            bucket.entries += fact.quantity;
        } else {
            bucket.exits += fact.quantity;
        }
    }

    series
}

/// Product counts per category, dropping empty categories.
pub fn category_distribution<I>(counts: I) -> Vec<CategoryStat>
where
    I: IntoIterator<Item = (String, i64)>,
{
    counts
        .into_iter()
        .filter(|(_, value)| *value > 0)
        .map(|(name, value)| CategoryStat { name, value })
        .collect()
}
