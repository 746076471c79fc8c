//! # Document Reports
//!
//! One row per purchase or sale line, with document and party columns
//! repeated, plus the totals shown under the report table.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReportKind {
    Purchase,
    Sale,
}

/// Which documents a report includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReportScope {
    Purchases,
    Sales,
    #[default]
    All,
}

impl ReportScope {
    pub fn includes(&self, kind: ReportKind) -> bool {
        matches!(
            (self, kind),
            (ReportScope::All, _)
                | (ReportScope::Purchases, ReportKind::Purchase)
                | (ReportScope::Sales, ReportKind::Sale)
        )
    }
}

/// Report query. Dates are inclusive bounds on the document date.
///
/// Each bound is either an RFC 3339 timestamp or a plain `YYYY-MM-DD`
/// (UTC). A plain `startDate` means the start of that day and a plain
/// `endDate` the last instant of it. Empty values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportFilter {
    #[serde(default, deserialize_with = "start_bound")]
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "end_bound")]
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    /// Restricts purchases to one supplier. Sales are unaffected.
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub kind: ReportScope,
}

/// Which end of a day a date-only bound stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEdge {
    Start,
    End,
}

/// Parses a report date bound. `None` for an empty value.
///
/// ## Example
/// ```rust
/// use nailed_core::report::{parse_date_bound, DayEdge};
///
/// let end = parse_date_bound("2024-05-07", DayEdge::End).unwrap().unwrap();
/// assert_eq!(end.to_rfc3339(), "2024-05-07T23:59:59.999999999+00:00");
/// assert!(parse_date_bound(" ", DayEdge::Start).unwrap().is_none());
/// ```
pub fn parse_date_bound(value: &str, edge: DayEdge) -> Result<Option<DateTime<Utc>>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD or RFC 3339", value))?;
    let time = match edge {
        DayEdge::Start => NaiveTime::from_hms_opt(0, 0, 0),
        DayEdge::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999),
    }
    .ok_or_else(|| "invalid time of day".to_string())?;
    Ok(Some(Utc.from_utc_datetime(&date.and_time(time))))
}

fn start_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    bound(deserializer, DayEdge::Start)
}

fn end_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    bound(deserializer, DayEdge::End)
}

fn bound<'de, D>(deserializer: D, edge: DayEdge) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_date_bound(&raw, edge).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportRow {
    pub kind: ReportKind,
    pub document_id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub document_type: String,
    pub document_number: String,
    pub user_name: String,
    /// Client document number; `-` for purchases.
    pub party_document: String,
    /// Client full name or supplier company name.
    pub party_name: String,
    pub product_code: String,
    pub product_name: String,
    pub category: String,
    /// Purchase price for purchases, sale price for sales.
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
    pub document_total_cents: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportTotals {
    pub purchases: Money,
    pub sales: Money,
    /// sales - purchases over the same rows.
    pub margin: Money,
    pub units_in: i64,
    pub units_out: i64,
}

/// Sums line subtotals by kind.
pub fn summarize(rows: &[ReportRow]) -> ReportTotals {
    let mut totals = ReportTotals::default();
    for row in rows {
        let subtotal = Money::from_cents(row.subtotal_cents);
        match row.kind {
            ReportKind::Purchase => {
                totals.purchases += subtotal;
                totals.units_in += row.quantity;
            }
            ReportKind::Sale => {
                totals.sales += subtotal;
                totals.units_out += row.quantity;
            }
        }
    }
    totals.margin = totals.sales - totals.purchases;
    totals
}
