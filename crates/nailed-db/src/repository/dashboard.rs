//! # Dashboard Repository
//!
//! Loads the raw facts behind `/api/dashboard/stats`. Bucketing by day is
//! done by [`nailed_core::stats`]; this module only runs the queries.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use nailed_core::ledger::MovementKind;
use nailed_core::stats::{
    category_distribution, daily_series, window_start, DashboardStats, DashboardSummary, DayFact,
};
use nailed_core::{AdjustmentType, DASHBOARD_WINDOW_DAYS};

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Stats for the window ending today (UTC).
    pub async fn stats(&self) -> DbResult<DashboardStats> {
        self.stats_for(Utc::now().date_naive()).await
    }

    /// Stats for the [`DASHBOARD_WINDOW_DAYS`] window ending on `today`.
    pub async fn stats_for(&self, today: NaiveDate) -> DbResult<DashboardStats> {
        let since = window_start(today, DASHBOARD_WINDOW_DAYS)
            .and_time(NaiveTime::MIN)
            .and_utc();

        let facts = self.load_facts(since).await?;
        debug!(facts = facts.len(), since = %since, "Loaded dashboard facts");

        let category_counts = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT c.description, COUNT(p.id)
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id AND p.status = 1
            GROUP BY c.id
            ORDER BY c.description
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let (total_clients, total_products, total_sales, current_stock) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM clients WHERE status = 1),
                    (SELECT COUNT(*) FROM products WHERE status = 1),
                    (SELECT COUNT(*) FROM sales WHERE date >= ?1),
                    (SELECT COALESCE(SUM(stock), 0) FROM products)
                "#,
            )
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats {
            daily: daily_series(today, DASHBOARD_WINDOW_DAYS, &facts),
            categories: category_distribution(category_counts),
            summary: DashboardSummary {
                total_clients,
                total_products,
                total_sales,
                current_stock,
            },
        })
    }

    async fn load_facts(&self, since: DateTime<Utc>) -> DbResult<Vec<DayFact>> {
        let sales = sqlx::query_as::<_, (DateTime<Utc>, i64, i64)>(
            r#"
            SELECT s.date, si.quantity, si.price_cents * si.quantity
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.date >= ?1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let purchases = sqlx::query_as::<_, (DateTime<Utc>, i64, i64)>(
            r#"
            SELECT pu.date, pi.quantity, pi.purchase_price_cents * pi.quantity
            FROM purchase_items pi
            JOIN purchases pu ON pu.id = pi.purchase_id
            WHERE pu.date >= ?1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let adjustments = sqlx::query_as::<_, (DateTime<Utc>, AdjustmentType, i64)>(
            "SELECT date, adjustment_type, quantity FROM inventory_adjustments WHERE date >= ?1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let fact = |date, kind, quantity, amount_cents| DayFact {
            date,
            kind,
            quantity,
            amount_cents,
        };

        Ok(sales
            .into_iter()
            .map(|(date, qty, amount)| fact(date, MovementKind::Sale, qty, amount))
            .chain(
                purchases
                    .into_iter()
                    .map(|(date, qty, amount)| fact(date, MovementKind::Purchase, qty, amount)),
            )
            .chain(adjustments.into_iter().map(|(date, kind, qty)| {
                fact(date, MovementKind::Adjustment(kind), qty, 0)
            }))
            .collect())
    }
}
