//! # Report Repository
//!
//! Flattens purchases and sales into one row per line for the report
//! screen. Totals are computed by [`nailed_core::report::summarize`].

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use nailed_core::report::{ReportFilter, ReportKind, ReportRow};

const PURCHASE_ROWS: &str = r#"
    SELECT
        'purchase' AS kind,
        pu.id AS document_id,
        pu.date,
        pu.document_type,
        pu.document_number,
        u.full_name AS user_name,
        '-' AS party_document,
        s.company_name AS party_name,
        p.code AS product_code,
        p.name AS product_name,
        COALESCE(c.description, 'No category') AS category,
        pi.purchase_price_cents AS unit_price_cents,
        pi.quantity,
        pi.purchase_price_cents * pi.quantity AS subtotal_cents,
        (SELECT SUM(x.purchase_price_cents * x.quantity)
         FROM purchase_items x WHERE x.purchase_id = pu.id) AS document_total_cents
    FROM purchase_items pi
    JOIN purchases pu ON pu.id = pi.purchase_id
    JOIN suppliers s ON s.id = pu.supplier_id
    JOIN users u ON u.id = pu.user_id
    JOIN products p ON p.id = pi.product_id
    LEFT JOIN categories c ON c.id = p.category_id
    WHERE (?1 IS NULL OR pu.date >= ?1)
      AND (?2 IS NULL OR pu.date <= ?2)
      AND (?3 IS NULL OR pu.supplier_id = ?3)
    ORDER BY pu.date DESC, pu.document_number, pi.line_no
"#;

const SALE_ROWS: &str = r#"
    SELECT
        'sale' AS kind,
        sa.id AS document_id,
        sa.date,
        sa.document_type,
        sa.document_number,
        u.full_name AS user_name,
        cl.document_number AS party_document,
        cl.full_name AS party_name,
        p.code AS product_code,
        p.name AS product_name,
        COALESCE(c.description, 'No category') AS category,
        si.price_cents AS unit_price_cents,
        si.quantity,
        si.price_cents * si.quantity AS subtotal_cents,
        (SELECT SUM(x.price_cents * x.quantity)
         FROM sale_items x WHERE x.sale_id = sa.id) AS document_total_cents
    FROM sale_items si
    JOIN sales sa ON sa.id = si.sale_id
    JOIN clients cl ON cl.id = sa.client_id
    JOIN users u ON u.id = sa.user_id
    JOIN products p ON p.id = si.product_id
    LEFT JOIN categories c ON c.id = p.category_id
    WHERE (?1 IS NULL OR sa.date >= ?1)
      AND (?2 IS NULL OR sa.date <= ?2)
    ORDER BY sa.date DESC, sa.document_number, si.line_no
"#;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Report rows matching `filter`, newest document first.
    ///
    /// `supplier_id` narrows purchases only; sales have no supplier.
    pub async fn rows(&self, filter: &ReportFilter) -> DbResult<Vec<ReportRow>> {
        let mut rows = Vec::new();

        if filter.kind.includes(ReportKind::Purchase) {
            let purchases = sqlx::query_as::<_, ReportRow>(PURCHASE_ROWS)
                .bind(filter.start_date)
                .bind(filter.end_date)
                .bind(filter.supplier_id.as_deref())
                .fetch_all(&self.pool)
                .await?;
            rows.extend(purchases);
        }

        if filter.kind.includes(ReportKind::Sale) {
            let sales = sqlx::query_as::<_, ReportRow>(SALE_ROWS)
                .bind(filter.start_date)
                .bind(filter.end_date)
                .fetch_all(&self.pool)
                .await?;
            rows.extend(sales);
        }

        // Stable: keeps line order within a document.
        rows.sort_by(|a, b| b.date.cmp(&a.date));

        debug!(rows = rows.len(), kind = ?filter.kind, "Built report");
        Ok(rows)
    }
}
