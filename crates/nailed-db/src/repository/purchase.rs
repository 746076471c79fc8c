//! # Purchase Repository
//!
//! Read side of supplier receipts. Purchases are written only by
//! [`LedgerRepository::record_purchase`] and are never updated or deleted.
//!
//! [`LedgerRepository::record_purchase`]: crate::repository::ledger::LedgerRepository::record_purchase

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use nailed_core::{Purchase, PurchaseItem};

const PURCHASE_SELECT: &str = r#"
    SELECT
        pu.id,
        pu.date,
        pu.document_type,
        pu.document_number,
        pu.supplier_id,
        s.company_name AS supplier_name,
        pu.user_id,
        u.full_name AS user_name,
        COALESCE(
            (SELECT SUM(pi.purchase_price_cents * pi.quantity)
             FROM purchase_items pi WHERE pi.purchase_id = pu.id),
            0
        ) AS total_cents,
        pu.created_at
    FROM purchases pu
    JOIN suppliers s ON s.id = pu.supplier_id
    JOIN users u ON u.id = pu.user_id
"#;

const ITEM_SELECT: &str = r#"
    SELECT
        pi.id,
        pi.purchase_id,
        pi.line_no,
        pi.product_id,
        p.code AS product_code,
        p.name AS product_name,
        pi.purchase_price_cents,
        pi.sale_price_cents,
        pi.quantity
    FROM purchase_items pi
    JOIN products p ON p.id = pi.product_id
"#;

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Lists purchases newest first, each with its lines.
    pub async fn list(&self) -> DbResult<Vec<Purchase>> {
        let sql = format!("{PURCHASE_SELECT} ORDER BY pu.date DESC, pu.created_at DESC");
        let mut purchases = sqlx::query_as::<_, Purchase>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!("{ITEM_SELECT} ORDER BY pi.purchase_id, pi.line_no");
        let items = sqlx::query_as::<_, PurchaseItem>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut by_purchase: HashMap<String, Vec<PurchaseItem>> = HashMap::new();
        for item in items {
            by_purchase
                .entry(item.purchase_id.clone())
                .or_default()
                .push(item);
        }
        for purchase in &mut purchases {
            purchase.items = by_purchase.remove(&purchase.id).unwrap_or_default();
        }

        debug!(count = purchases.len(), "Listed purchases");
        Ok(purchases)
    }

    pub async fn get(&self, id: &str) -> DbResult<Purchase> {
        let sql = format!("{PURCHASE_SELECT} WHERE pu.id = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))?;
        self.with_items(purchase).await
    }

    pub async fn get_by_document_number(&self, document_number: &str) -> DbResult<Purchase> {
        let document_number = document_number.trim();
        let sql = format!("{PURCHASE_SELECT} WHERE pu.document_number = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(document_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", document_number))?;
        self.with_items(purchase).await
    }

    async fn with_items(&self, mut purchase: Purchase) -> DbResult<Purchase> {
        let sql = format!("{ITEM_SELECT} WHERE pi.purchase_id = ?1 ORDER BY pi.line_no");
        purchase.items = sqlx::query_as::<_, PurchaseItem>(&sql)
            .bind(&purchase.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(purchase)
    }
}
