//! # Adjustment Repository
//!
//! Read side of manual stock movements. Rows are written by
//! [`LedgerRepository::record_adjustment`], the bulk import and product
//! creation; a trigger rejects any UPDATE.
//!
//! [`LedgerRepository::record_adjustment`]: crate::repository::ledger::LedgerRepository::record_adjustment

use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use nailed_core::InventoryAdjustment;

const ADJUSTMENT_SELECT: &str = r#"
    SELECT
        a.id,
        a.product_id,
        p.code AS product_code,
        p.name AS product_name,
        a.adjustment_type,
        a.quantity,
        a.reason,
        a.date,
        a.created_at
    FROM inventory_adjustments a
    JOIN products p ON p.id = a.product_id
"#;

#[derive(Debug, Clone)]
pub struct AdjustmentRepository {
    pool: SqlitePool,
}

impl AdjustmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdjustmentRepository { pool }
    }

    /// Lists adjustments newest first.
    pub async fn list(&self) -> DbResult<Vec<InventoryAdjustment>> {
        let sql = format!("{ADJUSTMENT_SELECT} ORDER BY a.date DESC, a.created_at DESC");
        let adjustments = sqlx::query_as::<_, InventoryAdjustment>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(adjustments)
    }

    /// Lists the adjustments of one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<InventoryAdjustment>> {
        let sql = format!(
            "{ADJUSTMENT_SELECT} WHERE a.product_id = ?1 ORDER BY a.date DESC, a.created_at DESC"
        );
        let adjustments = sqlx::query_as::<_, InventoryAdjustment>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(adjustments)
    }

    pub async fn get(&self, id: &str) -> DbResult<InventoryAdjustment> {
        let sql = format!("{ADJUSTMENT_SELECT} WHERE a.id = ?1");
        sqlx::query_as::<_, InventoryAdjustment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Adjustment", id))
    }
}
