//! # Sale Repository
//!
//! Read side of sales to clients. Sales are written only by
//! [`LedgerRepository::record_sale`].
//!
//! [`LedgerRepository::record_sale`]: crate::repository::ledger::LedgerRepository::record_sale

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use nailed_core::{Sale, SaleItem};

const SALE_SELECT: &str = r#"
    SELECT
        sa.id,
        sa.date,
        sa.document_type,
        sa.document_number,
        sa.client_id,
        c.full_name AS client_name,
        c.document_number AS client_document,
        sa.user_id,
        u.full_name AS user_name,
        COALESCE(
            (SELECT SUM(si.price_cents * si.quantity)
             FROM sale_items si WHERE si.sale_id = sa.id),
            0
        ) AS total_cents,
        sa.created_at
    FROM sales sa
    JOIN clients c ON c.id = sa.client_id
    JOIN users u ON u.id = sa.user_id
"#;

const ITEM_SELECT: &str = r#"
    SELECT
        si.id,
        si.sale_id,
        si.line_no,
        si.product_id,
        p.code AS product_code,
        p.name AS product_name,
        si.price_cents,
        si.quantity
    FROM sale_items si
    JOIN products p ON p.id = si.product_id
"#;

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sales newest first, each with its lines.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("{SALE_SELECT} ORDER BY sa.date DESC, sa.created_at DESC");
        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!("{ITEM_SELECT} ORDER BY si.sale_id, si.line_no");
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }
        for sale in &mut sales {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    pub async fn get(&self, id: &str) -> DbResult<Sale> {
        let sql = format!("{SALE_SELECT} WHERE sa.id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;
        self.with_items(sale).await
    }

    pub async fn get_by_document_number(&self, document_number: &str) -> DbResult<Sale> {
        let document_number = document_number.trim();
        let sql = format!("{SALE_SELECT} WHERE sa.document_number = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(document_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", document_number))?;
        self.with_items(sale).await
    }

    /// Number of sales dated on or after `since`.
    pub async fn count_since(&self, since: chrono::DateTime<chrono::Utc>) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE date >= ?1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn with_items(&self, mut sale: Sale) -> DbResult<Sale> {
        let sql = format!("{ITEM_SELECT} WHERE si.sale_id = ?1 ORDER BY si.line_no");
        sale.items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(&sale.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, seed_client, seed_product, seed_user};
    use chrono::Utc;
    use nailed_core::{SaleDocument, SaleLine};

    #[tokio::test]
    async fn test_sale_read_back_with_client_and_lines() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let client_id = seed_client(&db).await;
        let gin = seed_product(&db, "GIN", 10).await;
        let rum = seed_product(&db, "RUM", 10).await;

        let doc = SaleDocument {
            date: Utc::now(),
            document_type: "RECEIPT".to_string(),
            document_number: "R-1".to_string(),
            client_id,
            items: vec![
                SaleLine {
                    product_id: gin.id.clone(),
                    price_cents: 500,
                    quantity: 2,
                },
                SaleLine {
                    product_id: rum.id.clone(),
                    price_cents: 700,
                    quantity: 1,
                },
            ],
        };
        db.ledger().record_sale(&doc, &user_id).await.unwrap();

        let sale = db.sales().get_by_document_number("R-1").await.unwrap();
        assert_eq!(sale.client_name, "Maria Lopez");
        assert_eq!(sale.client_document, "C-100");
        assert_eq!(sale.total_cents, 1700);
        let codes: Vec<&str> = sale.items.iter().map(|i| i.product_code.as_str()).collect();
        assert_eq!(codes, vec!["GIN", "RUM"]);

        assert_eq!(db.sales().list().await.unwrap().len(), 1);
        assert_eq!(
            db.sales()
                .count_since(Utc::now() - chrono::Duration::days(1))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_sale_is_not_found() {
        let db = memory_db().await;
        let err = db.sales().get_by_document_number("R-404").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
