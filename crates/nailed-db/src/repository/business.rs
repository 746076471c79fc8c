//! # Business Repository
//!
//! Letterhead records printed on documents. Unlike the other reference
//! data these are hard-deleted; nothing in the ledger points at them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use nailed_core::validation::clean_optional;
use nailed_core::{Business, BusinessInput};

const BUSINESS_SELECT: &str =
    "SELECT id, name, tax_id, address, logo_url, created_at, updated_at FROM businesses";

#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Business>> {
        let sql = format!("{BUSINESS_SELECT} ORDER BY name");
        let businesses = sqlx::query_as::<_, Business>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(businesses)
    }

    pub async fn get(&self, id: &str) -> DbResult<Business> {
        let sql = format!("{BUSINESS_SELECT} WHERE id = ?1");
        sqlx::query_as::<_, Business>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Business", id))
    }

    pub async fn create(&self, input: &BusinessInput) -> DbResult<Business> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        let tax_id = input.tax_id.trim();
        debug!(tax_id = %tax_id, "Creating business");

        sqlx::query(
            r#"
            INSERT INTO businesses (id, name, tax_id, address, logo_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(tax_id)
        .bind(clean_optional(&input.address))
        .bind(clean_optional(&input.logo_url))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(tax_id))?;

        self.get(&id).await
    }

    pub async fn update(&self, id: &str, input: &BusinessInput) -> DbResult<Business> {
        input.validate()?;
        let tax_id = input.tax_id.trim();

        let result = sqlx::query(
            r#"
            UPDATE businesses SET
                name = ?2,
                tax_id = ?3,
                address = ?4,
                logo_url = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(tax_id)
        .bind(clean_optional(&input.address))
        .bind(clean_optional(&input.logo_url))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(tax_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting business");

        let result = sqlx::query("DELETE FROM businesses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }
        Ok(())
    }
}
