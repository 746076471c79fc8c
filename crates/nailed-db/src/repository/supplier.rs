//! # Supplier Repository
//!
//! Companies purchases are received from.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use nailed_core::validation::clean_optional;
use nailed_core::{Supplier, SupplierInput};

const SUPPLIER_SELECT: &str = r#"
    SELECT id, document_number, company_name, email, phone, status, created_at, updated_at
    FROM suppliers
"#;

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers ordered by company name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("{SUPPLIER_SELECT} ORDER BY company_name");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    pub async fn get(&self, id: &str) -> DbResult<Supplier> {
        let sql = format!("{SUPPLIER_SELECT} WHERE id = ?1");
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn find_by_document_number(
        &self,
        document_number: &str,
    ) -> DbResult<Option<Supplier>> {
        let sql = format!("{SUPPLIER_SELECT} WHERE document_number = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(document_number.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn create(&self, input: &SupplierInput) -> DbResult<Supplier> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        let document_number = input.document_number.trim();
        debug!(document_number = %document_number, "Creating supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, document_number, company_name, email, phone, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(document_number)
        .bind(input.company_name.trim())
        .bind(clean_optional(&input.email))
        .bind(clean_optional(&input.phone))
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(document_number))?;

        self.get(&id).await
    }

    pub async fn update(&self, id: &str, input: &SupplierInput) -> DbResult<Supplier> {
        input.validate()?;

        let document_number = input.document_number.trim();
        debug!(id = %id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                document_number = ?2,
                company_name = ?3,
                email = ?4,
                phone = ?5,
                status = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(document_number)
        .bind(input.company_name.trim())
        .bind(clean_optional(&input.email))
        .bind(clean_optional(&input.phone))
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(document_number))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        self.get(id).await
    }

    pub async fn set_status(&self, id: &str, status: bool) -> DbResult<()> {
        debug!(id = %id, status, "Setting supplier status");

        let result =
            sqlx::query("UPDATE suppliers SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(status)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }
}
