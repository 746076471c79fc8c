//! # Category Repository
//!
//! Product categories. Descriptions are unique ignoring case (the column is
//! `COLLATE NOCASE`), which is also how the bulk import matches them.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use nailed_core::{Category, CategoryInput};

const CATEGORY_SELECT: &str =
    "SELECT id, description, status, created_at, updated_at FROM categories";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists categories ordered by description.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql = format!("{CATEGORY_SELECT} ORDER BY description");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn get(&self, id: &str) -> DbResult<Category> {
        let sql = format!("{CATEGORY_SELECT} WHERE id = ?1");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Creates a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Same description exists (any case)
    pub async fn create(&self, input: &CategoryInput) -> DbResult<Category> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let description = input.description.trim();

        debug!(description = %description, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, description, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(&id)
        .bind(description)
        .bind(input.status)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(description))?;

        self.get(&id).await
    }

    pub async fn update(&self, id: &str, input: &CategoryInput) -> DbResult<Category> {
        input.validate()?;
        let description = input.description.trim();

        debug!(id = %id, description = %description, "Updating category");

        let result = sqlx::query(
            "UPDATE categories SET description = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(description)
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(description))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        self.get(id).await
    }

    /// Enables or disables a category. Products keep their reference.
    pub async fn set_status(&self, id: &str, status: bool) -> DbResult<()> {
        debug!(id = %id, status, "Setting category status");

        let result =
            sqlx::query("UPDATE categories SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(status)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }
}

/// Loads `(description, id)` for every category inside a transaction.
pub(crate) async fn load_pairs(conn: &mut SqliteConnection) -> DbResult<Vec<(String, String)>> {
    let pairs = sqlx::query_as::<_, (String, String)>("SELECT description, id FROM categories")
        .fetch_all(&mut *conn)
        .await?;
    Ok(pairs)
}

/// Inserts an active category inside a transaction and returns its id.
pub(crate) async fn insert_category(
    conn: &mut SqliteConnection,
    description: &str,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();
    debug!(description = %description, "Creating category during import");

    sqlx::query(
        r#"
        INSERT INTO categories (id, description, status, created_at, updated_at)
        VALUES (?1, ?2, 1, ?3, ?3)
        "#,
    )
    .bind(&id)
    .bind(description)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_value(description))?;

    Ok(id)
}
