//! # Product Repository
//!
//! Reads and non-stock writes for products.
//!
//! Creating a product is a ledger write (its opening stock is an ENTRY
//! adjustment), so it lives in [`LedgerRepository::create_product`]. This
//! repository never touches `products.stock`.
//!
//! [`LedgerRepository::create_product`]: crate::repository::ledger::LedgerRepository::create_product

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use nailed_core::validation::clean_optional;
use nailed_core::{Product, ProductInput};

/// Product columns with the category description joined in.
pub(crate) const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.code,
        p.name,
        p.description,
        p.category_id,
        c.description AS category_name,
        p.bottle_size,
        p.unit_quantity,
        p.sale_price_cents,
        p.stock,
        p.status,
        p.created_at,
        p.updated_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let all = repo.list().await?;
/// let gin = repo.get_by_code("GIN-750").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, ordered by code.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{PRODUCT_SELECT} ORDER BY p.code");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product found
    /// * `Err(DbError::NotFound)` - No product with that ID
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Gets a product by its business code (exact match after trimming).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Product> {
        let code = code.trim();
        let sql = format!("{PRODUCT_SELECT} WHERE p.code = ?1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", code))
    }

    /// Updates the descriptive fields of a product. Stock is left as is.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product or referenced category missing
    /// * `Err(DbError::UniqueViolation)` - Another product already has the code
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;
        debug!(id = %id, code = %input.code, "Updating product");

        let code = input.code.trim();
        let category_id = clean_optional(&input.category_id);

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                description = ?4,
                category_id = ?5,
                bottle_size = ?6,
                unit_quantity = ?7,
                sale_price_cents = ?8,
                status = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(input.name.trim())
        .bind(clean_optional(&input.description))
        .bind(&category_id)
        .bind(input.bottle_size)
        .bind(input.unit_quantity)
        .bind(input.sale_price_cents)
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| classify_write_error(e, code, category_id.as_deref()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Enables or disables a product. `DELETE` on the API lands here with
    /// `false`; history that references the product stays intact.
    pub async fn set_status(&self, id: &str, status: bool) -> DbResult<()> {
        debug!(id = %id, status, "Setting product status");

        let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Counts active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Inserts a product row on an open connection or transaction.
///
/// The caller owns the transaction and any ledger rows that go with the
/// opening stock.
pub(crate) async fn insert_product(
    conn: &mut SqliteConnection,
    id: &str,
    input: &NewProductRow<'_>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(code = %input.code, stock = input.stock, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, code, name, description, category_id, bottle_size,
            unit_quantity, sale_price_cents, stock, status,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
        "#,
    )
    .bind(id)
    .bind(input.code)
    .bind(input.name)
    .bind(input.description)
    .bind(input.category_id)
    .bind(input.bottle_size)
    .bind(input.unit_quantity)
    .bind(input.sale_price_cents)
    .bind(input.stock)
    .bind(input.status)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| classify_write_error(e, input.code, input.category_id))?;

    Ok(())
}

/// Column values for a new product row, already trimmed.
#[derive(Debug, Clone)]
pub(crate) struct NewProductRow<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category_id: Option<&'a str>,
    pub bottle_size: Option<i64>,
    pub unit_quantity: i64,
    pub sale_price_cents: i64,
    pub stock: i64,
    pub status: bool,
}

/// Duplicate codes carry the code; a dangling category becomes NotFound.
fn classify_write_error(err: sqlx::Error, code: &str, category_id: Option<&str>) -> DbError {
    match DbError::from(err) {
        DbError::ForeignKeyViolation { .. } => {
            DbError::not_found("Category", category_id.unwrap_or("unknown"))
        }
        other => other.with_value(code),
    }
}
