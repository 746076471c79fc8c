//! # Ledger Repository
//!
//! Every write that moves `products.stock`, plus the read paths that
//! re-derive stock from history.
//!
//! ## Stock Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    products.stock is a cache                            │
//! │                                                                         │
//! │  stock(P) = Σ purchase_items.qty + Σ ENTRY adjustments                 │
//! │           - Σ sale_items.qty     - Σ EXIT adjustments                  │
//! │                                                                         │
//! │  Write path (one transaction each):                                    │
//! │    record_purchase    INSERT purchase + items, stock += qty            │
//! │    record_sale        check all lines, INSERT sale + items,            │
//! │                       stock -= qty WHERE stock >= qty                  │
//! │    record_adjustment  INSERT adjustment, stock ± qty                   │
//! │    create_product     INSERT product, ENTRY for opening stock          │
//! │    import_inventory   categories + products + ENTRY per row            │
//! │                                                                         │
//! │  Read path (no writes):                                                │
//! │    compute_derived_inventory / reconcile                               │
//! │      load events ─► nailed_core::ledger::derive_stock ─► compare       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Writers open their transaction with `BEGIN IMMEDIATE`, which takes the
//! SQLite write lock before the first read. Two sales racing for the last
//! unit therefore run one after the other: the second waits on the pool's
//! busy timeout and then re-reads the already decremented stock.
//!
//! Never touch `self.pool` while a transaction is open. An in-memory pool
//! has a single connection and would wait forever.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::adjustment::AdjustmentRepository;
use crate::repository::category::{insert_category, load_pairs};
use crate::repository::product::{insert_product, NewProductRow, ProductRepository};
use crate::repository::purchase::PurchaseRepository;
use crate::repository::sale::SaleRepository;
use nailed_core::import::{self, CategoryCache, ImportRow, ImportSummary, NormalizedRow};
use nailed_core::ledger::{self, CachedStock, LedgerEvent, StockDiscrepancy, StockMovement};
use nailed_core::validation::{clean_optional, validate_initial_stock};
use nailed_core::{
    AdjustmentInput, AdjustmentType, CoreError, InventoryAdjustment, InventoryRow, Product,
    ProductInput, Purchase, PurchaseDocument, Sale, SaleDocument, UNCATEGORIZED_LABEL,
};

/// Reason recorded for the opening stock of a product created by hand.
pub const INITIAL_STOCK_REASON: &str = "Initial product registration";

/// Reason recorded for the opening stock of an imported product.
pub const BULK_LOAD_REASON: &str = "Bulk load";

/// Repository for stock-moving writes.
///
/// ## Usage
/// ```rust,ignore
/// let sale = db.ledger().record_sale(&document, &session.user_id).await?;
///
/// let summary = db
///     .ledger()
///     .import_inventory(&rows, Duration::from_secs(30))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Opens a write transaction holding the SQLite write lock.
    async fn begin_write(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::QueryFailed(msg) => DbError::TransactionFailed(msg),
                other => other,
            })
    }

    // =========================================================================
    // Adjustments
    // =========================================================================

    /// Records a manual stock movement.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::Domain(InsufficientStock))` - EXIT larger than stock
    pub async fn record_adjustment(&self, input: &AdjustmentInput) -> DbResult<InventoryAdjustment> {
        input.validate()?;

        let mut tx = self.begin_write().await?;

        let (code, stock) = fetch_stock(&mut tx, &input.product_id).await?;
        if let Err(e) =
            ledger::apply_adjustment(&code, stock, input.adjustment_type, input.quantity)
        {
            warn!(code = %code, stock, quantity = input.quantity, "Adjustment refused");
            return Err(e.into());
        }

        let now = Utc::now();
        let id = insert_adjustment(
            &mut tx,
            &input.product_id,
            input.adjustment_type,
            input.quantity,
            input.reason.trim(),
            now,
        )
        .await?;
        move_stock(
            &mut tx,
            &input.product_id,
            input.adjustment_type.signed(input.quantity),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(
            code = %code,
            kind = ?input.adjustment_type,
            quantity = input.quantity,
            "Adjustment recorded"
        );
        AdjustmentRepository::new(self.pool.clone()).get(&id).await
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Records a supplier receipt.
    ///
    /// Each line adds its quantity to the product's stock and overwrites the
    /// product's resale price with the line's `sale_price_cents`.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Document number already used
    /// * `Err(DbError::NotFound)` - Supplier, user or product missing
    pub async fn record_purchase(&self, document: &PurchaseDocument, user_id: &str) -> DbResult<Purchase> {
        document.validate()?;
        let document_number = document.document_number.trim();

        let mut tx = self.begin_write().await?;

        ensure_exists(&mut tx, "suppliers", "Supplier", &document.supplier_id).await?;
        ensure_exists(&mut tx, "users", "User", user_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, date, document_type, document_number, supplier_id, user_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(document.date)
        .bind(document.document_type.trim())
        .bind(document_number)
        .bind(&document.supplier_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(document_number))?;

        for (line_no, line) in document.items.iter().enumerate() {
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    stock = stock + ?2,
                    sale_price_cents = ?3,
                    updated_at = ?4
                WHERE id = ?1
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.sale_price_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", &line.product_id));
            }

            sqlx::query(
                r#"
                INSERT INTO purchase_items (
                    id, purchase_id, line_no, product_id,
                    purchase_price_cents, sale_price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(line_no as i64 + 1)
            .bind(&line.product_id)
            .bind(line.purchase_price_cents)
            .bind(line.sale_price_cents)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            document_number = %document_number,
            lines = document.items.len(),
            "Purchase recorded"
        );
        PurchaseRepository::new(self.pool.clone()).get(&id).await
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Records a sale.
    ///
    /// ## Steps (one `BEGIN IMMEDIATE` transaction)
    /// 1. Sum requested quantities per product
    /// 2. Re-read each product's stock and check it covers the sum
    /// 3. Insert the sale and its lines
    /// 4. Decrement stock, guarded by `stock >= qty`
    ///
    /// Nothing is written unless every product passes step 2.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(InsufficientStock))` - Names the first short product
    /// * `Err(DbError::UniqueViolation)` - Document number already used
    /// * `Err(DbError::NotFound)` - Client, user or product missing
    pub async fn record_sale(&self, document: &SaleDocument, user_id: &str) -> DbResult<Sale> {
        document.validate()?;
        let document_number = document.document_number.trim();

        let requested = ledger::aggregate_quantities(
            document
                .items
                .iter()
                .map(|line| (line.product_id.as_str(), line.quantity)),
        );

        let mut tx = self.begin_write().await?;

        ensure_exists(&mut tx, "clients", "Client", &document.client_id).await?;
        ensure_exists(&mut tx, "users", "User", user_id).await?;

        let mut codes: BTreeMap<&str, String> = BTreeMap::new();
        for (product_id, quantity) in &requested {
            let (code, stock) = fetch_stock(&mut tx, product_id).await?;
            if let Err(e) = ledger::check_availability(&code, stock, *quantity) {
                warn!(code = %code, stock, requested = *quantity, "Sale refused");
                return Err(e.into());
            }
            codes.insert(product_id.as_str(), code);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, date, document_type, document_number, client_id, user_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(document.date)
        .bind(document.document_type.trim())
        .bind(document_number)
        .bind(&document.client_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(document_number))?;

        for (line_no, line) in document.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, product_id, price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(line_no as i64 + 1)
            .bind(&line.product_id)
            .bind(line.price_cents)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        for (product_id, quantity) in &requested {
            let result = sqlx::query(
                r#"
                UPDATE products SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(product_id)
            .bind(*quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let code = codes
                    .get(product_id.as_str())
                    .cloned()
                    .unwrap_or_else(|| product_id.clone());
                let (_, available) = fetch_stock(&mut tx, product_id).await?;
                return Err(CoreError::InsufficientStock {
                    code,
                    available,
                    requested: *quantity,
                }
                .into());
            }
        }

        tx.commit().await?;

        info!(
            document_number = %document_number,
            lines = document.items.len(),
            "Sale recorded"
        );
        SaleRepository::new(self.pool.clone()).get(&id).await
    }

    // =========================================================================
    // Products with opening stock
    // =========================================================================

    /// Creates a product. A positive `initial_stock` is written together
    /// with an ENTRY adjustment so the history explains it.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already used
    /// * `Err(DbError::NotFound)` - Category missing
    pub async fn create_product(&self, input: &ProductInput, initial_stock: i64) -> DbResult<Product> {
        input.validate()?;
        validate_initial_stock(initial_stock)?;

        let description = clean_optional(&input.description);
        let category_id = clean_optional(&input.category_id);
        let row = NewProductRow {
            code: input.code.trim(),
            name: input.name.trim(),
            description: description.as_deref(),
            category_id: category_id.as_deref(),
            bottle_size: input.bottle_size,
            unit_quantity: input.unit_quantity,
            sale_price_cents: input.sale_price_cents,
            stock: initial_stock,
            status: input.status,
        };

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.begin_write().await?;
        insert_product(&mut tx, &id, &row, now).await?;
        if initial_stock > 0 {
            insert_adjustment(
                &mut tx,
                &id,
                AdjustmentType::Entry,
                initial_stock,
                INITIAL_STOCK_REASON,
                now,
            )
            .await?;
        }
        tx.commit().await?;

        info!(code = %row.code, initial_stock, "Product created");
        ProductRepository::new(self.pool.clone()).get(&id).await
    }

    // =========================================================================
    // Bulk import
    // =========================================================================

    /// Imports already-parsed spreadsheet rows.
    ///
    /// Every row is validated before anything is written. Existing codes,
    /// and codes repeated later in the same batch, are skipped and left
    /// untouched. Missing categories are created once per import.
    ///
    /// The whole import is one transaction. Waiting for the write lock and
    /// staging the rows are bounded by `timeout`; on expiry the transaction
    /// is rolled back and `DbError::Timeout` is returned. The commit runs
    /// after the deadline check, so a `Timeout` always means nothing was
    /// written.
    pub async fn import_inventory(&self, rows: &[ImportRow], timeout: Duration) -> DbResult<ImportSummary> {
        let normalized = import::normalize_rows(rows)?;
        debug!(rows = normalized.len(), "Import rows validated");

        let (tx, summary) = match tokio::time::timeout(timeout, self.stage_import(normalized)).await {
            Ok(staged) => staged?,
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Inventory import timed out");
                return Err(DbError::Timeout(format!(
                    "inventory import exceeded {}s and was rolled back",
                    timeout.as_secs()
                )));
            }
        };

        tx.commit().await?;
        info!(
            created = summary.created,
            skipped = summary.skipped,
            "Inventory import committed"
        );
        Ok(summary)
    }

    /// Writes the import inside an open transaction and hands it back
    /// uncommitted.
    async fn stage_import(
        &self,
        rows: Vec<NormalizedRow>,
    ) -> DbResult<(Transaction<'static, Sqlite>, ImportSummary)> {
        let mut tx = self.begin_write().await?;

        let existing: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT code FROM products")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();
        let plan = import::plan_import(rows, &existing);

        let mut categories = CategoryCache::from_existing(load_pairs(&mut tx).await?);
        let now = Utc::now();

        for row in &plan.to_create {
            let cached = categories.get(&row.category_name).map(str::to_string);
            let category_id = match cached {
                Some(id) => id,
                None => {
                    let id = insert_category(&mut tx, &row.category_name, now).await?;
                    categories.insert(&row.category_name, id.clone());
                    id
                }
            };

            let product_id = Uuid::new_v4().to_string();
            let product = NewProductRow {
                code: &row.code,
                name: &row.name,
                description: row.description.as_deref(),
                category_id: Some(&category_id),
                bottle_size: row.bottle_size,
                unit_quantity: row.unit_quantity,
                sale_price_cents: row.sale_price_cents,
                stock: row.stock,
                status: true,
            };
            insert_product(&mut tx, &product_id, &product, now).await?;

            if row.stock > 0 {
                insert_adjustment(
                    &mut tx,
                    &product_id,
                    AdjustmentType::Entry,
                    row.stock,
                    BULK_LOAD_REASON,
                    now,
                )
                .await?;
            }
        }

        debug!(categories = categories.len(), "Import staged");
        let summary = ImportSummary {
            created: plan.to_create.len(),
            skipped: plan.skipped,
        };
        Ok((tx, summary))
    }

    // =========================================================================
    // Derived stock
    // =========================================================================

    /// Recomputes entries and exits for every product from the ledger
    /// tables, next to the cached stock. Ordered by code.
    ///
    /// Events and cached stock are read from one snapshot, so a write
    /// committing halfway through cannot show up on only one side.
    pub async fn compute_derived_inventory(&self) -> DbResult<Vec<InventoryRow>> {
        let mut tx = self.pool.begin().await?;
        let derived = ledger::derive_stock(&load_events(&mut tx).await?);

        let products = sqlx::query_as::<_, (String, String, String, Option<String>, Option<i64>, i64, i64)>(
            r#"
            SELECT p.id, p.code, p.name, c.description, p.bottle_size,
                   p.sale_price_cents, p.stock
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.code
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let rows = products
            .into_iter()
            .map(
                |(product_id, code, name, category, bottle_size, sale_price_cents, stock)| {
                    let movement: StockMovement =
                        derived.get(&product_id).copied().unwrap_or_default();
                    InventoryRow {
                        product_id,
                        code,
                        name,
                        category: category.unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string()),
                        bottle_size,
                        sale_price_cents,
                        entries: movement.entries,
                        exits: movement.exits,
                        derived_stock: movement.stock(),
                        stock,
                    }
                },
            )
            .collect();

        Ok(rows)
    }

    /// Lists products whose cached stock disagrees with their history.
    /// Empty means the ledger is consistent.
    pub async fn reconcile(&self) -> DbResult<Vec<StockDiscrepancy>> {
        let mut tx = self.pool.begin().await?;
        let derived = ledger::derive_stock(&load_events(&mut tx).await?);

        let cached = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT id, code, stock FROM products ORDER BY code",
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let cached = cached.into_iter().map(|(product_id, code, stock)| CachedStock {
            product_id,
            code,
            stock,
        });

        let discrepancies = ledger::reconcile(cached, &derived);
        if discrepancies.is_empty() {
            debug!("Stock cache matches ledger");
        } else {
            warn!(count = discrepancies.len(), "Stock cache drifted from ledger");
        }
        Ok(discrepancies)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Loads every purchase line, sale line and adjustment as an event.
async fn load_events(conn: &mut SqliteConnection) -> DbResult<Vec<LedgerEvent>> {
    let purchases =
        sqlx::query_as::<_, (String, i64)>("SELECT product_id, quantity FROM purchase_items")
            .fetch_all(&mut *conn)
            .await?;
    let sales = sqlx::query_as::<_, (String, i64)>("SELECT product_id, quantity FROM sale_items")
        .fetch_all(&mut *conn)
        .await?;
    let adjustments = sqlx::query_as::<_, (String, AdjustmentType, i64)>(
        "SELECT product_id, adjustment_type, quantity FROM inventory_adjustments",
    )
    .fetch_all(&mut *conn)
    .await?;

    let events: Vec<LedgerEvent> = purchases
        .into_iter()
        .map(|(product_id, qty)| LedgerEvent::purchase(product_id, qty))
        .chain(
            sales
                .into_iter()
                .map(|(product_id, qty)| LedgerEvent::sale(product_id, qty)),
        )
        .chain(
            adjustments
                .into_iter()
                .map(|(product_id, kind, qty)| LedgerEvent::adjustment(product_id, kind, qty)),
        )
        .collect();

    debug!(events = events.len(), "Loaded ledger events");
    Ok(events)
}

/// Reads `(code, stock)` for a product inside the transaction.
async fn fetch_stock(conn: &mut SqliteConnection, product_id: &str) -> DbResult<(String, i64)> {
    sqlx::query_as::<_, (String, i64)>("SELECT code, stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))
}

/// Fails with NotFound unless `table` has a row with `id`.
async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &str,
    id: &str,
) -> DbResult<()> {
    let sql = format!("SELECT 1 FROM {table} WHERE id = ?1");
    let found: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    found.map(|_| ()).ok_or_else(|| DbError::not_found(entity, id))
}

async fn insert_adjustment(
    conn: &mut SqliteConnection,
    product_id: &str,
    adjustment_type: AdjustmentType,
    quantity: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO inventory_adjustments (
            id, product_id, adjustment_type, quantity, reason, date, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        "#,
    )
    .bind(&id)
    .bind(product_id)
    .bind(adjustment_type)
    .bind(quantity)
    .bind(reason)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

async fn move_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{
        memory_db, product_input, seed_client, seed_product, seed_supplier, seed_user,
    };
    use crate::{Database, DbConfig};
    use nailed_core::{PurchaseLine, SaleLine};

    fn purchase(number: &str, supplier_id: &str, lines: Vec<PurchaseLine>) -> PurchaseDocument {
        PurchaseDocument {
            date: Utc::now(),
            document_type: "INVOICE".to_string(),
            document_number: number.to_string(),
            supplier_id: supplier_id.to_string(),
            items: lines,
        }
    }

    fn purchase_line(product_id: &str, qty: i64, cost: i64, price: i64) -> PurchaseLine {
        PurchaseLine {
            product_id: product_id.to_string(),
            purchase_price_cents: cost,
            sale_price_cents: price,
            quantity: qty,
        }
    }

    fn sale(number: &str, client_id: &str, lines: Vec<SaleLine>) -> SaleDocument {
        SaleDocument {
            date: Utc::now(),
            document_type: "RECEIPT".to_string(),
            document_number: number.to_string(),
            client_id: client_id.to_string(),
            items: lines,
        }
    }

    fn sale_line(product_id: &str, qty: i64, price: i64) -> SaleLine {
        SaleLine {
            product_id: product_id.to_string(),
            price_cents: price,
            quantity: qty,
        }
    }

    fn import_row(code: &str, category: Option<&str>, stock: i64) -> ImportRow {
        ImportRow {
            code: code.to_string(),
            name: format!("Imported {code}"),
            category: category.map(str::to_string),
            stock,
            price: 1200,
            description: None,
            bottle_size: Some(700),
            unit_quantity: None,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get(id).await.unwrap().stock
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_purchase_then_sales_example() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let supplier_id = seed_supplier(&db).await;
        let client_id = seed_client(&db).await;
        let p1 = seed_product(&db, "P1", 0).await;

        db.ledger()
            .record_purchase(
                &purchase("F-1", &supplier_id, vec![purchase_line(&p1.id, 10, 200, 500)]),
                &user_id,
            )
            .await
            .unwrap();
        let after_purchase = db.products().get(&p1.id).await.unwrap();
        assert_eq!(after_purchase.stock, 10);
        assert_eq!(after_purchase.sale_price_cents, 500);

        db.ledger()
            .record_sale(&sale("R-1", &client_id, vec![sale_line(&p1.id, 3, 500)]), &user_id)
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &p1.id).await, 7);

        let err = db
            .ledger()
            .record_sale(&sale("R-2", &client_id, vec![sale_line(&p1.id, 8, 500)]), &user_id)
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P1: available 7, requested 8"
        );
        assert_eq!(stock_of(&db, &p1.id).await, 7);

        assert!(db.ledger().reconcile().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_sale_rolls_back_everything() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let client_id = seed_client(&db).await;
        let plenty = seed_product(&db, "PLENTY", 50).await;
        let scarce = seed_product(&db, "SCARCE", 1).await;

        let err = db
            .ledger()
            .record_sale(
                &sale(
                    "R-1",
                    &client_id,
                    vec![sale_line(&plenty.id, 5, 100), sale_line(&scarce.id, 2, 100)],
                ),
                &user_id,
            )
            .await
            .unwrap_err();

        assert!(err.is_insufficient_stock());
        assert!(err.to_string().contains("SCARCE"));
        assert_eq!(stock_of(&db, &plenty.id).await, 50);
        assert_eq!(stock_of(&db, &scarce.id).await, 1);
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(count(&db, "sale_items").await, 0);
    }

    #[tokio::test]
    async fn test_sale_lines_for_same_product_are_summed() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, "P1", 5).await;

        let err = db
            .ledger()
            .record_sale(
                &sale(
                    "R-1",
                    &client_id,
                    vec![sale_line(&product.id, 3, 100), sale_line(&product.id, 3, 100)],
                ),
                &user_id,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P1: available 5, requested 6"
        );

        let ok = db
            .ledger()
            .record_sale(
                &sale(
                    "R-2",
                    &client_id,
                    vec![sale_line(&product.id, 2, 100), sale_line(&product.id, 3, 100)],
                ),
                &user_id,
            )
            .await
            .unwrap();
        assert_eq!(ok.items.len(), 2);
        assert_eq!(stock_of(&db, &product.id).await, 0);
    }

    #[tokio::test]
    async fn test_sale_with_unknown_client_or_product() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, "P1", 5).await;
        let ghost = "00000000-0000-4000-8000-000000000000";

        let err = db
            .ledger()
            .record_sale(&sale("R-1", ghost, vec![sale_line(&product.id, 1, 100)]), &user_id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = db
            .ledger()
            .record_sale(&sale("R-1", &client_id, vec![sale_line(ghost, 1, 100)]), &user_id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(count(&db, "sales").await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_sale_document_number() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, "P1", 5).await;

        let doc = sale("R-1", &client_id, vec![sale_line(&product.id, 1, 100)]);
        db.ledger().record_sale(&doc, &user_id).await.unwrap();

        let err = db.ledger().record_sale(&doc, &user_id).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(stock_of(&db, &product.id).await, 4);
    }

    #[tokio::test]
    async fn test_duplicate_purchase_leaves_stock_unchanged() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let supplier_id = seed_supplier(&db).await;
        let product = seed_product(&db, "P1", 0).await;

        let doc = purchase("F-1", &supplier_id, vec![purchase_line(&product.id, 4, 100, 300)]);
        db.ledger().record_purchase(&doc, &user_id).await.unwrap();

        let err = db.ledger().record_purchase(&doc, &user_id).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(
            err.to_string(),
            "Duplicate purchases.document_number: 'F-1' already exists"
        );
        assert_eq!(stock_of(&db, &product.id).await, 4);
        assert_eq!(count(&db, "purchase_items").await, 1);
    }

    #[tokio::test]
    async fn test_purchase_with_unknown_product_rolls_back() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let supplier_id = seed_supplier(&db).await;
        let product = seed_product(&db, "P1", 0).await;

        let err = db
            .ledger()
            .record_purchase(
                &purchase(
                    "F-1",
                    &supplier_id,
                    vec![
                        purchase_line(&product.id, 4, 100, 300),
                        purchase_line("00000000-0000-4000-8000-000000000000", 1, 100, 300),
                    ],
                ),
                &user_id,
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(stock_of(&db, &product.id).await, 0);
        assert_eq!(count(&db, "purchases").await, 0);
    }

    #[tokio::test]
    async fn test_purchase_with_unknown_supplier() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let product = seed_product(&db, "P1", 0).await;

        let err = db
            .ledger()
            .record_purchase(
                &purchase(
                    "F-1",
                    "00000000-0000-4000-8000-000000000000",
                    vec![purchase_line(&product.id, 1, 100, 300)],
                ),
                &user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Supplier"));
    }

    #[tokio::test]
    async fn test_adjustments_move_stock() {
        let db = memory_db().await;
        let product = seed_product(&db, "P1", 2).await;

        let entry = db
            .ledger()
            .record_adjustment(&AdjustmentInput {
                product_id: product.id.clone(),
                adjustment_type: AdjustmentType::Entry,
                quantity: 5,
                reason: "Found in back room".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(entry.product_code, "P1");
        assert_eq!(stock_of(&db, &product.id).await, 7);

        db.ledger()
            .record_adjustment(&AdjustmentInput {
                product_id: product.id.clone(),
                adjustment_type: AdjustmentType::Exit,
                quantity: 3,
                reason: "Broken bottles".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &product.id).await, 4);

        let err = db
            .ledger()
            .record_adjustment(&AdjustmentInput {
                product_id: product.id.clone(),
                adjustment_type: AdjustmentType::Exit,
                quantity: 5,
                reason: "Too many".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());
        assert_eq!(stock_of(&db, &product.id).await, 4);
        assert!(db.ledger().reconcile().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjustment_unknown_product() {
        let db = memory_db().await;
        let err = db
            .ledger()
            .record_adjustment(&AdjustmentInput {
                product_id: "00000000-0000-4000-8000-000000000000".to_string(),
                adjustment_type: AdjustmentType::Entry,
                quantity: 1,
                reason: "Count".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(count(&db, "inventory_adjustments").await, 0);
    }

    #[tokio::test]
    async fn test_create_product_duplicate_code() {
        let db = memory_db().await;
        seed_product(&db, "P1", 3).await;

        let err = db
            .ledger()
            .create_product(&product_input("P1", 100), 9)
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        // The failed create must not leave an orphan adjustment behind.
        assert_eq!(count(&db, "inventory_adjustments").await, 1);
    }

    #[tokio::test]
    async fn test_import_twice_creates_once() {
        let db = memory_db().await;
        let rows = vec![import_row("W-12", Some("Whisky"), 6)];

        let first = db
            .ledger()
            .import_inventory(&rows, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(first, ImportSummary { created: 1, skipped: 0 });

        let product = db.products().get_by_code("W-12").await.unwrap();
        assert_eq!(product.stock, 6);

        let mut again = rows.clone();
        again[0].stock = 99;
        let second = db
            .ledger()
            .import_inventory(&again, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(second, ImportSummary { created: 0, skipped: 1 });
        assert_eq!(stock_of(&db, &product.id).await, 6);

        let adjustments = db.adjustments().list_for_product(&product.id).await.unwrap();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].reason, BULK_LOAD_REASON);
    }

    #[tokio::test]
    async fn test_import_resolves_categories_once() {
        let db = memory_db().await;
        crate::repository::test_support::seed_category(&db, "Whisky").await;

        let rows = vec![
            import_row("A", Some(" whisky "), 0),
            import_row("B", Some("WHISKY"), 1),
            import_row("C", Some("Rum"), 2),
            import_row("D", Some("rum"), 0),
            import_row("E", None, 0),
            import_row("A", Some("Gin"), 4),
        ];
        let summary = db
            .ledger()
            .import_inventory(&rows, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary { created: 5, skipped: 1 });

        let mut names: Vec<String> = db
            .categories()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.description)
            .collect();
        names.sort();
        assert_eq!(names, vec!["General", "Rum", "Whisky"]);

        let a = db.products().get_by_code("A").await.unwrap();
        assert_eq!(a.category_name.as_deref(), Some("Whisky"));
        assert_eq!(a.stock, 0);
        assert_eq!(count(&db, "inventory_adjustments").await, 2);
        assert!(db.ledger().reconcile().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_invalid_row_writes_nothing() {
        let db = memory_db().await;
        let rows = vec![import_row("OK-1", Some("Gin"), 1), import_row("  ", Some("Gin"), 1)];

        let err = db
            .ledger()
            .import_inventory(&rows, Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidImportRow { row: 2, .. })
        ));
        assert_eq!(count(&db, "products").await, 0);
        assert_eq!(count(&db, "categories").await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_import_timeout_reports_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DbConfig::new(dir.path().join("slow.db"))
                .max_connections(3)
                .busy_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();

        // Another writer holds the lock for longer than the import may run.
        let blocker = db.pool().begin_with("BEGIN IMMEDIATE").await.unwrap();

        let rows = vec![import_row("T-1", Some("Gin"), 1)];
        let err = db
            .ledger()
            .import_inventory(&rows, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Timeout(_)));

        blocker.rollback().await.unwrap();
        assert_eq!(count(&db, "products").await, 0);
    }

    #[tokio::test]
    async fn test_derived_inventory_view() {
        let db = memory_db().await;
        let user_id = seed_user(&db).await;
        let supplier_id = seed_supplier(&db).await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, "P1", 2).await;

        db.ledger()
            .record_purchase(
                &purchase("F-1", &supplier_id, vec![purchase_line(&product.id, 10, 100, 300)]),
                &user_id,
            )
            .await
            .unwrap();
        db.ledger()
            .record_sale(&sale("R-1", &client_id, vec![sale_line(&product.id, 4, 300)]), &user_id)
            .await
            .unwrap();
        db.ledger()
            .record_adjustment(&AdjustmentInput {
                product_id: product.id.clone(),
                adjustment_type: AdjustmentType::Exit,
                quantity: 1,
                reason: "Tasting".to_string(),
            })
            .await
            .unwrap();

        let rows = db.ledger().compute_derived_inventory().await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.category, UNCATEGORIZED_LABEL);
        assert_eq!(row.entries, 12);
        assert_eq!(row.exits, 5);
        assert_eq!(row.derived_stock, 7);
        assert_eq!(row.stock, 7);
    }

    #[tokio::test]
    async fn test_reconcile_reports_drift() {
        let db = memory_db().await;
        let product = seed_product(&db, "P1", 3).await;

        // Simulate a write that bypassed the ledger.
        sqlx::query("UPDATE products SET stock = 10 WHERE id = ?1")
            .bind(&product.id)
            .execute(db.pool())
            .await
            .unwrap();

        let drift = db.ledger().reconcile().await.unwrap();
        assert_eq!(
            drift,
            vec![StockDiscrepancy {
                product_id: product.id.clone(),
                code: "P1".to_string(),
                cached: 10,
                derived: 3,
            }]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_for_last_unit() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("race.db")).max_connections(4))
            .await
            .unwrap();

        let user_id = seed_user(&db).await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, "LAST", 1).await;

        let mut handles = Vec::new();
        for n in 0..2 {
            let ledger = db.ledger();
            let doc = sale(&format!("R-{n}"), &client_id, vec![sale_line(&product.id, 1, 500)]);
            let user_id = user_id.clone();
            handles.push(tokio::spawn(async move {
                ledger.record_sale(&doc, &user_id).await
            }));
        }

        let mut ok = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) if e.is_insufficient_stock() => refused += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!((ok, refused), (1, 1));
        assert_eq!(stock_of(&db, &product.id).await, 0);
        assert!(db.ledger().reconcile().await.unwrap().is_empty());
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reconcile_during_concurrent_sales() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("audit.db")).max_connections(4))
            .await
            .unwrap();

        let user_id = seed_user(&db).await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, "BUSY", 200).await;

        let ledger = db.ledger();
        let product_id = product.id.clone();
        let writer = tokio::spawn(async move {
            for n in 0..150 {
                let doc = sale(&format!("R-{n}"), &client_id, vec![sale_line(&product_id, 1, 500)]);
                ledger.record_sale(&doc, &user_id).await.unwrap();
            }
        });

        let mut runs = 0;
        while !writer.is_finished() {
            let drift = db.ledger().reconcile().await.unwrap();
            assert!(drift.is_empty(), "drift reported mid-write: {drift:?}");

            let rows = db.ledger().compute_derived_inventory().await.unwrap();
            assert!(rows.iter().all(|r| r.derived_stock == r.stock));
            runs += 1;
        }
        writer.await.unwrap();

        assert!(runs > 0);
        assert_eq!(stock_of(&db, &product.id).await, 50);
        assert!(db.ledger().reconcile().await.unwrap().is_empty());
        db.close().await;
    }

    #[tokio::test]
    async fn test_import_keeps_unit_quantity() {
        let db = memory_db().await;
        let rows = vec![
            ImportRow {
                unit_quantity: Some(6),
                ..import_row("SIX", Some("Beer"), 12)
            },
            import_row("ONE", Some("Beer"), 1),
        ];

        db.ledger()
            .import_inventory(&rows, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(db.products().get_by_code("SIX").await.unwrap().unit_quantity, 6);
        assert_eq!(db.products().get_by_code("ONE").await.unwrap().unit_quantity, 1);
    }

    #[tokio::test]
    async fn test_staged_import_is_not_committed() {
        let db = memory_db().await;
        let rows = import::normalize_rows(&[import_row("S-1", Some("Gin"), 3)]).unwrap();

        let (mut tx, summary) = db.ledger().stage_import(rows.clone()).await.unwrap();
        assert_eq!(summary.created, 1);
        let staged: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(staged, 1);

        // Abandoned at the deadline: nothing survives.
        tx.rollback().await.unwrap();
        assert_eq!(count(&db, "products").await, 0);
        assert_eq!(count(&db, "inventory_adjustments").await, 0);

        let (tx, _) = db.ledger().stage_import(rows).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(count(&db, "products").await, 1);
        assert!(db.ledger().reconcile().await.unwrap().is_empty());
    }
}
