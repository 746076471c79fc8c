//! # Repository Module
//!
//! Database repository implementations for Nailed Inventory.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes What                                      │
//! │                                                                         │
//! │  Reference data (plain CRUD, soft delete via status):                  │
//! │    ProductRepository  CategoryRepository  ClientRepository             │
//! │    SupplierRepository UserRepository      BusinessRepository           │
//! │                                                                         │
//! │  Ledger documents (read side only):                                    │
//! │    PurchaseRepository SaleRepository      AdjustmentRepository         │
//! │                                                                         │
//! │  Stock ledger (every write that moves products.stock):                 │
//! │    LedgerRepository                                                    │
//! │      record_adjustment / record_purchase / record_sale                 │
//! │      import_inventory / create_product                                 │
//! │      compute_derived_inventory / reconcile                             │
//! │                                                                         │
//! │  Read models:                                                          │
//! │    DashboardRepository ReportRepository                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository is a cheap `Clone` around the pool. Writes that span
//! more than one statement run in a single transaction; dropping a
//! `sqlx::Transaction` without committing rolls it back.

pub mod adjustment;
pub mod business;
pub mod category;
pub mod client;
pub mod dashboard;
pub mod ledger;
pub mod product;
pub mod purchase;
pub mod report;
pub mod sale;
pub mod supplier;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for repository tests.

    use nailed_core::{
        CategoryInput, ClientInput, Product, ProductInput, Role, SupplierInput, UserInput,
    };

    use crate::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn seed_user(db: &Database) -> String {
        db.users()
            .create(&UserInput {
                document_number: "U-1".to_string(),
                full_name: "Admin User".to_string(),
                email: "admin@example.com".to_string(),
                password: Some("correct-horse".to_string()),
                role: Role::Admin,
                status: true,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn seed_client(db: &Database) -> String {
        db.clients()
            .create(&ClientInput {
                document_number: "C-100".to_string(),
                full_name: "Maria Lopez".to_string(),
                email: None,
                phone: None,
                status: true,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn seed_supplier(db: &Database) -> String {
        db.suppliers()
            .create(&SupplierInput {
                document_number: "S-200".to_string(),
                company_name: "Andes Distilling".to_string(),
                email: None,
                phone: None,
                status: true,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn seed_category(db: &Database, description: &str) -> String {
        db.categories()
            .create(&CategoryInput {
                description: description.to_string(),
                status: true,
            })
            .await
            .unwrap()
            .id
    }

    pub fn product_input(code: &str, price_cents: i64) -> ProductInput {
        ProductInput {
            code: code.to_string(),
            name: format!("Product {code}"),
            description: None,
            category_id: None,
            bottle_size: Some(750),
            unit_quantity: 1,
            sale_price_cents: price_cents,
            status: true,
        }
    }

    /// Creates a product with the given opening stock through the ledger.
    pub async fn seed_product(db: &Database, code: &str, stock: i64) -> Product {
        db.ledger()
            .create_product(&product_input(code, 500), stock)
            .await
            .unwrap()
    }
}
