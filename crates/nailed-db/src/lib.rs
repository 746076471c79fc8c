//! # nailed-db: Database Layer for Nailed Inventory
//!
//! SQLite persistence for the inventory backend, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Nailed Inventory Data Flow                          │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    nailed-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ LedgerRepo ★  │    │ 001_initial  │  │   │
//! │  │   │ busy_timeout  │    │ ReportRepo    │    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ★ `LedgerRepository` is the only code that writes `products.stock`.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per entity plus the stock ledger
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nailed_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("nailed.db")).await?;
//!
//! let sale = db.ledger().record_sale(&document, &user_id).await?;
//! let drift = db.ledger().reconcile().await?;
//! assert!(drift.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::adjustment::AdjustmentRepository;
pub use repository::business::BusinessRepository;
pub use repository::category::CategoryRepository;
pub use repository::client::ClientRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::{UserCredentials, UserRepository};
