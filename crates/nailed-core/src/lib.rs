//! # nailed-core: Pure Domain Logic for Nailed Inventory
//!
//! Types, rules and calculations for the inventory backend, with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Nailed Inventory Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 nailed-server (axum JSON API)                   │   │
//! │  │   /api/products, /api/sales, /api/inventory/import, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nailed-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  ledger  │ │  import  │ │ stats / report   │  │   │
//! │  │   │ Product  │ │ reducer  │ │ rows     │ │ daily buckets    │  │   │
//! │  │   │ Sale ... │ │ checks   │ │ cache    │ │ totals           │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  nailed-db (SQLite via sqlx)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Purchase, Sale, Adjustment, ...)
//! - [`money`] - Integer cents money type
//! - [`ledger`] - Stock reducer over purchase/sale/adjustment events
//! - [`import`] - Bulk import row normalisation and category cache
//! - [`stats`] - Dashboard bucketing
//! - [`report`] - Flattened document report rows and totals
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use nailed_core::ledger::{derive_stock, LedgerEvent};
//!
//! let events = vec![
//!     LedgerEvent::purchase("p1", 10),
//!     LedgerEvent::sale("p1", 3),
//! ];
//! let movements = derive_stock(&events);
//! assert_eq!(movements["p1"].stock(), 7);
//! ```
//!
//! ```text
//! The same reducer runs over the full history in nailed-db to reconcile
//! the cached products.stock column.
//! ```

pub mod error;
pub mod import;
pub mod ledger;
pub mod money;
pub mod report;
pub mod stats;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum number of lines accepted on a single purchase or sale document.
pub const MAX_DOCUMENT_LINES: usize = 200;

/// Maximum quantity on a single line or adjustment.
///
/// Guards against typos like 10000 instead of 100 when receiving stock.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Maximum rows accepted by one bulk import call.
pub const MAX_IMPORT_ROWS: usize = 5_000;

/// Category assigned to imported rows that name none.
pub const DEFAULT_IMPORT_CATEGORY: &str = "General";

/// Label used in inventory views for products without a category.
pub const UNCATEGORIZED_LABEL: &str = "No category";

/// Number of days covered by the dashboard series.
pub const DASHBOARD_WINDOW_DAYS: u32 = 7;
