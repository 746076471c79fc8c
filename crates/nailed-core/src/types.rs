//! # Domain Types
//!
//! Entities and write inputs used throughout Nailed Inventory.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference data              Ledger documents          Ledger events   │
//! │  ──────────────              ────────────────          ─────────────   │
//! │  Category ◄── Product ◄──┬── PurchaseItem ── Purchase ── Supplier      │
//! │                          ├── SaleItem ────── Sale ────── Client        │
//! │                          └── InventoryAdjustment (ENTRY | EXIT)        │
//! │                                                                         │
//! │  User (registered_by on Purchase/Sale)     Business (letterhead data)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: product `code`, `document_number`, user `email`, ... -
//!   unique and human-readable
//!
//! Entities serialize as camelCase for the JSON API. `*Input` and
//! `*Document` types are what callers send to create or update rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    self, validate_code, validate_document_number, validate_email, validate_name,
    validate_optional_email, validate_password, validate_price_cents, validate_quantity,
    ValidationResult,
};
use crate::MAX_DOCUMENT_LINES;

fn default_true() -> bool {
    true
}

fn default_unit_quantity() -> i64 {
    1
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Display name; unique ignoring case.
    pub description: String,
    pub status: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryInput {
    pub description: String,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl CategoryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("description", &self.description, 100)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// `stock` is a cache of the ledger. It is written only by the ledger
/// operations in nailed-db and always equals entries minus exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Business identifier, unique.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    /// Joined from `categories.description`.
    pub category_name: Option<String>,
    /// Bottle size in millilitres.
    pub bottle_size: Option<i64>,
    /// Units per pack.
    pub unit_quantity: i64,
    pub sale_price_cents: i64,
    pub stock: i64,
    pub status: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Checks whether `quantity` units can leave the shelf.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Writable product fields. Stock is deliberately absent: it only moves
/// through the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub bottle_size: Option<i64>,
    #[serde(default = "default_unit_quantity")]
    pub unit_quantity: i64,
    pub sale_price_cents: i64,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl ProductInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code(&self.code)?;
        validate_name("name", &self.name, 200)?;
        validate_price_cents(self.sale_price_cents)?;
        if self.unit_quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "unitQuantity".to_string(),
            });
        }
        if let Some(size) = self.bottle_size {
            if size <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "bottleSize".to_string(),
                });
            }
        }
        if let Some(category_id) = validation::clean_optional(&self.category_id) {
            validation::validate_uuid(&category_id)?;
        }
        Ok(())
    }
}

// =============================================================================
// Inventory Adjustment
// =============================================================================

/// Direction of a manual stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum AdjustmentType {
    /// Adds to stock.
    Entry,
    /// Removes from stock.
    Exit,
}

impl AdjustmentType {
    /// Signed stock delta for `quantity` units.
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            AdjustmentType::Entry => quantity,
            AdjustmentType::Exit => -quantity,
        }
    }
}

/// An immutable manual stock movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryAdjustment {
    pub id: String,
    pub product_id: String,
    pub product_code: String,
    pub product_name: String,
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
    pub quantity: i64,
    pub reason: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdjustmentInput {
    pub product_id: String,
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
    pub quantity: i64,
    pub reason: String,
}

impl AdjustmentInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_uuid(&self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_name("reason", &self.reason, 500)
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A supplier receipt. Read back with joined names and its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub document_type: String,
    pub document_number: String,
    pub supplier_id: String,
    pub supplier_name: String,
    /// Registered by.
    pub user_id: String,
    pub user_name: String,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<PurchaseItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub line_no: i64,
    pub product_id: String,
    pub product_code: String,
    pub product_name: String,
    pub purchase_price_cents: i64,
    /// Resale price written onto the product when the purchase is recorded.
    pub sale_price_cents: i64,
    pub quantity: i64,
}

impl PurchaseItem {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.purchase_price_cents).multiply_quantity(self.quantity)
    }
}

/// One line of a purchase being recorded.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseLine {
    pub product_id: String,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseDocument {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub document_type: String,
    pub document_number: String,
    pub supplier_id: String,
    pub items: Vec<PurchaseLine>,
}

impl PurchaseDocument {
    pub fn validate(&self) -> CoreResult<()> {
        validate_document_header(&self.document_type, &self.document_number, self.items.len())?;
        validation::validate_uuid(&self.supplier_id)?;
        for line in &self.items {
            validation::validate_uuid(&line.product_id)?;
            validate_quantity(line.quantity)?;
            validate_price_cents(line.purchase_price_cents)?;
            validate_price_cents(line.sale_price_cents)?;
        }
        Ok(())
    }
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub document_type: String,
    pub document_number: String,
    pub client_id: String,
    pub client_name: String,
    pub client_document: String,
    pub user_id: String,
    pub user_name: String,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub line_no: i64,
    pub product_id: String,
    pub product_code: String,
    pub product_name: String,
    pub price_cents: i64,
    pub quantity: i64,
}

impl SaleItem {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDocument {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub document_type: String,
    pub document_number: String,
    pub client_id: String,
    pub items: Vec<SaleLine>,
}

impl SaleDocument {
    pub fn validate(&self) -> CoreResult<()> {
        validate_document_header(&self.document_type, &self.document_number, self.items.len())?;
        validation::validate_uuid(&self.client_id)?;
        for line in &self.items {
            validation::validate_uuid(&line.product_id)?;
            validate_quantity(line.quantity)?;
            validate_price_cents(line.price_cents)?;
        }
        Ok(())
    }
}

fn validate_document_header(
    document_type: &str,
    document_number: &str,
    line_count: usize,
) -> CoreResult<()> {
    validate_name("documentType", document_type, 30)?;
    validate_document_number(document_number)?;
    if line_count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    if line_count > MAX_DOCUMENT_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_DOCUMENT_LINES,
        });
    }
    Ok(())
}

// =============================================================================
// Clients & Suppliers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub document_number: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientInput {
    pub document_number: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl ClientInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_document_number(&self.document_number)?;
        validate_name("fullName", &self.full_name, 200)?;
        validate_optional_email(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub document_number: String,
    pub company_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierInput {
    pub document_number: String,
    pub company_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl SupplierInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_document_number(&self.document_number)?;
        validate_name("companyName", &self.company_name, 200)?;
        validate_optional_email(&self.email)
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Operator,
}

impl Default for Role {
    fn default() -> Self {
        Role::Operator
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
        }
    }
}

/// An application user. Credentials stay in nailed-db.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub document_number: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub status: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for users. `password` is required on create and
/// optional on update (kept when absent).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserInput {
    pub document_number: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl UserInput {
    pub fn validate(&self, require_password: bool) -> ValidationResult<()> {
        validate_document_number(&self.document_number)?;
        validate_name("fullName", &self.full_name, 200)?;
        validate_email(&self.email)?;
        match validation::clean_optional(&self.password) {
            Some(password) => validate_password(&password),
            None if require_password => Err(ValidationError::Required {
                field: "password".to_string(),
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Business
// =============================================================================

/// Company letterhead data printed on documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Business {
    pub id: String,
    pub name: String,
    /// Tax registration number, unique.
    pub tax_id: String,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BusinessInput {
    pub name: String,
    pub tax_id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl BusinessInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 200)?;
        validate_document_number(&self.tax_id).map_err(|_| ValidationError::InvalidFormat {
            field: "taxId".to_string(),
            reason: "must be 1-30 letters, digits or hyphens".to_string(),
        })
    }
}

// =============================================================================
// Derived inventory
// =============================================================================

/// One row of the derived inventory view: ledger sums next to the cached
/// stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryRow {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub category: String,
    pub bottle_size: Option<i64>,
    pub sale_price_cents: i64,
    pub entries: i64,
    pub exits: i64,
    /// entries - exits.
    pub derived_stock: i64,
    /// Cached value on the product row.
    pub stock: i64,
}
