//! # Bulk Inventory Import
//!
//! Pure half of the spreadsheet import: row normalisation, the category
//! cache, and the skip-existing plan. nailed-db executes the plan inside a
//! single transaction.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rows (JSON) ──► normalize_rows ──► plan_import(existing codes)         │
//! │                     │                    │                              │
//! │                     │ any bad row        ├── code already known → skip  │
//! │                     ▼                    └── new code → create          │
//! │               InvalidImportRow                  │                       │
//! │               (nothing written)                 ▼                       │
//! │                                  CategoryCache::resolve(name)           │
//! │                                  hit → id, miss → insert + remember     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Re-importing a sheet never overwrites stock or prices of existing
//! products.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{
    clean_optional, validate_code, validate_initial_stock, validate_name, validate_price_cents,
};
use crate::{DEFAULT_IMPORT_CATEGORY, MAX_IMPORT_ROWS};

/// One spreadsheet row as delivered by the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImportRow {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i64,
    /// Sale price in cents.
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bottle_size: Option<i64>,
    /// Bottles per sale unit. Defaults to 1.
    #[serde(default)]
    pub unit_quantity: Option<i64>,
}

/// A validated, trimmed row ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub code: String,
    pub name: String,
    /// Category as typed (trimmed), used when the category must be created.
    pub category_name: String,
    pub stock: i64,
    pub sale_price_cents: i64,
    pub description: Option<String>,
    pub bottle_size: Option<i64>,
    pub unit_quantity: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Lookup key for a category name: trimmed, lower-cased.
///
/// ## Example
/// ```rust
/// use nailed_core::import::category_key;
///
/// assert_eq!(category_key("  Whisky "), "whisky");
/// assert_eq!(category_key("WHISKY"), category_key("whisky"));
/// ```
pub fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ImportRow {
    /// Validates and trims this row. `row` is 1-based and only used in errors.
    pub fn normalize(&self, row: usize) -> CoreResult<NormalizedRow> {
        let invalid = |e: ValidationError| CoreError::InvalidImportRow {
            row,
            reason: e.to_string(),
        };

        validate_code(&self.code).map_err(invalid)?;
        validate_name("name", &self.name, 200).map_err(invalid)?;
        validate_initial_stock(self.stock).map_err(invalid)?;
        validate_price_cents(self.price).map_err(invalid)?;
        if let Some(size) = self.bottle_size {
            if size <= 0 {
                return Err(invalid(ValidationError::MustBePositive {
                    field: "bottleSize".to_string(),
                }));
            }
        }

        let unit_quantity = self.unit_quantity.unwrap_or(1);
        if unit_quantity <= 0 {
            return Err(invalid(ValidationError::MustBePositive {
                field: "unitQuantity".to_string(),
            }));
        }

        let category_name =
            clean_optional(&self.category).unwrap_or_else(|| DEFAULT_IMPORT_CATEGORY.to_string());
        validate_name("category", &category_name, 100).map_err(invalid)?;

        Ok(NormalizedRow {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            category_name,
            stock: self.stock,
            sale_price_cents: self.price,
            description: clean_optional(&self.description),
            bottle_size: self.bottle_size,
            unit_quantity,
        })
    }
}

/// Normalises a whole batch. The first invalid row fails the batch.
pub fn normalize_rows(rows: &[ImportRow]) -> CoreResult<Vec<NormalizedRow>> {
    if rows.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    if rows.len() > MAX_IMPORT_ROWS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_IMPORT_ROWS as i64,
        }
        .into());
    }

    rows.iter()
        .enumerate()
        .map(|(i, row)| row.normalize(i + 1))
        .collect()
}

/// What an import will do, decided before any write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub to_create: Vec<NormalizedRow>,
    pub skipped: usize,
}

/// Splits rows into creations and skips.
///
/// A row is skipped when its code is already in `existing_codes` or appeared
/// earlier in the same batch.
pub fn plan_import(rows: Vec<NormalizedRow>, existing_codes: &HashSet<String>) -> ImportPlan {
    let mut seen: HashSet<String> = HashSet::new();
    let mut plan = ImportPlan::default();

    for row in rows {
        if existing_codes.contains(&row.code) || !seen.insert(row.code.clone()) {
            plan.skipped += 1;
        } else {
            plan.to_create.push(row);
        }
    }

    plan
}

// =============================================================================
// Category cache
// =============================================================================

/// Category id cache keyed by [`category_key`], built once per import.
#[derive(Debug, Clone, Default)]
pub struct CategoryCache {
    ids: HashMap<String, String>,
}

impl CategoryCache {
    /// Seeds the cache from `(description, id)` pairs.
    pub fn from_existing<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = (S, String)>,
        S: AsRef<str>,
    {
        let ids = categories
            .into_iter()
            .map(|(description, id)| (category_key(description.as_ref()), id))
            .collect();
        CategoryCache { ids }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(&category_key(name)).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, id: String) {
        self.ids.insert(category_key(name), id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, category: Option<&str>, stock: i64) -> ImportRow {
        ImportRow {
            code: code.to_string(),
            name: format!("Product {}", code.trim()),
            category: category.map(str::to_string),
            stock,
            price: 1200,
            description: None,
            bottle_size: Some(750),
            unit_quantity: None,
        }
    }

    #[test]
    fn test_normalize_trims_and_defaults_category() {
        let normalized = row("  GIN-1 ", None, 4).normalize(1).unwrap();
        assert_eq!(normalized.code, "GIN-1");
        assert_eq!(normalized.category_name, DEFAULT_IMPORT_CATEGORY);

        let blank = row("GIN-2", Some("   "), 0).normalize(1).unwrap();
        assert_eq!(blank.category_name, DEFAULT_IMPORT_CATEGORY);
    }

    #[test]
    fn test_unit_quantity_defaults_to_one() {
        assert_eq!(row("A", None, 1).normalize(1).unwrap().unit_quantity, 1);

        let six_pack = ImportRow {
            unit_quantity: Some(6),
            ..row("B", None, 1)
        };
        assert_eq!(six_pack.normalize(1).unwrap().unit_quantity, 6);

        let zero = ImportRow {
            unit_quantity: Some(0),
            ..row("C", None, 1)
        };
        assert!(matches!(
            zero.normalize(3),
            Err(CoreError::InvalidImportRow { row: 3, .. })
        ));
    }

    #[test]
    fn test_unit_quantity_from_json() {
        let row: ImportRow = serde_json::from_str(
            r#"{"code":"A","name":"Lager","stock":24,"price":150,"unitQuantity":12}"#,
        )
        .unwrap();
        assert_eq!(row.unit_quantity, Some(12));
    }

    #[test]
    fn test_normalize_rows_names_bad_row() {
        let rows = vec![row("A", None, 1), row("B", None, -1)];
        let err = normalize_rows(&rows).unwrap_err();
        assert!(matches!(err, CoreError::InvalidImportRow { row: 2, .. }));
    }

    #[test]
    fn test_normalize_rows_rejects_empty_batch() {
        assert!(normalize_rows(&[]).is_err());
    }

    #[test]
    fn test_plan_skips_existing_and_in_batch_duplicates() {
        let rows = normalize_rows(&[
            row("A", None, 1),
            row("B", None, 2),
            row("A", None, 9),
            row("C", None, 0),
        ])
        .unwrap();
        let existing: HashSet<String> = ["C".to_string()].into_iter().collect();

        let plan = plan_import(rows, &existing);
        let codes: Vec<&str> = plan.to_create.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(plan.to_create[0].stock, 1);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn test_category_cache_is_case_insensitive() {
        let mut cache = CategoryCache::from_existing(vec![("Whisky", "id-1".to_string())]);
        assert_eq!(cache.get("WHISKY"), Some("id-1"));
        assert_eq!(cache.get(" whisky "), Some("id-1"));
        assert_eq!(cache.get("Rum"), None);

        cache.insert("Rum", "id-2".to_string());
        assert_eq!(cache.get("rum"), Some("id-2"));
        assert_eq!(cache.len(), 2);
    }
}
