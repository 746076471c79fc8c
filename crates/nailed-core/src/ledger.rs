//! # Stock Ledger
//!
//! Pure rules for stock: the reducer that derives stock from events, the
//! availability check run before a sale, and reconciliation against the
//! cached `products.stock` column.
//!
//! ## Event Streams
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ledger Reduction                                 │
//! │                                                                         │
//! │  purchase_items ──(qty)──┐                                             │
//! │  ENTRY adjustments ──────┼──► entries ──┐                              │
//! │                          │              ├──► stock = entries - exits   │
//! │  sale_items ─────────────┼──► exits ────┘                              │
//! │  EXIT adjustments ───────┘                                             │
//! │                                                                         │
//! │  Write path: each event updates products.stock in the same             │
//! │  transaction that stores it.                                            │
//! │  Audit path: derive_stock() over the full history, then reconcile().   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::AdjustmentType;

// =============================================================================
// Events
// =============================================================================

/// Where a stock movement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Purchase,
    Sale,
    Adjustment(AdjustmentType),
}

impl MovementKind {
    /// Entries raise stock; exits lower it.
    pub fn is_entry(&self) -> bool {
        matches!(
            self,
            MovementKind::Purchase | MovementKind::Adjustment(AdjustmentType::Entry)
        )
    }
}

/// One quantity moving in or out of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub product_id: String,
    pub kind: MovementKind,
    pub quantity: i64,
}

impl LedgerEvent {
    pub fn purchase(product_id: impl Into<String>, quantity: i64) -> Self {
        LedgerEvent {
            product_id: product_id.into(),
            kind: MovementKind::Purchase,
            quantity,
        }
    }

    pub fn sale(product_id: impl Into<String>, quantity: i64) -> Self {
        LedgerEvent {
            product_id: product_id.into(),
            kind: MovementKind::Sale,
            quantity,
        }
    }

    pub fn adjustment(
        product_id: impl Into<String>,
        adjustment_type: AdjustmentType,
        quantity: i64,
    ) -> Self {
        LedgerEvent {
            product_id: product_id.into(),
            kind: MovementKind::Adjustment(adjustment_type),
            quantity,
        }
    }
}

// =============================================================================
// Reducer
// =============================================================================

/// Running totals for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub entries: i64,
    pub exits: i64,
}

impl StockMovement {
    /// Stock implied by the ledger.
    #[inline]
    pub fn stock(&self) -> i64 {
        self.entries - self.exits
    }

    pub fn apply(&mut self, event: &LedgerEvent) {
        if event.kind.is_entry() {
            self.entries += event.quantity;
        } else {
            self.exits += event.quantity;
        }
    }
}

/// Folds an event history into per-product movements.
///
/// Products with no events are absent from the result; treat them as
/// `StockMovement::default()`.
///
/// ## Example
/// ```rust
/// use nailed_core::ledger::{derive_stock, LedgerEvent};
/// use nailed_core::AdjustmentType;
///
/// let events = vec![
///     LedgerEvent::purchase("p1", 10),
///     LedgerEvent::sale("p1", 3),
///     LedgerEvent::adjustment("p1", AdjustmentType::Exit, 1),
/// ];
/// let derived = derive_stock(&events);
/// let m = derived["p1"];
/// assert_eq!((m.entries, m.exits, m.stock()), (10, 4, 6));
/// ```
pub fn derive_stock(events: &[LedgerEvent]) -> BTreeMap<String, StockMovement> {
    events.iter().fold(BTreeMap::new(), |mut acc, event| {
        acc.entry(event.product_id.clone())
            .or_insert_with(StockMovement::default)
            .apply(event);
        acc
    })
}

// =============================================================================
// Write-path checks
// =============================================================================

/// Sums requested quantities per product.
///
/// A sale listing the same product on two lines must be checked against
/// the combined quantity, not each line on its own.
pub fn aggregate_quantities<'a, I>(lines: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    lines
        .into_iter()
        .fold(BTreeMap::new(), |mut acc, (product_id, qty)| {
            *acc.entry(product_id.to_string()).or_insert(0) += qty;
            acc
        })
}

/// Fails with `InsufficientStock` when `requested` exceeds `available`.
pub fn check_availability(code: &str, available: i64, requested: i64) -> CoreResult<()> {
    if requested > available {
        return Err(CoreError::InsufficientStock {
            code: code.to_string(),
            available,
            requested,
        });
    }
    Ok(())
}

/// Applies an adjustment to `current` and returns the new stock.
///
/// EXIT adjustments cannot take stock below zero.
pub fn apply_adjustment(
    code: &str,
    current: i64,
    adjustment_type: AdjustmentType,
    quantity: i64,
) -> CoreResult<i64> {
    if adjustment_type == AdjustmentType::Exit {
        check_availability(code, current, quantity)?;
    }
    Ok(current + adjustment_type.signed(quantity))
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Cached stock as stored on a product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStock {
    pub product_id: String,
    pub code: String,
    pub stock: i64,
}

/// A product whose cached stock disagrees with its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockDiscrepancy {
    pub product_id: String,
    pub code: String,
    pub cached: i64,
    pub derived: i64,
}

/// Compares cached stock with the reducer output.
///
/// Returns discrepancies in the order products were given. An empty result
/// means the ledger and the cache agree.
pub fn reconcile<I>(products: I, derived: &BTreeMap<String, StockMovement>) -> Vec<StockDiscrepancy>
where
    I: IntoIterator<Item = CachedStock>,
{
    products
        .into_iter()
        .filter_map(|p| {
            let derived_stock = derived
                .get(&p.product_id)
                .copied()
                .unwrap_or_default()
                .stock();
            (derived_stock != p.stock).then(|| StockDiscrepancy {
                product_id: p.product_id,
                code: p.code,
                cached: p.stock,
                derived: derived_stock,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_then_sales_example() {
        // Purchase 10, sell 3, then an 8-unit sale is refused.
        let mut events = vec![LedgerEvent::purchase("p1", 10), LedgerEvent::sale("p1", 3)];
        let movement = derive_stock(&events)["p1"];
        assert_eq!(movement.stock(), 7);

        let err = check_availability("P1", movement.stock(), 8).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 7, requested: 8, .. }
        ));

        events.push(LedgerEvent::sale("p1", 7));
        assert_eq!(derive_stock(&events)["p1"].stock(), 0);
    }

    #[test]
    fn test_entries_and_exits_include_adjustments() {
        let events = vec![
            LedgerEvent::purchase("a", 5),
            LedgerEvent::adjustment("a", AdjustmentType::Entry, 2),
            LedgerEvent::sale("a", 1),
            LedgerEvent::adjustment("a", AdjustmentType::Exit, 3),
            LedgerEvent::purchase("b", 1),
        ];
        let derived = derive_stock(&events);
        assert_eq!(derived["a"], StockMovement { entries: 7, exits: 4 });
        assert_eq!(derived["b"].stock(), 1);
        assert!(!derived.contains_key("c"));
    }

    #[test]
    fn test_aggregate_quantities_merges_lines() {
        let totals = aggregate_quantities(vec![("p1", 2), ("p2", 1), ("p1", 3)]);
        assert_eq!(totals["p1"], 5);
        assert_eq!(totals["p2"], 1);
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_check_availability_boundary() {
        assert!(check_availability("P1", 1, 1).is_ok());
        assert!(check_availability("P1", 0, 1).is_err());
    }

    #[test]
    fn test_apply_adjustment() {
        assert_eq!(apply_adjustment("P1", 3, AdjustmentType::Entry, 4).unwrap(), 7);
        assert_eq!(apply_adjustment("P1", 3, AdjustmentType::Exit, 3).unwrap(), 0);
        assert!(apply_adjustment("P1", 3, AdjustmentType::Exit, 4).is_err());
    }

    #[test]
    fn test_reconcile_reports_only_mismatches() {
        let derived = derive_stock(&[LedgerEvent::purchase("p1", 4), LedgerEvent::purchase("p2", 2)]);
        let cached = vec![
            CachedStock {
                product_id: "p1".into(),
                code: "P1".into(),
                stock: 4,
            },
            CachedStock {
                product_id: "p2".into(),
                code: "P2".into(),
                stock: 5,
            },
            CachedStock {
                product_id: "p3".into(),
                code: "P3".into(),
                stock: 0,
            },
        ];

        let issues = reconcile(cached, &derived);
        assert_eq!(
            issues,
            vec![StockDiscrepancy {
                product_id: "p2".into(),
                code: "P2".into(),
                cached: 5,
                derived: 2,
            }]
        );
    }
}
