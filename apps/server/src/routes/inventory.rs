//! # Inventory Routes
//!
//! ```text
//! GET  /api/inventory            entries, exits and derived stock per product
//! GET  /api/inventory/reconcile  products whose cached stock drifted
//! POST /api/inventory/import     { "items": [ImportRow, ...] }
//! ```
//!
//! The import runs as one transaction bounded by `import_timeout_secs`.
//! Codes that already exist are skipped, never overwritten.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::import::{ImportRow, ImportSummary};
use nailed_core::ledger::StockDiscrepancy;
use nailed_core::InventoryRow;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub items: Vec<ImportRow>,
}

pub async fn derived(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<InventoryRow>>> {
    Ok(Json(state.db.ledger().compute_derived_inventory().await?))
}

pub async fn reconcile(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<StockDiscrepancy>>> {
    let discrepancies = state.db.ledger().reconcile().await?;
    if !discrepancies.is_empty() {
        warn!(count = discrepancies.len(), "Cached stock disagrees with ledger");
    }
    Ok(Json(discrepancies))
}

pub async fn import(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<ImportSummary>> {
    let summary = state
        .db
        .ledger()
        .import_inventory(&request.items, state.config.import_timeout())
        .await?;
    info!(
        user_id = %user.id,
        created = summary.created,
        skipped = summary.skipped,
        "Inventory import finished"
    );
    Ok(Json(summary))
}
