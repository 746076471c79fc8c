//! Manual stock adjustments (ENTRY / EXIT). Rows are immutable once
//! written; a correction is a new adjustment in the other direction.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{AdjustmentInput, InventoryAdjustment};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentQuery {
    pub product_id: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<AdjustmentQuery>,
) -> ApiResult<Json<Vec<InventoryAdjustment>>> {
    let adjustments = match query.product_id.as_deref() {
        Some(product_id) => state.db.adjustments().list_for_product(product_id).await?,
        None => state.db.adjustments().list().await?,
    };
    Ok(Json(adjustments))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<AdjustmentInput>,
) -> ApiResult<(StatusCode, Json<InventoryAdjustment>)> {
    let adjustment = state.db.ledger().record_adjustment(&input).await?;
    info!(
        adjustment_id = %adjustment.id,
        user_id = %user.id,
        kind = ?adjustment.adjustment_type,
        quantity = adjustment.quantity,
        "Adjustment recorded"
    );
    Ok((StatusCode::CREATED, Json(adjustment)))
}
