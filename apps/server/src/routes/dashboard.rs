//! `GET /api/dashboard/stats`: last seven UTC days of sales, purchases
//! and stock movement, the product count per category, and headline
//! totals.

use axum::extract::State;
use axum::Json;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::stats::DashboardStats;

pub async fn stats(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.db.dashboard().stats().await?))
}
