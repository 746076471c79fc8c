//! # Report Route
//!
//! `GET /api/reports?startDate=&endDate=&supplierId=&kind=purchases|sales|all`
//!
//! Dates are inclusive, either RFC 3339 timestamps or plain `YYYY-MM-DD`
//! (UTC); a plain `endDate` covers that whole day. `supplierId` narrows the
//! purchase rows only.

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use nailed_core::report::{summarize, ReportFilter, ReportRow, ReportTotals};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

pub async fn report(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(filter): Query<ReportFilter>,
) -> ApiResult<Json<ReportResponse>> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(ApiError::validation("startDate must not be after endDate"));
        }
    }

    let rows = state.db.reports().rows(&filter).await?;
    let totals = summarize(&rows);
    debug!(rows = rows.len(), margin = ?totals.margin, "Report built");
    Ok(Json(ReportResponse { rows, totals }))
}
