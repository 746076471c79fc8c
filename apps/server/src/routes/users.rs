//! # User Routes
//!
//! Administrator-only. Every handler takes [`AdminUser`], so an OPERATOR
//! session gets 403 before the handler runs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use nailed_core::{User, UserInput};

pub async fn list(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<UserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.db.users().create(&input).await?;
    info!(admin = %admin.id, user_id = %user.id, role = user.role.as_str(), "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.db.users().get(&id).await?))
}

/// Updates a user. An absent or blank `password` keeps the current one.
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.db.users().update(&id, &input).await?))
}

/// Disables a user. Administrators cannot disable themselves.
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if admin.id == id {
        return Err(ApiError::validation("You cannot disable your own account"));
    }
    state.db.users().set_status(&id, false).await?;
    info!(admin = %admin.id, user_id = %id, "User disabled");
    Ok(StatusCode::NO_CONTENT)
}
