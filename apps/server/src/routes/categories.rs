//! Category routes. DELETE disables the category; products keep their link.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{Category, CategoryInput};

pub async fn list(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.db.categories().create(&input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().update(&id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.categories().set_status(&id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}
