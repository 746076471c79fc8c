//! Business (letterhead) routes. Unlike other resources, DELETE removes
//! the row: nothing in the ledger references a business.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{Business, BusinessInput};

pub async fn list(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Business>>> {
    Ok(Json(state.db.businesses().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<BusinessInput>,
) -> ApiResult<(StatusCode, Json<Business>)> {
    let business = state.db.businesses().create(&input).await?;
    Ok((StatusCode::CREATED, Json(business)))
}

pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Business>> {
    Ok(Json(state.db.businesses().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<BusinessInput>,
) -> ApiResult<Json<Business>> {
    Ok(Json(state.db.businesses().update(&id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.businesses().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{signed_in, test_state};
    use nailed_core::Role;

    #[tokio::test]
    async fn test_delete_removes_row() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Admin).await;

        let (_, Json(business)) = create(
            State(state.clone()),
            user.clone(),
            Json(BusinessInput {
                name: "Nailed Liquors".to_string(),
                tax_id: "76123456-7".to_string(),
                address: Some("Av. Central 100".to_string()),
                logo_url: None,
            }),
        )
        .await
        .unwrap();

        delete(State(state.clone()), user.clone(), Path(business.id.clone()))
            .await
            .unwrap();

        let err = get(State(state), user, Path(business.id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
