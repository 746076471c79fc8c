//! # Product Routes
//!
//! Stock is read-only here. A new product may carry an opening `stock`,
//! which is written as an ENTRY adjustment; after that only purchases,
//! sales and adjustments move it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{Product, ProductInput};

/// `POST /api/products` body: the product fields plus its opening stock.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(flatten)]
    pub product: ProductInput,
    #[serde(default)]
    pub stock: i64,
}

pub async fn list(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Product>>> {
    let products = state.db.products().list().await?;
    debug!(count = products.len(), "Listed products");
    Ok(Json(products))
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state
        .db
        .ledger()
        .create_product(&request.product, request.stock)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(&id, &input).await?))
}

/// Disables the product. Its ledger history stays intact.
pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().set_status(&id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{signed_in, test_state};
    use nailed_core::Role;

    fn request(code: &str, stock: i64) -> CreateProductRequest {
        serde_json::from_value(serde_json::json!({
            "code": code,
            "name": "Old Tom Gin",
            "salePriceCents": 2599,
            "bottleSize": 700,
            "stock": stock,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_with_opening_stock() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;

        let (status, Json(product)) = create(State(state.clone()), user.clone(), Json(request("GIN-1", 12)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product.stock, 12);
        assert_eq!(product.bottle_size, Some(700));

        let Json(fetched) = get(State(state), user, Path(product.id.clone())).await.unwrap();
        assert_eq!(fetched.code, "GIN-1");
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;

        create(State(state.clone()), user.clone(), Json(request("GIN-1", 0)))
            .await
            .unwrap();
        let err = create(State(state), user, Json(request("GIN-1", 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }

    #[tokio::test]
    async fn test_delete_disables() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        let (_, Json(product)) = create(State(state.clone()), user.clone(), Json(request("GIN-1", 3)))
            .await
            .unwrap();

        let status = delete(State(state.clone()), user.clone(), Path(product.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(fetched) = get(State(state), user, Path(product.id)).await.unwrap();
        assert!(!fetched.status);
        assert_eq!(fetched.stock, 3);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;

        let err = get(State(state), user, Path("nope".to_string())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
