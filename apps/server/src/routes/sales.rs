//! # Sale Routes
//!
//! A sale is refused with 409 `INSUFFICIENT_STOCK` when any product would
//! go below zero; nothing is written in that case.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use super::DocumentQuery;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{Sale, SaleDocument};

/// Lists sales newest first, or the single sale with `?documentNumber=`.
pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DocumentQuery>,
) -> ApiResult<Response> {
    match query.document_number() {
        Some(number) => {
            let sale = state.db.sales().get_by_document_number(number).await?;
            Ok(Json(sale).into_response())
        }
        None => Ok(Json(state.db.sales().list().await?).into_response()),
    }
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(document): Json<SaleDocument>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let sale = state.db.ledger().record_sale(&document, &user.id).await?;
    info!(
        sale_id = %sale.id,
        user_id = %user.id,
        total_cents = sale.total_cents,
        "Sale registered"
    );
    Ok((StatusCode::CREATED, Json(sale)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{signed_in, test_state};
    use chrono::Utc;
    use nailed_core::{ClientInput, ProductInput, Role, SaleLine};

    async fn fixtures(state: &AppState, stock: i64) -> (String, String) {
        let client = state
            .db
            .clients()
            .create(&ClientInput {
                document_number: "C-1".to_string(),
                full_name: "Maria Lopez".to_string(),
                email: None,
                phone: None,
                status: true,
            })
            .await
            .unwrap();
        let product = state
            .db
            .ledger()
            .create_product(
                &ProductInput {
                    code: "WIN-1".to_string(),
                    name: "Malbec".to_string(),
                    description: None,
                    category_id: None,
                    bottle_size: Some(750),
                    unit_quantity: 1,
                    sale_price_cents: 1200,
                    status: true,
                },
                stock,
            )
            .await
            .unwrap();
        (client.id, product.id)
    }

    fn document(number: &str, client_id: &str, product_id: &str, quantity: i64) -> SaleDocument {
        SaleDocument {
            date: Utc::now(),
            document_type: "RECEIPT".to_string(),
            document_number: number.to_string(),
            client_id: client_id.to_string(),
            items: vec![SaleLine {
                product_id: product_id.to_string(),
                price_cents: 1200,
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_sale_decrements_stock() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        let (client_id, product_id) = fixtures(&state, 10).await;

        let (status, Json(sale)) = create(
            State(state.clone()),
            user.clone(),
            Json(document("B-1", &client_id, &product_id, 3)),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale.user_id, user.id);
        assert_eq!(sale.client_name, "Maria Lopez");
        assert_eq!(sale.total_cents, 3600);
        assert_eq!(state.db.products().get(&product_id).await.unwrap().stock, 7);
    }

    #[tokio::test]
    async fn test_oversell_is_conflict_and_writes_nothing() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        let (client_id, product_id) = fixtures(&state, 7).await;

        let err = create(
            State(state.clone()),
            user,
            Json(document("B-2", &client_id, &product_id, 8)),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("WIN-1"));
        assert_eq!(state.db.products().get(&product_id).await.unwrap().stock, 7);
        assert!(state.db.sales().list().await.unwrap().is_empty());
    }
}
