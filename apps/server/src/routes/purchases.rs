//! # Purchase Routes
//!
//! Recording a purchase raises stock for every line and refreshes the
//! product's sale price, all in one transaction. The session user is
//! stored as the one who registered it.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use super::DocumentQuery;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{Purchase, PurchaseDocument};

/// Lists purchases newest first, or returns the one purchase with
/// `?documentNumber=` (404 when absent).
pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DocumentQuery>,
) -> ApiResult<Response> {
    match query.document_number() {
        Some(number) => {
            let purchase = state.db.purchases().get_by_document_number(number).await?;
            Ok(Json(purchase).into_response())
        }
        None => Ok(Json(state.db.purchases().list().await?).into_response()),
    }
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(document): Json<PurchaseDocument>,
) -> ApiResult<(StatusCode, Json<Purchase>)> {
    let purchase = state.db.ledger().record_purchase(&document, &user.id).await?;
    info!(
        purchase_id = %purchase.id,
        user_id = %user.id,
        lines = purchase.items.len(),
        "Purchase registered"
    );
    Ok((StatusCode::CREATED, Json(purchase)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{signed_in, test_state};
    use axum::body::to_bytes;
    use chrono::Utc;
    use nailed_core::{ProductInput, PurchaseLine, Role, SupplierInput};

    async fn fixtures(state: &AppState) -> (String, String) {
        let supplier = state
            .db
            .suppliers()
            .create(&SupplierInput {
                document_number: "S-1".to_string(),
                company_name: "Andes Distilling".to_string(),
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
                    code: "RUM-1".to_string(),
                    name: "Dark Navy".to_string(),
                    description: None,
                    category_id: None,
                    bottle_size: Some(700),
                    unit_quantity: 1,
                    sale_price_cents: 1500,
                    status: true,
                },
                0,
            )
            .await
            .unwrap();
        (supplier.id, product.id)
    }

    fn document(number: &str, supplier_id: &str, product_id: &str) -> PurchaseDocument {
        PurchaseDocument {
            date: Utc::now(),
            document_type: "INVOICE".to_string(),
            document_number: number.to_string(),
            supplier_id: supplier_id.to_string(),
            items: vec![PurchaseLine {
                product_id: product_id.to_string(),
                purchase_price_cents: 900,
                sale_price_cents: 1800,
                quantity: 24,
            }],
        }
    }

    #[tokio::test]
    async fn test_purchase_registers_session_user() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        let (supplier_id, product_id) = fixtures(&state).await;

        let (status, Json(purchase)) = create(
            State(state.clone()),
            user.clone(),
            Json(document("F-100", &supplier_id, &product_id)),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(purchase.user_id, user.id);
        assert_eq!(purchase.total_cents, 900 * 24);

        let product = state.db.products().get(&product_id).await.unwrap();
        assert_eq!(product.stock, 24);
        assert_eq!(product.sale_price_cents, 1800);
    }

    #[tokio::test]
    async fn test_lookup_by_document_number() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        let (supplier_id, product_id) = fixtures(&state).await;
        create(
            State(state.clone()),
            user.clone(),
            Json(document("F-100", &supplier_id, &product_id)),
        )
        .await
        .unwrap();

        let response = list(
            State(state.clone()),
            user.clone(),
            Query(DocumentQuery {
                document_number: Some("F-100".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["documentNumber"], "F-100");
        assert_eq!(json["items"][0]["quantity"], 24);

        let err = list(
            State(state),
            user,
            Query(DocumentQuery {
                document_number: Some("F-999".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_document_conflicts() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        let (supplier_id, product_id) = fixtures(&state).await;
        let doc = document("F-100", &supplier_id, &product_id);

        create(State(state.clone()), user.clone(), Json(doc.clone()))
            .await
            .unwrap();
        let err = create(State(state.clone()), user, Json(doc)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::AlreadyExists);
        let product = state.db.products().get(&product_id).await.unwrap();
        assert_eq!(product.stock, 24);
    }
}
