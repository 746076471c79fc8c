//! # Supplier Routes
//!
//! `GET /api/suppliers?documentNumber=X` answers with an array holding the
//! matching supplier, or an empty array.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::DocumentQuery;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{Supplier, SupplierInput};

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DocumentQuery>,
) -> ApiResult<Json<Vec<Supplier>>> {
    let suppliers = match query.document_number() {
        Some(number) => state
            .db
            .suppliers()
            .find_by_document_number(number)
            .await?
            .into_iter()
            .collect(),
        None => state.db.suppliers().list().await?,
    };
    Ok(Json(suppliers))
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<SupplierInput>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.db.suppliers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.db.suppliers().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<SupplierInput>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.db.suppliers().update(&id, &input).await?))
}

/// Disables the supplier; past purchases still reference it.
pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.suppliers().set_status(&id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{signed_in, test_state};
    use nailed_core::Role;

    fn input(document_number: &str) -> SupplierInput {
        SupplierInput {
            document_number: document_number.to_string(),
            company_name: "Andes Distilling".to_string(),
            email: Some("orders@andes.example".to_string()),
            phone: None,
            status: true,
        }
    }

    fn by_document(number: &str) -> Query<DocumentQuery> {
        Query(DocumentQuery {
            document_number: Some(number.to_string()),
        })
    }

    #[tokio::test]
    async fn test_lookup_by_document_number() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        create(State(state.clone()), user.clone(), Json(input("76543210-K")))
            .await
            .unwrap();
        create(State(state.clone()), user.clone(), Json(input("77111222-3")))
            .await
            .unwrap();

        let Json(found) = list(State(state.clone()), user.clone(), by_document("76543210-K"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].document_number, "76543210-K");

        let Json(none) = list(State(state.clone()), user.clone(), by_document("0-0"))
            .await
            .unwrap();
        assert!(none.is_empty());

        let Json(all) = list(State(state), user, Query(DocumentQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let state = test_state().await;
        let user = signed_in(&state, Role::Operator).await;
        let mut bad = input("1-1");
        bad.email = Some("not-an-email".to_string());

        let err = create(State(state), user, Json(bad)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
