//! # Client Routes
//!
//! `GET /api/clients?documentNumber=X` answers with an array holding the
//! matching client, or an empty array.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::DocumentQuery;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use nailed_core::{Client, ClientInput};

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DocumentQuery>,
) -> ApiResult<Json<Vec<Client>>> {
    let clients = match query.document_number() {
        Some(number) => state
            .db
            .clients()
            .find_by_document_number(number)
            .await?
            .into_iter()
            .collect(),
        None => state.db.clients().list().await?,
    };
    Ok(Json(clients))
}

pub async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<ClientInput>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let client = state.db.clients().create(&input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Client>> {
    Ok(Json(state.db.clients().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<ClientInput>,
) -> ApiResult<Json<Client>> {
    Ok(Json(state.db.clients().update(&id, &input).await?))
}

/// Disables the client; past sales still reference it.
pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.clients().set_status(&id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{signed_in, test_state};
    use nailed_core::Role;

    fn input(document_number: &str) -> ClientInput {
        ClientInput {
            document_number: document_number.to_string(),
            full_name: "Maria Lopez".to_string(),
            email: Some("maria@example.com".to_string()),
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
        create(State(state.clone()), user.clone(), Json(input("12345678-9")))
            .await
            .unwrap();
        create(State(state.clone()), user.clone(), Json(input("98765432-1")))
            .await
            .unwrap();

        let Json(found) = list(State(state.clone()), user.clone(), by_document("12345678-9"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].document_number, "12345678-9");

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
